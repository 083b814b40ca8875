use crate::db::{queries, queries_ledger};
use crate::error::{BillingError, Result};
use crate::models::{InvoiceDetail, InvoiceSummary, ScheduleLine, Trade};
use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use indexmap::IndexMap;
use sqlx::SqlitePool;
use std::io::Write;
use std::str::FromStr;

/// 进度报表与结算单汇总
pub struct ReportService {
    pool: SqlitePool,
}

impl ReportService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 月度进度报表: 按清单条目汇总当月日台账数量
    pub async fn schedule_report(&self, project_id: i64, month: u32, year: i32) -> Result<Vec<ScheduleLine>> {
        let (start, end) = month_bounds(year, month)?;
        let lines = queries_ledger::sum_ledger_by_item(&self.pool, project_id, start, end).await?;
        tracing::debug!(
            "Schedule report project {} {}-{:02}: {} items",
            project_id,
            year,
            month,
            lines.len()
        );
        Ok(lines)
    }

    /// 结算单汇总: 明细 + 两位小数的金额合计 (总计 / 分专业)
    pub async fn invoice_summary(&self, invoice_id: i64) -> Result<InvoiceSummary> {
        let invoice = queries::get_invoice(&self.pool, invoice_id)
            .await?
            .ok_or_else(|| BillingError::not_found(format!("invoice {} not found", invoice_id)))?;
        let details = queries_ledger::list_details(&self.pool, invoice_id).await?;

        let (total_value, total_by_trade) = money_totals(&details);
        Ok(InvoiceSummary {
            invoice,
            details,
            total_value,
            total_by_trade,
        })
    }
}

/// 月份起止日期; 月份不在 1..=12 时报校验错误
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let invalid = || BillingError::validation(format!("invalid month {}-{}", year, month));

    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;
    let end = next_month.pred_opt().ok_or_else(invalid)?;
    Ok((start, end))
}

fn to_decimal(value: f64) -> BigDecimal {
    BigDecimal::from_str(&value.to_string()).unwrap_or_else(|_| BigDecimal::zero())
}

/// 金额合计, 逐笔转十进制后求和, 最后保留两位小数
pub fn money_totals(details: &[InvoiceDetail]) -> (BigDecimal, IndexMap<Trade, BigDecimal>) {
    let mut total = BigDecimal::zero();
    let mut by_trade: IndexMap<Trade, BigDecimal> = IndexMap::new();

    for detail in details {
        let value = to_decimal(detail.total_value);
        total += value.clone();
        let entry = by_trade.entry(detail.trade).or_insert_with(BigDecimal::zero);
        *entry += value;
    }

    let by_trade = by_trade
        .into_iter()
        .map(|(trade, amount)| (trade, amount.round(2)))
        .collect();
    (total.round(2), by_trade)
}

/// 导出进度报表为 CSV (带表头)
pub fn write_schedule_csv<W: Write>(lines: &[ScheduleLine], output: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(["item_code", "description", "total_qty"])?;

    for line in lines {
        writer.write_record([
            line.item_code.clone(),
            line.description.clone(),
            line.total_qty.to_string(),
        ])?;
    }

    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(trade: Trade, total_value: f64) -> InvoiceDetail {
        InvoiceDetail {
            id: 1,
            invoice_id: 1,
            boq_item_id: 1,
            row_description: None,
            current_percentage: 100.0,
            claimed_qty: 1.0,
            approved_qty: 1.0,
            equivalent_qty: 1.0,
            previous_cumulative_qty: 0.0,
            total_cumulative_qty: 1.0,
            unit_price_at_time: total_value,
            total_value,
            notes: None,
            trade,
        }
    }

    #[test]
    fn month_bounds_cover_whole_month() {
        let (start, end) = month_bounds(2024, 2).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let (_, end) = month_bounds(2023, 12).unwrap();
        assert_eq!(end, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn month_out_of_range_is_rejected() {
        assert!(matches!(month_bounds(2024, 0), Err(BillingError::Validation(_))));
        assert!(matches!(month_bounds(2024, 13), Err(BillingError::Validation(_))));
    }

    #[test]
    fn money_totals_avoid_float_drift() {
        let details = vec![
            detail(Trade::Civil, 0.1),
            detail(Trade::Civil, 0.2),
            detail(Trade::Elec, 1000.005),
        ];
        let (total, by_trade) = money_totals(&details);

        assert_eq!(total, BigDecimal::from_str("1000.31").unwrap());
        assert_eq!(by_trade[&Trade::Civil], BigDecimal::from_str("0.30").unwrap());
        assert_eq!(by_trade.keys().copied().collect::<Vec<_>>(), vec![Trade::Civil, Trade::Elec]);
    }

    #[test]
    fn schedule_csv_has_header_and_rows() {
        let lines = vec![ScheduleLine {
            item_code: "9-2".to_string(),
            description: "Doors, wooden".to_string(),
            total_qty: 2.5,
        }];
        let mut out = Vec::new();
        write_schedule_csv(&lines, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "item_code,description,total_qty\n9-2,\"Doors, wooden\",2.5\n");
    }
}
