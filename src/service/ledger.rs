use crate::models::LedgerEntry;
use chrono::NaiveDate;

/// 结算期间天数 (含首尾); 结束早于开始时按 1 天处理
pub fn period_days(period_start: NaiveDate, period_end: NaiveDate) -> i64 {
    let days = (period_end - period_start).num_days() + 1;
    days.max(1)
}

/// 把等效数量平均摊到从 period_start 起连续 total_days 个自然日
///
/// 不考虑周末/节假日. 调用方保证 equivalent_qty 非零.
pub fn distribute(
    project_id: i64,
    invoice_id: i64,
    boq_item_id: i64,
    equivalent_qty: f64,
    period_start: NaiveDate,
    total_days: i64,
) -> Vec<LedgerEntry> {
    let total_days = total_days.max(1);
    let daily_qty = equivalent_qty / total_days as f64;

    period_start
        .iter_days()
        .take(total_days as usize)
        .map(|entry_date| LedgerEntry {
            project_id,
            invoice_id,
            boq_item_id,
            entry_date,
            distributed_qty: daily_qty,
        })
        .collect()
}
