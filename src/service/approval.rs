use crate::db::{self, queries, queries_ledger, queries_staging};
use crate::error::{BillingError, Result};
use crate::models::{
    ApprovalSummary, BoqItem, InvoiceLog, InvoiceStatus, LedgerEntry, NewInvoiceDetail, StagingRow,
};
use crate::parsing::{classify_row, extract_phase, parse_float};
use crate::service::cumulative::CumulativeResolver;
use crate::service::ledger::{distribute, period_days};
use dashmap::DashMap;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

pub const SUCCESS_MESSAGE: &str = "Success";
pub const EMPTY_CODE_MESSAGE: &str = "item code is empty";
pub const EXCLUDED_MESSAGE: &str = "excluded from invoice";
/// 描述和阶段都为空时的明细描述
pub const FULL_ITEM_LABEL: &str = "full item";

/// 单行审批结果; 行级错误是数据, 不中断整批
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Processed(NewInvoiceDetail),
    Excluded,
    Rejected(String),
}

/// 结算单审批服务
///
/// 暂存行 -> 校验 -> 计算 -> 明细 + 日台账, 与状态变更在同一事务中提交.
pub struct ApprovalService {
    pool: SqlitePool,
    in_flight: Arc<DashMap<i64, ()>>,
}

/// 同一结算单同时只允许一个审批; Drop 时释放
struct InFlightGuard {
    in_flight: Arc<DashMap<i64, ()>>,
    invoice_id: i64,
}

impl InFlightGuard {
    fn acquire(in_flight: &Arc<DashMap<i64, ()>>, invoice_id: i64) -> Result<Self> {
        if in_flight.insert(invoice_id, ()).is_some() {
            tracing::warn!("Invoice {} approval already in progress", invoice_id);
            return Err(BillingError::conflict(format!(
                "approval of invoice {} is already in progress",
                invoice_id
            )));
        }
        Ok(Self {
            in_flight: Arc::clone(in_flight),
            invoice_id,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.remove(&self.invoice_id);
    }
}

impl ApprovalService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// 审批结算单: 全量重建明细与日台账, 状态置为 APPROVED
    pub async fn approve_invoice(&self, invoice_id: i64) -> Result<ApprovalSummary> {
        let _guard = InFlightGuard::acquire(&self.in_flight, invoice_id)?;
        let mut tx = db::begin_write(&self.pool).await?;

        // 1. 前置条件 (任何写入之前)
        let invoice = queries::get_invoice(&mut *tx, invoice_id)
            .await?
            .ok_or_else(|| BillingError::not_found(format!("invoice {} not found", invoice_id)))?;

        if invoice.status.is_approved() {
            return Err(BillingError::conflict(format!(
                "invoice {} is already approved",
                invoice_id
            )));
        }

        let staging_rows = queries_staging::list_staging_rows(&mut *tx, invoice_id).await?;
        if staging_rows.is_empty() {
            return Err(BillingError::validation(format!(
                "invoice {} has nothing to review",
                invoice_id
            )));
        }

        let total_days = period_days(invoice.period_start, invoice.period_end);
        tracing::info!(
            "审批结算单 {} (项目 {}, 第{}期): {} 行暂存数据, 期间 {} 天",
            invoice.id,
            invoice.project_id,
            invoice.invoice_number,
            staging_rows.len(),
            total_days
        );

        // 2. 全量重建: 先删旧明细
        let removed_ledger = queries_ledger::delete_ledger_for_invoice(&mut *tx, invoice_id).await?;
        let removed_details = queries_ledger::delete_details_for_invoice(&mut *tx, invoice_id).await?;
        tracing::debug!(
            "Invoice {}: removed {} details, {} ledger rows",
            invoice_id,
            removed_details,
            removed_ledger
        );

        // 3. 逐行计算
        let mut resolver = CumulativeResolver::new(invoice.project_id, invoice.id);
        let mut boq_cache: HashMap<String, Option<BoqItem>> = HashMap::new();
        let mut details: Vec<NewInvoiceDetail> = Vec::new();
        let mut ledger: Vec<LedgerEntry> = Vec::new();
        let mut summary = ApprovalSummary {
            invoice_id,
            processed_items: 0,
            errors: 0,
            excluded: 0,
            status: InvoiceStatus::Approved,
        };

        for row in &staging_rows {
            let row_type = classify_row(
                row.raw_item_code.as_deref(),
                row.raw_description.as_deref(),
                row.raw_qty.as_deref(),
                row.raw_percentage.as_deref(),
            );

            let outcome =
                evaluate_row(&mut *tx, &invoice, row, &mut boq_cache, &mut resolver).await?;

            match outcome {
                RowOutcome::Processed(detail) => {
                    if detail.equivalent_qty != 0.0 {
                        ledger.extend(distribute(
                            invoice.project_id,
                            invoice.id,
                            detail.boq_item_id,
                            detail.equivalent_qty,
                            invoice.period_start,
                            total_days,
                        ));
                    }
                    details.push(detail);
                    queries_staging::mark_staging_outcome(
                        &mut *tx,
                        row.id,
                        row_type,
                        true,
                        Some(SUCCESS_MESSAGE),
                    )
                    .await?;
                    summary.processed_items += 1;
                }
                RowOutcome::Excluded => {
                    queries_staging::mark_staging_outcome(
                        &mut *tx,
                        row.id,
                        row_type,
                        false,
                        Some(EXCLUDED_MESSAGE),
                    )
                    .await?;
                    summary.excluded += 1;
                }
                RowOutcome::Rejected(reason) => {
                    tracing::debug!("Staging row {} rejected: {}", row.id, reason);
                    queries_staging::mark_staging_outcome(
                        &mut *tx,
                        row.id,
                        row_type,
                        false,
                        Some(&reason),
                    )
                    .await?;
                    summary.errors += 1;
                }
            }
        }

        // 4. 批量写入 + 状态变更
        for chunk in details.chunks(queries_ledger::INSERT_CHUNK) {
            queries_ledger::insert_details(&mut *tx, chunk).await?;
        }
        for chunk in ledger.chunks(queries_ledger::INSERT_CHUNK) {
            queries_ledger::insert_ledger_entries(&mut *tx, chunk).await?;
        }
        queries::set_invoice_status(&mut *tx, invoice_id, InvoiceStatus::Approved).await?;

        tx.commit().await?;

        tracing::info!(
            "Invoice {} approved: processed {}, errors {}, excluded {}, ledger rows {}",
            invoice_id,
            summary.processed_items,
            summary.errors,
            summary.excluded,
            ledger.len()
        );

        Ok(summary)
    }
}

/// 校验并计算单个暂存行
async fn evaluate_row(
    conn: &mut SqliteConnection,
    invoice: &InvoiceLog,
    row: &StagingRow,
    boq_cache: &mut HashMap<String, Option<BoqItem>>,
    resolver: &mut CumulativeResolver,
) -> Result<RowOutcome> {
    if !row.include_in_invoice {
        return Ok(RowOutcome::Excluded);
    }

    let item_code = row.raw_item_code.as_deref().unwrap_or("").trim();
    if item_code.is_empty() {
        return Ok(RowOutcome::Rejected(EMPTY_CODE_MESSAGE.to_string()));
    }

    let boq_item = match boq_cache.get(item_code) {
        Some(cached) => cached.clone(),
        None => {
            let found =
                queries::find_boq_item_by_code(&mut *conn, invoice.project_id, item_code).await?;
            boq_cache.insert(item_code.to_string(), found.clone());
            found
        }
    };

    let Some(boq_item) = boq_item else {
        return Ok(RowOutcome::Rejected(format!(
            "item code '{}' not found in BOQ",
            item_code
        )));
    };

    let previous = resolver.previous_cumulative(conn, boq_item.id).await?;
    Ok(RowOutcome::Processed(compute_detail(
        invoice.id, &boq_item, row, previous,
    )))
}

/// 明细金额/数量计算 (纯函数)
pub fn compute_detail(
    invoice_id: i64,
    boq_item: &BoqItem,
    row: &StagingRow,
    previous_cumulative_qty: f64,
) -> NewInvoiceDetail {
    let claimed_qty = parse_float(row.raw_qty.as_deref(), 0.0);
    let current_percentage = parse_float(row.raw_percentage.as_deref(), 100.0);
    // 目前没有单独的审定数量, 审定 = 申报
    let approved_qty = claimed_qty;
    let equivalent_qty = approved_qty * (current_percentage / 100.0);
    let total_cumulative_qty = previous_cumulative_qty + equivalent_qty;

    let unit_price_at_time = boq_item.unit_price;
    let total_value = equivalent_qty * unit_price_at_time;

    let (main_description, phase) = extract_phase(row.raw_description.as_deref());
    let row_description = if !phase.is_empty() {
        phase
    } else if !main_description.is_empty() {
        main_description
    } else {
        FULL_ITEM_LABEL.to_string()
    };

    NewInvoiceDetail {
        invoice_id,
        boq_item_id: boq_item.id,
        row_description,
        current_percentage,
        claimed_qty,
        approved_qty,
        equivalent_qty,
        previous_cumulative_qty,
        total_cumulative_qty,
        unit_price_at_time,
        total_value,
        notes: None,
        // 暂存时已归一化
        trade: row.trade,
    }
}
