use crate::db::queries_staging::NewStagingRow;
use crate::db::{self, queries, queries_staging};
use crate::error::{BillingError, Result};
use crate::models::{InvoiceLog, RawCell, RawRow, StageRequest, StageResult, StagingEdit, StagingRow, Trade};
use crate::parsing::{classify_row, normalize_trade};
use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};

/// 暂存区服务: 表格导入、浏览、批量编辑
pub struct StagingService {
    pool: SqlitePool,
}

impl StagingService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 按 (项目, 结算单号) 取得或新建结算单, 再导入该专业的表格行
    pub async fn stage_invoice(&self, req: StageRequest) -> Result<StageResult> {
        let trade = normalize_trade(req.trade.as_deref())?;
        if req.period_end < req.period_start {
            return Err(BillingError::validation(format!(
                "period_end {} is before period_start {}",
                req.period_end, req.period_start
            )));
        }

        let mut tx = db::begin_write(&self.pool).await?;

        if queries::get_project(&mut *tx, req.project_id).await?.is_none() {
            return Err(BillingError::not_found(format!(
                "project {} not found",
                req.project_id
            )));
        }

        let invoice = acquire_invoice(
            &mut *tx,
            req.project_id,
            req.invoice_number,
            req.period_start,
            req.period_end,
        )
        .await?;

        let rows_staged = stage_rows(&mut *tx, &invoice, trade, &req.rows).await?;
        tx.commit().await?;

        tracing::info!(
            "Staged {} rows ({}) for project {} invoice #{} (id {})",
            rows_staged,
            trade,
            invoice.project_id,
            invoice.invoice_number,
            invoice.id
        );

        Ok(StageResult {
            invoice_id: invoice.id,
            rows_staged,
            trade,
        })
    }

    /// 对已存在的结算单重新导入某专业的表格行
    pub async fn stage(&self, invoice_id: i64, trade: Option<&str>, rows: &[RawRow]) -> Result<StageResult> {
        let trade = normalize_trade(trade)?;
        let mut tx = db::begin_write(&self.pool).await?;

        let invoice = queries::get_invoice(&mut *tx, invoice_id)
            .await?
            .ok_or_else(|| BillingError::not_found(format!("invoice {} not found", invoice_id)))?;
        ensure_editable(&invoice)?;

        let rows_staged = stage_rows(&mut *tx, &invoice, trade, rows).await?;
        tx.commit().await?;

        Ok(StageResult {
            invoice_id,
            rows_staged,
            trade,
        })
    }

    /// 结算单的暂存行 (按原始行号排序)
    pub async fn list_staging_rows(&self, invoice_id: i64) -> Result<Vec<StagingRow>> {
        if queries::get_invoice(&self.pool, invoice_id).await?.is_none() {
            return Err(BillingError::not_found(format!("invoice {} not found", invoice_id)));
        }
        Ok(queries_staging::list_staging_rows(&self.pool, invoice_id).await?)
    }

    /// 批量编辑某结算单的暂存行
    ///
    /// 不存在的行、属于其它结算单的行、以及已审批结算单的行直接跳过, 不计数.
    pub async fn update_staging_rows(&self, invoice_id: i64, edits: &[StagingEdit]) -> Result<usize> {
        let mut tx = db::begin_write(&self.pool).await?;
        let mut updated_count = 0;

        for edit in edits {
            let Some(found) = queries_staging::get_staging_row_with_status(&mut *tx, edit.id).await? else {
                tracing::debug!("Staging row {} not found, skipping", edit.id);
                continue;
            };

            if found.staging.invoice_id != invoice_id {
                tracing::warn!(
                    "Staging row {} belongs to invoice {}, not {}, skipping",
                    edit.id,
                    found.staging.invoice_id,
                    invoice_id
                );
                continue;
            }

            if found.invoice_status.is_approved() {
                tracing::warn!(
                    "Staging row {} belongs to approved invoice {}, skipping",
                    edit.id,
                    found.staging.invoice_id
                );
                continue;
            }

            let row = apply_edit(found.staging, edit);
            queries_staging::update_staging_raw(&mut *tx, &row).await?;
            updated_count += 1;
        }

        tx.commit().await?;
        tracing::info!("Updated {}/{} staging rows", updated_count, edits.len());
        Ok(updated_count)
    }
}

fn ensure_editable(invoice: &InvoiceLog) -> Result<()> {
    if invoice.status.is_approved() {
        return Err(BillingError::conflict(format!(
            "invoice #{} (id {}) is already approved and cannot be modified",
            invoice.invoice_number, invoice.id
        )));
    }
    Ok(())
}

/// 取得或新建结算单; 已审批的结算单拒绝再次导入
pub async fn acquire_invoice(
    conn: &mut SqliteConnection,
    project_id: i64,
    invoice_number: i64,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Result<InvoiceLog> {
    if let Some(mut existing) =
        queries::find_invoice_by_number(&mut *conn, project_id, invoice_number).await?
    {
        ensure_editable(&existing)?;
        queries::update_invoice_period(&mut *conn, existing.id, period_start, period_end).await?;
        existing.period_start = period_start;
        existing.period_end = period_end;
        return Ok(existing);
    }

    let invoice =
        queries::insert_invoice(&mut *conn, project_id, invoice_number, period_start, period_end).await?;
    tracing::info!(
        "Created draft invoice #{} (id {}) for project {}",
        invoice_number,
        invoice.id,
        project_id
    );
    Ok(invoice)
}

/// 替换该结算单、该专业的暂存行
pub async fn stage_rows(
    conn: &mut SqliteConnection,
    invoice: &InvoiceLog,
    trade: Trade,
    rows: &[RawRow],
) -> Result<usize> {
    ensure_editable(invoice)?;

    let removed = queries_staging::delete_staging_for_trade(&mut *conn, invoice.id, trade).await?;
    if removed > 0 {
        tracing::debug!("Invoice {}: replaced {} staging rows ({})", invoice.id, removed, trade);
    }

    let new_rows = build_staging_rows(rows);
    for chunk in new_rows.chunks(crate::db::INSERT_CHUNK) {
        queries_staging::insert_staging_rows(&mut *conn, invoice.id, trade, chunk).await?;
    }
    Ok(new_rows.len())
}

fn cell_text(cell: &Option<RawCell>) -> String {
    cell.as_ref().map(RawCell::to_raw_string).unwrap_or_default()
}

/// 表格行 -> 暂存行; 编码为空的行 (通常是尾部空行) 直接丢弃, row_index 保留原始位置
pub fn build_staging_rows(rows: &[RawRow]) -> Vec<NewStagingRow> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| row.item_code.as_ref().is_some_and(|c| !c.is_blank()))
        .map(|(idx, row)| {
            let raw_item_code = cell_text(&row.item_code);
            let raw_description = cell_text(&row.description);
            let raw_qty = cell_text(&row.qty);
            let raw_percentage = cell_text(&row.percentage);
            let row_type = classify_row(
                Some(raw_item_code.as_str()),
                Some(raw_description.as_str()),
                Some(raw_qty.as_str()),
                Some(raw_percentage.as_str()),
            );
            NewStagingRow {
                row_index: idx as i64,
                raw_item_code,
                raw_description,
                raw_qty,
                raw_percentage,
                row_type,
            }
        })
        .collect()
}

/// 应用一次编辑, 并按新内容重新分类
pub fn apply_edit(mut row: StagingRow, edit: &StagingEdit) -> StagingRow {
    if let Some(include) = edit.include_in_invoice {
        row.include_in_invoice = include;
    }
    if let Some(code) = &edit.raw_item_code {
        row.raw_item_code = Some(code.clone());
    }
    if let Some(desc) = &edit.raw_description {
        row.raw_description = Some(desc.clone());
    }
    if let Some(qty) = &edit.raw_qty {
        row.raw_qty = Some(qty.clone());
    }
    if let Some(pct) = &edit.raw_percentage {
        row.raw_percentage = Some(pct.clone());
    }

    row.row_type = classify_row(
        row.raw_item_code.as_deref(),
        row.raw_description.as_deref(),
        row.raw_qty.as_deref(),
        row.raw_percentage.as_deref(),
    );
    row
}
