use crate::models::{InvoiceDetail, InvoiceStatus, LedgerEntry, NewInvoiceDetail, ScheduleLine};
use chrono::NaiveDate;
use sqlx::{Executor, Sqlite};

/// SQLite 单条语句绑定参数有限, 批量插入按块提交
pub const INSERT_CHUNK: usize = 1000;

/// 删除结算单的日台账
pub async fn delete_ledger_for_invoice<'e, E>(executor: E, invoice_id: i64) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM daily_ledger WHERE invoice_id = $1")
        .bind(invoice_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// 删除结算单明细
pub async fn delete_details_for_invoice<'e, E>(executor: E, invoice_id: i64) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM invoice_details WHERE invoice_id = $1")
        .bind(invoice_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// 上一个已审批结算单中该清单条目的累计量
///
/// 只看同项目、状态 APPROVED、且ID小于当前结算单的记录, 按结算单ID降序取第一条.
pub async fn previous_cumulative_qty<'e, E>(
    executor: E,
    project_id: i64,
    boq_item_id: i64,
    current_invoice_id: i64,
) -> Result<Option<f64>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, f64>(
        r#"
        SELECT d.total_cumulative_qty
        FROM invoice_details d
        INNER JOIN invoices_log i ON i.id = d.invoice_id
        WHERE i.project_id = $1
          AND i.status = $2
          AND i.id < $3
          AND d.boq_item_id = $4
        ORDER BY i.id DESC, d.id DESC
        LIMIT 1
        "#,
    )
    .bind(project_id)
    .bind(InvoiceStatus::Approved)
    .bind(current_invoice_id)
    .bind(boq_item_id)
    .fetch_optional(executor)
    .await
}

/// 批量插入结算单明细
pub async fn insert_details<'e, E>(executor: E, details: &[NewInvoiceDetail]) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    if details.is_empty() {
        return Ok(0);
    }

    let mut query_builder = sqlx::QueryBuilder::<Sqlite>::new(
        "INSERT INTO invoice_details (
            invoice_id, boq_item_id, row_description, current_percentage,
            claimed_qty, approved_qty, equivalent_qty,
            previous_cumulative_qty, total_cumulative_qty,
            unit_price_at_time, total_value, notes, trade
        ) ",
    );

    query_builder.push_values(details, |mut b, d| {
        b.push_bind(d.invoice_id)
            .push_bind(d.boq_item_id)
            .push_bind(&d.row_description)
            .push_bind(d.current_percentage)
            .push_bind(d.claimed_qty)
            .push_bind(d.approved_qty)
            .push_bind(d.equivalent_qty)
            .push_bind(d.previous_cumulative_qty)
            .push_bind(d.total_cumulative_qty)
            .push_bind(d.unit_price_at_time)
            .push_bind(d.total_value)
            .push_bind(&d.notes)
            .push_bind(d.trade);
    });

    let result = query_builder.build().execute(executor).await?;
    Ok(result.rows_affected())
}

/// 批量插入日台账
pub async fn insert_ledger_entries<'e, E>(executor: E, entries: &[LedgerEntry]) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    if entries.is_empty() {
        return Ok(0);
    }

    tracing::debug!("开始构建日台账批量插入语句, {} 条记录", entries.len());
    let start_time = std::time::Instant::now();

    let mut query_builder = sqlx::QueryBuilder::<Sqlite>::new(
        "INSERT INTO daily_ledger (
            project_id, invoice_id, boq_item_id, entry_date, distributed_qty
        ) ",
    );

    query_builder.push_values(entries, |mut b, e| {
        b.push_bind(e.project_id)
            .push_bind(e.invoice_id)
            .push_bind(e.boq_item_id)
            .push_bind(e.entry_date)
            .push_bind(e.distributed_qty);
    });

    match query_builder.build().execute(executor).await {
        Ok(result) => {
            tracing::debug!(
                "✓ 日台账 INSERT 成功, 影响 {} 行, 耗时: {:?}",
                result.rows_affected(),
                start_time.elapsed()
            );
            Ok(result.rows_affected())
        }
        Err(e) => {
            tracing::error!("✗ 日台账 INSERT 失败, 耗时: {:?}, 错误: {:?}", start_time.elapsed(), e);
            Err(e)
        }
    }
}

/// 查询结算单明细
pub async fn list_details<'e, E>(executor: E, invoice_id: i64) -> Result<Vec<InvoiceDetail>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, InvoiceDetail>(
        r#"
        SELECT id, invoice_id, boq_item_id, row_description, current_percentage,
               claimed_qty, approved_qty, equivalent_qty,
               previous_cumulative_qty, total_cumulative_qty,
               unit_price_at_time, total_value, notes, trade
        FROM invoice_details
        WHERE invoice_id = $1
        ORDER BY id
        "#,
    )
    .bind(invoice_id)
    .fetch_all(executor)
    .await
}

/// 查询结算单的日台账
pub async fn list_ledger_entries<'e, E>(executor: E, invoice_id: i64) -> Result<Vec<LedgerEntry>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, (i64, i64, i64, NaiveDate, f64)>(
        r#"
        SELECT project_id, invoice_id, boq_item_id, entry_date, distributed_qty
        FROM daily_ledger
        WHERE invoice_id = $1
        ORDER BY id
        "#,
    )
    .bind(invoice_id)
    .fetch_all(executor)
    .await
    .map(|rows| {
        rows.into_iter()
            .map(|(project_id, invoice_id, boq_item_id, entry_date, distributed_qty)| LedgerEntry {
                project_id,
                invoice_id,
                boq_item_id,
                entry_date,
                distributed_qty,
            })
            .collect()
    })
}

/// 按清单条目汇总某时间段内的日台账数量
pub async fn sum_ledger_by_item<'e, E>(
    executor: E,
    project_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ScheduleLine>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ScheduleLine>(
        r#"
        SELECT b.item_code AS item_code,
               b.description AS description,
               COALESCE(SUM(l.distributed_qty), 0.0) AS total_qty
        FROM daily_ledger l
        INNER JOIN boq_items b ON b.id = l.boq_item_id
        WHERE l.project_id = $1
          AND l.entry_date >= $2
          AND l.entry_date <= $3
        GROUP BY b.item_code, b.description
        ORDER BY MIN(b.id)
        "#,
    )
    .bind(project_id)
    .bind(start)
    .bind(end)
    .fetch_all(executor)
    .await
}
