use crate::models::{InvoiceStatus, RowType, StagingRow, Trade};
use sqlx::{Executor, Sqlite};

const STAGING_COLUMNS: &str = "id, invoice_id, row_index, raw_item_code, raw_description, raw_qty, \
     raw_percentage, trade, row_type, include_in_invoice, is_valid, error_message";

/// 待插入的暂存行
#[derive(Debug, Clone)]
pub struct NewStagingRow {
    pub row_index: i64,
    pub raw_item_code: String,
    pub raw_description: String,
    pub raw_qty: String,
    pub raw_percentage: String,
    pub row_type: RowType,
}

/// 暂存行及其所属结算单状态 (批量编辑时使用)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StagingRowWithStatus {
    #[sqlx(flatten)]
    pub staging: StagingRow,
    pub invoice_status: InvoiceStatus,
}

/// 删除同一结算单、同一专业的暂存行; 其它专业不受影响
pub async fn delete_staging_for_trade<'e, E>(
    executor: E,
    invoice_id: i64,
    trade: Trade,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "DELETE FROM staging_invoice_details WHERE invoice_id = $1 AND trade = $2",
    )
    .bind(invoice_id)
    .bind(trade)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// 批量插入暂存行
pub async fn insert_staging_rows<'e, E>(
    executor: E,
    invoice_id: i64,
    trade: Trade,
    rows: &[NewStagingRow],
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    if rows.is_empty() {
        return Ok(0);
    }

    let mut query_builder = sqlx::QueryBuilder::<Sqlite>::new(
        "INSERT INTO staging_invoice_details (
            invoice_id, row_index, raw_item_code, raw_description, raw_qty,
            raw_percentage, trade, row_type, include_in_invoice, is_valid
        ) ",
    );

    query_builder.push_values(rows, |mut b, row| {
        b.push_bind(invoice_id)
            .push_bind(row.row_index)
            .push_bind(&row.raw_item_code)
            .push_bind(&row.raw_description)
            .push_bind(&row.raw_qty)
            .push_bind(&row.raw_percentage)
            .push_bind(trade)
            .push_bind(row.row_type)
            .push_bind(true)
            .push_bind(false);
    });

    let result = query_builder.build().execute(executor).await?;
    Ok(result.rows_affected())
}

/// 查询结算单全部暂存行 (按原始行号)
pub async fn list_staging_rows<'e, E>(executor: E, invoice_id: i64) -> Result<Vec<StagingRow>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {STAGING_COLUMNS} FROM staging_invoice_details \
         WHERE invoice_id = $1 ORDER BY row_index, id"
    );
    sqlx::query_as::<_, StagingRow>(&sql)
        .bind(invoice_id)
        .fetch_all(executor)
        .await
}

/// 查询单条暂存行, 连同结算单状态
pub async fn get_staging_row_with_status<'e, E>(
    executor: E,
    row_id: i64,
) -> Result<Option<StagingRowWithStatus>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, StagingRowWithStatus>(
        r#"
        SELECT s.id, s.invoice_id, s.row_index, s.raw_item_code, s.raw_description, s.raw_qty,
               s.raw_percentage, s.trade, s.row_type, s.include_in_invoice, s.is_valid,
               s.error_message, i.status AS invoice_status
        FROM staging_invoice_details s
        INNER JOIN invoices_log i ON i.id = s.invoice_id
        WHERE s.id = $1
        "#,
    )
    .bind(row_id)
    .fetch_optional(executor)
    .await
}

/// 写回编辑后的原始字段
pub async fn update_staging_raw<'e, E>(executor: E, row: &StagingRow) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE staging_invoice_details
        SET include_in_invoice = $1,
            raw_item_code = $2,
            raw_description = $3,
            raw_qty = $4,
            raw_percentage = $5,
            row_type = $6
        WHERE id = $7
        "#,
    )
    .bind(row.include_in_invoice)
    .bind(&row.raw_item_code)
    .bind(&row.raw_description)
    .bind(&row.raw_qty)
    .bind(&row.raw_percentage)
    .bind(row.row_type)
    .bind(row.id)
    .execute(executor)
    .await?;
    Ok(())
}

/// 记录审批对该行的处理结果
pub async fn mark_staging_outcome<'e, E>(
    executor: E,
    row_id: i64,
    row_type: RowType,
    is_valid: bool,
    error_message: Option<&str>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE staging_invoice_details
        SET row_type = $1, is_valid = $2, error_message = $3
        WHERE id = $4
        "#,
    )
    .bind(row_type)
    .bind(is_valid)
    .bind(error_message)
    .bind(row_id)
    .execute(executor)
    .await?;
    Ok(())
}
