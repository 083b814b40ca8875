use crate::models::{BoqItem, InvoiceLog, InvoiceStatus, NewBoqItem, Project};
use chrono::NaiveDate;
use sqlx::{Executor, Sqlite};

/// 新建项目
pub async fn insert_project<'e, E>(
    executor: E,
    name: &str,
    location: Option<&str>,
) -> Result<Project, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Project>(
        r#"
        INSERT INTO projects (name, location)
        VALUES ($1, $2)
        RETURNING id, name, location
        "#,
    )
    .bind(name)
    .bind(location)
    .fetch_one(executor)
    .await
}

/// 查询项目列表
pub async fn list_projects<'e, E>(executor: E) -> Result<Vec<Project>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Project>("SELECT id, name, location FROM projects ORDER BY id")
        .fetch_all(executor)
        .await
}

/// 按ID查询项目
pub async fn get_project<'e, E>(executor: E, project_id: i64) -> Result<Option<Project>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Project>("SELECT id, name, location FROM projects WHERE id = $1")
        .bind(project_id)
        .fetch_optional(executor)
        .await
}

/// 新增清单条目
pub async fn insert_boq_item<'e, E>(
    executor: E,
    project_id: i64,
    item: &NewBoqItem,
) -> Result<BoqItem, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, BoqItem>(
        r#"
        INSERT INTO boq_items (project_id, item_code, description, unit, unit_price, is_partial)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, project_id, item_code, description, unit, unit_price, is_partial
        "#,
    )
    .bind(project_id)
    .bind(item.item_code.trim())
    .bind(&item.description)
    .bind(&item.unit)
    .bind(item.unit_price)
    .bind(item.is_partial)
    .fetch_one(executor)
    .await
}

/// 查询项目的全部清单条目
pub async fn list_boq_items<'e, E>(executor: E, project_id: i64) -> Result<Vec<BoqItem>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, BoqItem>(
        r#"
        SELECT id, project_id, item_code, description, unit, unit_price, is_partial
        FROM boq_items
        WHERE project_id = $1
        ORDER BY id
        "#,
    )
    .bind(project_id)
    .fetch_all(executor)
    .await
}

/// 按编码精确匹配清单条目 (区分大小写); 重复编码取最早的一条
pub async fn find_boq_item_by_code<'e, E>(
    executor: E,
    project_id: i64,
    item_code: &str,
) -> Result<Option<BoqItem>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, BoqItem>(
        r#"
        SELECT id, project_id, item_code, description, unit, unit_price, is_partial
        FROM boq_items
        WHERE project_id = $1
          AND item_code = $2
        ORDER BY id
        LIMIT 1
        "#,
    )
    .bind(project_id)
    .bind(item_code)
    .fetch_optional(executor)
    .await
}

/// 查询结算单主表
pub async fn get_invoice<'e, E>(executor: E, invoice_id: i64) -> Result<Option<InvoiceLog>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, InvoiceLog>(
        r#"
        SELECT id, project_id, invoice_number, status, period_start, period_end, previous_invoice_id
        FROM invoices_log
        WHERE id = $1
        "#,
    )
    .bind(invoice_id)
    .fetch_optional(executor)
    .await
}

/// 按 (项目, 结算单号) 查询
pub async fn find_invoice_by_number<'e, E>(
    executor: E,
    project_id: i64,
    invoice_number: i64,
) -> Result<Option<InvoiceLog>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, InvoiceLog>(
        r#"
        SELECT id, project_id, invoice_number, status, period_start, period_end, previous_invoice_id
        FROM invoices_log
        WHERE project_id = $1
          AND invoice_number = $2
        "#,
    )
    .bind(project_id)
    .bind(invoice_number)
    .fetch_optional(executor)
    .await
}

/// 新建草稿结算单
pub async fn insert_invoice<'e, E>(
    executor: E,
    project_id: i64,
    invoice_number: i64,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Result<InvoiceLog, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, InvoiceLog>(
        r#"
        INSERT INTO invoices_log (project_id, invoice_number, status, period_start, period_end)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, project_id, invoice_number, status, period_start, period_end, previous_invoice_id
        "#,
    )
    .bind(project_id)
    .bind(invoice_number)
    .bind(InvoiceStatus::Draft)
    .bind(period_start)
    .bind(period_end)
    .fetch_one(executor)
    .await
}

/// 更新结算期间
pub async fn update_invoice_period<'e, E>(
    executor: E,
    invoice_id: i64,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE invoices_log SET period_start = $1, period_end = $2 WHERE id = $3")
        .bind(period_start)
        .bind(period_end)
        .bind(invoice_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// 更新结算单状态
pub async fn set_invoice_status<'e, E>(
    executor: E,
    invoice_id: i64,
    status: InvoiceStatus,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE invoices_log SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(invoice_id)
        .execute(executor)
        .await?;
    Ok(())
}
