use crate::db::queries;
use crate::error::{BillingError, Result};
use crate::models::{BoqItem, NewBoqItem, NewProject, Project};
use sqlx::SqlitePool;

/// 项目与工程量清单维护
pub struct CatalogService {
    pool: SqlitePool,
}

impl CatalogService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_project(&self, project: &NewProject) -> Result<Project> {
        let name = project.name.trim();
        if name.is_empty() {
            return Err(BillingError::validation("project name is required"));
        }
        let created = queries::insert_project(&self.pool, name, project.location.as_deref()).await?;
        tracing::info!("Created project {} ({})", created.id, created.name);
        Ok(created)
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        Ok(queries::list_projects(&self.pool).await?)
    }

    pub async fn get_project(&self, project_id: i64) -> Result<Project> {
        queries::get_project(&self.pool, project_id)
            .await?
            .ok_or_else(|| BillingError::not_found(format!("project {} not found", project_id)))
    }

    /// 新增清单条目; 编码已存在时拒绝, 保证 (项目, 编码) 唯一
    pub async fn add_boq_item(&self, project_id: i64, item: &NewBoqItem) -> Result<BoqItem> {
        self.get_project(project_id).await?;

        let code = item.item_code.trim();
        if code.is_empty() {
            return Err(BillingError::validation("item_code is required"));
        }
        if queries::find_boq_item_by_code(&self.pool, project_id, code)
            .await?
            .is_some()
        {
            return Err(BillingError::conflict(format!(
                "item code '{}' already exists in project {}",
                code, project_id
            )));
        }

        Ok(queries::insert_boq_item(&self.pool, project_id, item).await?)
    }

    pub async fn list_boq_items(&self, project_id: i64) -> Result<Vec<BoqItem>> {
        self.get_project(project_id).await?;
        Ok(queries::list_boq_items(&self.pool, project_id).await?)
    }
}
