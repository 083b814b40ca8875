use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 工程项目 (projects)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub location: Option<String>,
}

/// 工程量清单条目 (boq_items)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BoqItem {
    pub id: i64,
    pub project_id: i64,
    pub item_code: String,     // 项目内唯一, 例如 "9-2"
    pub description: String,
    pub unit: String,
    pub unit_price: f64,       // 合同单价
    pub is_partial: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBoqItem {
    pub item_code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub is_partial: bool,
}
