use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 日台账条目 (daily_ledger), 未落库
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub project_id: i64,
    pub invoice_id: i64,
    pub boq_item_id: i64,
    pub entry_date: NaiveDate,
    pub distributed_qty: f64,
}

/// 月度进度报表行
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ScheduleLine {
    pub item_code: String,
    pub description: String,
    pub total_qty: f64,
}
