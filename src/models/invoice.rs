use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Trade;

/// 结算单状态, 只能前进; APPROVED 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    Draft,
    Review,
    Approved,
}

impl InvoiceStatus {
    pub fn is_approved(&self) -> bool {
        matches!(self, InvoiceStatus::Approved)
    }
}

/// 结算单主表 (invoices_log)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct InvoiceLog {
    pub id: i64,
    pub project_id: i64,
    pub invoice_number: i64,
    pub status: InvoiceStatus,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub previous_invoice_id: Option<i64>, // 仅记录, 累计量计算不读取
}

/// 结算单明细 (invoice_details)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct InvoiceDetail {
    pub id: i64,
    pub invoice_id: i64,
    pub boq_item_id: i64,
    pub row_description: Option<String>,
    pub current_percentage: f64,
    pub claimed_qty: f64,
    pub approved_qty: f64,
    pub equivalent_qty: f64,
    pub previous_cumulative_qty: f64,
    pub total_cumulative_qty: f64,
    pub unit_price_at_time: f64,
    pub total_value: f64,
    pub notes: Option<String>,
    pub trade: Trade,
}

/// 待写入的明细 (审批计算结果)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewInvoiceDetail {
    pub invoice_id: i64,
    pub boq_item_id: i64,
    pub row_description: String,
    pub current_percentage: f64,
    pub claimed_qty: f64,
    pub approved_qty: f64,
    pub equivalent_qty: f64,
    pub previous_cumulative_qty: f64,
    pub total_cumulative_qty: f64,
    pub unit_price_at_time: f64,
    pub total_value: f64,
    pub notes: Option<String>,
    pub trade: Trade,
}

/// 审批结果统计
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalSummary {
    pub invoice_id: i64,
    pub processed_items: usize,
    pub errors: usize,
    pub excluded: usize,
    pub status: InvoiceStatus,
}

/// 结算单汇总 (金额按两位小数合计)
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceSummary {
    pub invoice: InvoiceLog,
    pub details: Vec<InvoiceDetail>,
    pub total_value: BigDecimal,
    pub total_by_trade: IndexMap<Trade, BigDecimal>,
}
