use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Trade;

/// 行类型 (清单条目 / 章节标题 / 合计行 / 说明 / 签字栏 / 其它)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RowType {
    #[default]
    Item,
    Header,
    Total,
    Note,
    Signature,
    Other,
}

/// 暂存行 (staging_invoice_details)
///
/// raw_* 字段保持原始文本, 不做类型约束, 以容忍表格中的脏数据.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StagingRow {
    pub id: i64,
    pub invoice_id: i64,
    pub row_index: i64,
    pub raw_item_code: Option<String>,
    pub raw_description: Option<String>,
    pub raw_qty: Option<String>,
    pub raw_percentage: Option<String>,
    pub trade: Trade,
    pub row_type: RowType,
    pub include_in_invoice: bool,
    pub is_valid: bool,
    pub error_message: Option<String>,
}

/// 表格单元格: 数字或文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCell {
    Number(f64),
    Text(String),
}

impl RawCell {
    /// 转成暂存用的原始文本; 整数值不带小数点
    pub fn to_raw_string(&self) -> String {
        match self {
            RawCell::Number(n) => n.to_string(),
            RawCell::Text(s) => s.trim().to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            RawCell::Number(_) => false,
            RawCell::Text(s) => {
                let s = s.trim();
                s.is_empty() || s.eq_ignore_ascii_case("nan")
            }
        }
    }
}

impl From<&str> for RawCell {
    fn from(s: &str) -> Self {
        RawCell::Text(s.to_string())
    }
}

impl From<f64> for RawCell {
    fn from(n: f64) -> Self {
        RawCell::Number(n)
    }
}

/// 表格中的一行 (已按列映射好)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(default)]
    pub item_code: Option<RawCell>,
    #[serde(default)]
    pub description: Option<RawCell>,
    #[serde(default)]
    pub qty: Option<RawCell>,
    #[serde(default)]
    pub percentage: Option<RawCell>,
}

/// 暂存导入请求
#[derive(Debug, Clone, Deserialize)]
pub struct StageRequest {
    pub project_id: i64,
    pub invoice_number: i64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    #[serde(default)]
    pub trade: Option<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub invoice_id: i64,
    pub rows_staged: usize,
    pub trade: Trade,
}

/// 暂存行批量编辑; None 表示不修改
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StagingEdit {
    pub id: i64,
    pub include_in_invoice: Option<bool>,
    pub raw_item_code: Option<String>,
    pub raw_description: Option<String>,
    pub raw_qty: Option<String>,
    pub raw_percentage: Option<String>,
}
