//! 结算表格 (CSV 导出) 读取与列识别

use crate::error::{BillingError, Result};
use crate::models::{RawCell, RawRow};
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;

/// 各字段可接受的表头写法, 按优先级排列
const ITEM_CODE_HEADERS: &[&str] = &[
    "item_code", "code", "item", "boq", "boq_code", "رقم البند", "كود", "رقم بند", "بند",
];
const DESCRIPTION_HEADERS: &[&str] = &[
    "description", "desc", "تفصيل", "البند", "بيان الأعمال", "وصف", "بنود الأعمال",
];
const QTY_HEADERS: &[&str] = &[
    "total_qty",
    "qty",
    "quantity",
    "الكمية",
    "الكمية الحالية",
    "الجارى",
    "الجاري",
    "كمية الأعمال الجارية",
];
const PERCENTAGE_HEADERS: &[&str] = &["percentage", "pct", "نسبة", "نسبة الصرف", "نسبة التنفيذ"];

/// 列映射: 字段 -> 列序号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub item_code: usize,
    pub description: Option<usize>,
    pub qty: usize,
    pub percentage: Option<usize>,
}

fn find_column(headers: &[String], patterns: &[&str]) -> Option<usize> {
    patterns.iter().find_map(|p| {
        let p = p.to_lowercase();
        headers.iter().position(|h| *h == p)
    })
}

/// 识别列; 缺少编码列或数量列时报校验错误
pub fn detect_columns(headers: &StringRecord) -> Result<ColumnMap> {
    let normalized: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

    let item_code = find_column(&normalized, ITEM_CODE_HEADERS);
    let qty = find_column(&normalized, QTY_HEADERS);

    match (item_code, qty) {
        (Some(item_code), Some(qty)) => Ok(ColumnMap {
            item_code,
            description: find_column(&normalized, DESCRIPTION_HEADERS),
            qty,
            percentage: find_column(&normalized, PERCENTAGE_HEADERS),
        }),
        _ => {
            let available: Vec<&str> = headers.iter().collect();
            Err(BillingError::validation(format!(
                "required columns (item code / quantity) not found. Available columns: {:?}",
                available
            )))
        }
    }
}

fn cell(record: &StringRecord, idx: Option<usize>) -> Option<RawCell> {
    let value = record.get(idx?)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(RawCell::Text(value.to_string()))
    }
}

/// 读取 CSV 为表格行 (第一行为表头); 单元格保持原文本
pub fn read_rows<R: Read>(input: R) -> Result<Vec<RawRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    let columns = detect_columns(&headers)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(RawRow {
            item_code: cell(&record, Some(columns.item_code)),
            description: cell(&record, columns.description),
            qty: cell(&record, Some(columns.qty)),
            percentage: cell(&record, columns.percentage),
        });
    }

    tracing::debug!("Read {} sheet rows, columns {:?}", rows.len(), columns);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_english_headers_case_insensitively() {
        let headers = StringRecord::from(vec!["Code", "Description", "QTY", "Pct"]);
        let map = detect_columns(&headers).unwrap();
        assert_eq!(
            map,
            ColumnMap {
                item_code: 0,
                description: Some(1),
                qty: 2,
                percentage: Some(3),
            }
        );
    }

    #[test]
    fn detects_arabic_headers() {
        let headers = StringRecord::from(vec!["بيان الأعمال", "رقم البند", "الكمية الحالية"]);
        let map = detect_columns(&headers).unwrap();
        assert_eq!(map.item_code, 1);
        assert_eq!(map.description, Some(0));
        assert_eq!(map.qty, 2);
        assert_eq!(map.percentage, None);
    }

    #[test]
    fn missing_quantity_column_is_a_validation_error() {
        let headers = StringRecord::from(vec!["code", "description"]);
        let err = detect_columns(&headers).unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
        assert!(err.to_string().contains("description"));
    }

    #[test]
    fn reads_rows_keeping_text_and_blanks() {
        let data = "code,description,qty,percentage\n\
                    9-2,Door (frames),\"1,200\",50%\n\
                    ,Chapter 3,,\n\
                    9-3,Windows,4\n";
        let rows = read_rows(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].item_code, Some(RawCell::from("9-2")));
        assert_eq!(rows[0].qty, Some(RawCell::from("1,200")));
        assert_eq!(rows[0].percentage, Some(RawCell::from("50%")));
        assert_eq!(rows[1].item_code, None);
        assert_eq!(rows[2].percentage, None);
    }
}
