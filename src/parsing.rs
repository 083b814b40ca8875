//! 表格原始文本的解析工具: 专业归一化、数值解析、阶段拆分、行分类

use crate::error::{BillingError, Result};
use crate::models::{RowType, Trade};

/// 没有括号阶段时使用的阶段名
pub const FULL_PHASE: &str = "full";

const HEADER_KEYWORDS: &[&str] = &["فصل", "باب", "chapter", "section", "قسم", "بند"];
const TOTAL_KEYWORDS: &[&str] = &["إجمالي", "مجموع", "total", "sum", "الإجمالى"];
const SIGNATURE_KEYWORDS: &[&str] = &["توقيع", "المهندس", "المدير", "signature", "signed"];

/// 专业同义词表 (拉丁缩写 + 阿拉伯文)
const TRADE_SYNONYMS: &[(Trade, &[&str])] = &[
    (Trade::Civil, &["CIVIL", "CIV", "مدني"]),
    (Trade::Elec, &["ELEC", "ELECT", "كهرباء"]),
    (
        Trade::Mech,
        &["MECH", "MECHANICAL", "ميكانيكا", "ميكانيكى", "ميكانيكي"],
    ),
    (Trade::Arch, &["ARCH", "ARCHITECTURE", "معماري", "معمارى"]),
    (Trade::General, &["GENERAL", "GEN", "عام"]),
];

/// 将任意写法的专业归一化; 缺省为 GENERAL, 无法识别则报校验错误
pub fn normalize_trade(trade: Option<&str>) -> Result<Trade> {
    let Some(raw) = trade else {
        return Ok(Trade::General);
    };

    let t = raw.trim().to_uppercase();
    for (canonical, synonyms) in TRADE_SYNONYMS {
        if synonyms.contains(&t.as_str()) {
            return Ok(*canonical);
        }
    }

    let allowed: Vec<&str> = Trade::ALL.iter().map(Trade::as_str).collect();
    Err(BillingError::validation(format!(
        "invalid trade '{}'. Allowed values: {:?}",
        raw, allowed
    )))
}

fn is_blank_text(s: &str) -> bool {
    s.is_empty() || s.eq_ignore_ascii_case("nan")
}

/// 安全解析浮点数: 去掉 % 和千分位逗号, 失败或非有限值时返回 default
pub fn parse_float(value: Option<&str>, default: f64) -> f64 {
    let Some(value) = value else {
        return default;
    };

    let s = value.trim();
    if is_blank_text(s) {
        return default;
    }

    let cleaned = s.replace('%', "");
    let cleaned = cleaned.trim().replace(',', "");
    // nan / inf 之类的文本也能被 parse 接受, 一律按解析失败处理
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

/// 拆分描述与末尾括号中的阶段, 例如 "Door supply (frames)" -> ("Door supply", "frames")
pub fn extract_phase(text: Option<&str>) -> (String, String) {
    let Some(text) = text else {
        return (String::new(), String::new());
    };

    let clean = text.trim();
    if is_blank_text(clean) {
        return (String::new(), String::new());
    }

    if let Some(body) = clean.strip_suffix(')') {
        // 括号内容不跨行: 只在最后一行里找第一个左括号
        let line_start = body.rfind('\n').map(|i| i + 1).unwrap_or(0);
        if let Some(offset) = body[line_start..].find('(') {
            let open = line_start + offset;
            let phase = body[open + 1..].trim().to_string();
            let main = clean[..open].trim().to_string();
            return (main, phase);
        }
    }

    (clean.to_string(), FULL_PHASE.to_string())
}

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| haystack.contains(kw))
}

/// 对暂存行分类; 有编码即视为清单条目, 与数量无关
pub fn classify_row(
    raw_item_code: Option<&str>,
    raw_description: Option<&str>,
    _raw_qty: Option<&str>,
    _raw_percentage: Option<&str>,
) -> RowType {
    let code = raw_item_code.map(|c| c.trim().to_lowercase()).unwrap_or_default();
    if !is_blank_text(&code) {
        return RowType::Item;
    }

    let desc = raw_description
        .map(|d| d.trim().to_lowercase())
        .unwrap_or_default();
    if is_blank_text(&desc) {
        return RowType::Other;
    }

    if contains_any(&desc, HEADER_KEYWORDS) {
        RowType::Header
    } else if contains_any(&desc, TOTAL_KEYWORDS) {
        RowType::Total
    } else if contains_any(&desc, SIGNATURE_KEYWORDS) {
        RowType::Signature
    } else {
        RowType::Note
    }
}
