use crate::db::queries_ledger;
use crate::error::Result;
use sqlx::SqliteConnection;
use std::collections::HashMap;

/// 累计量解析器
///
/// 沿结算单ID顺序查找同项目上一张已审批结算单的累计量, 不走 previous_invoice_id 链.
/// 一次审批内结果只依赖其它结算单, 按清单条目缓存.
pub struct CumulativeResolver {
    project_id: i64,
    invoice_id: i64,
    cache: HashMap<i64, f64>,
}

impl CumulativeResolver {
    pub fn new(project_id: i64, invoice_id: i64) -> Self {
        Self {
            project_id,
            invoice_id,
            cache: HashMap::new(),
        }
    }

    /// 返回该清单条目的上期累计量, 没有历史记录时为 0
    pub async fn previous_cumulative(
        &mut self,
        conn: &mut SqliteConnection,
        boq_item_id: i64,
    ) -> Result<f64> {
        if let Some(qty) = self.cache.get(&boq_item_id) {
            return Ok(*qty);
        }

        let qty = queries_ledger::previous_cumulative_qty(
            &mut *conn,
            self.project_id,
            boq_item_id,
            self.invoice_id,
        )
        .await?
        .unwrap_or(0.0);

        self.cache.insert(boq_item_id, qty);
        Ok(qty)
    }
}
