#![allow(dead_code)]

use boq_billing::config::DatabaseConfig;
use boq_billing::create_pool;
use boq_billing::models::{BoqItem, NewBoqItem, NewProject, Project, RawCell, RawRow, StageRequest};
use boq_billing::service::CatalogService;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tempfile::TempDir;

pub async fn setup_pool() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let config = DatabaseConfig {
        url: format!("sqlite://{}", db_path.display()),
        max_connections: 4,
    };
    let pool = create_pool(&config).await.unwrap();
    (pool, dir)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn row(code: &str, description: &str, qty: &str, pct: Option<&str>) -> RawRow {
    RawRow {
        item_code: Some(RawCell::from(code)),
        description: Some(RawCell::from(description)),
        qty: Some(RawCell::from(qty)),
        percentage: pct.map(RawCell::from),
    }
}

pub fn stage_request(
    project_id: i64,
    invoice_number: i64,
    start: NaiveDate,
    end: NaiveDate,
    trade: Option<&str>,
    rows: Vec<RawRow>,
) -> StageRequest {
    StageRequest {
        project_id,
        invoice_number,
        period_start: start,
        period_end: end,
        trade: trade.map(str::to_string),
        rows,
    }
}

/// 项目 + 两个清单条目 ("9-2" 单价 20, "A-1" 单价 3.5)
pub async fn seed_project(pool: &SqlitePool) -> (Project, BoqItem, BoqItem) {
    let catalog = CatalogService::new(pool.clone());
    let project = catalog
        .create_project(&NewProject {
            name: "Tower A".to_string(),
            location: Some("Cairo".to_string()),
        })
        .await
        .unwrap();

    let doors = catalog
        .add_boq_item(
            project.id,
            &NewBoqItem {
                item_code: "9-2".to_string(),
                description: "Wooden doors".to_string(),
                unit: "nr".to_string(),
                unit_price: 20.0,
                is_partial: false,
            },
        )
        .await
        .unwrap();

    let paint = catalog
        .add_boq_item(
            project.id,
            &NewBoqItem {
                item_code: "A-1".to_string(),
                description: "Paint".to_string(),
                unit: "m2".to_string(),
                unit_price: 3.5,
                is_partial: true,
            },
        )
        .await
        .unwrap();

    (project, doors, paint)
}
