mod handlers;

pub use handlers::*;

use crate::service::{ApprovalService, CatalogService, ReportService, StagingService};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower::ServiceBuilder;

/// 共享状态: 各业务服务
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub staging: Arc<StagingService>,
    pub approval: Arc<ApprovalService>,
    pub reports: Arc<ReportService>,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            catalog: Arc::new(CatalogService::new(pool.clone())),
            staging: Arc::new(StagingService::new(pool.clone())),
            approval: Arc::new(ApprovalService::new(pool.clone())),
            reports: Arc::new(ReportService::new(pool)),
        }
    }
}

/// 构建路由
pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    let project_routes = Router::new()
        .route("/api/v1/projects", get(list_projects).post(create_project))
        .route("/api/v1/projects/:project_id", get(get_project))
        .route(
            "/api/v1/projects/:project_id/boq",
            get(list_boq_items).post(add_boq_item),
        );

    let invoice_routes = Router::new()
        .route("/api/v1/invoices/stage", post(stage_invoice))
        .route("/api/v1/invoices/upload", post(upload_invoice))
        .route(
            "/api/v1/invoices/:invoice_id/staging",
            get(get_invoice_staging).put(update_staging_rows),
        )
        .route("/api/v1/invoices/:invoice_id/approve", post(approve_invoice))
        .route("/api/v1/invoices/:invoice_id/summary", get(invoice_summary));

    let report_routes = Router::new()
        .route("/api/v1/reports/schedule/:project_id", get(schedule_report))
        .route(
            "/api/v1/reports/schedule/:project_id/csv",
            get(schedule_report_csv),
        );

    Router::new()
        .route("/health", get(health_check))
        .merge(project_routes)
        .merge(invoice_routes)
        .merge(report_routes)
        .layer(ServiceBuilder::new().layer(DefaultBodyLimit::max(max_upload_bytes)))
        .with_state(state)
}
