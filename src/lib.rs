pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod parsing;
pub mod service;
pub mod sheet;

pub use api::{create_router, AppState};
pub use config::AppConfig;
pub use db::create_pool;
pub use error::{BillingError, Result};
pub use service::{ApprovalService, CatalogService, ReportService, StagingService};
