pub mod approval;
pub mod catalog;
pub mod cumulative;
pub mod ledger;
pub mod reports;
pub mod staging;

pub use approval::ApprovalService;
pub use catalog::CatalogService;
pub use reports::ReportService;
pub use staging::StagingService;
