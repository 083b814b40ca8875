pub mod invoice;
pub mod ledger;
pub mod project;
pub mod staging;
pub mod trade;

pub use invoice::{
    ApprovalSummary, InvoiceDetail, InvoiceLog, InvoiceStatus, InvoiceSummary, NewInvoiceDetail,
};
pub use ledger::{LedgerEntry, ScheduleLine};
pub use project::{BoqItem, NewBoqItem, NewProject, Project};
pub use staging::{RawCell, RawRow, RowType, StageRequest, StageResult, StagingEdit, StagingRow};
pub use trade::Trade;
