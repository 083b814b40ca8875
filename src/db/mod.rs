pub mod pool;
pub mod queries;
pub mod queries_ledger;
pub mod queries_staging;

pub use pool::{begin_write, create_pool};
pub use queries::*;
pub use queries_ledger::*;
pub use queries_staging::*;
