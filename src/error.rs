use thiserror::Error;

/// 业务错误
///
/// `NotFound` / `Conflict` / `Validation` 属于操作级失败, 整个操作中止且不落库;
/// 行级错误不走这里, 而是写入暂存行的 `error_message`.
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl BillingError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(what: impl Into<String>) -> Self {
        Self::Conflict(what.into())
    }

    pub fn validation(what: impl Into<String>) -> Self {
        Self::Validation(what.into())
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;
