use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{ConnectOptions, Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::Result;

/// 创建数据库连接池并执行内嵌迁移
pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    let mut connect_options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        // 写事务排队等待写锁的上限
        .busy_timeout(Duration::from_secs(10));

    // 设置慢查询日志阈值为 5秒
    connect_options = connect_options.log_slow_statements(
        tracing::log::LevelFilter::Warn,
        Duration::from_secs(5),
    );

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(connect_options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database schema is up to date ({})", config.url);

    Ok(pool)
}

/// 开启写事务: 首条语句即取得写锁, 效果同 BEGIN IMMEDIATE
///
/// 延迟事务在读过之后再升级写锁时, 若已有其它写者, SQLite 直接返回 SQLITE_BUSY 而不等待
/// busy_timeout. 先写后读则整段事务按写锁排队.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>> {
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE invoices_log SET id = id WHERE id < 0")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}
