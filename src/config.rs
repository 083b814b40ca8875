use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

const DEFAULT_DATABASE_URL: &str = "sqlite://construction_system.db?mode=rwc";

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// CSV 上传体积上限 (字节)
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                max_upload_bytes: 50 * 1024 * 1024,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: 5,
            },
        }
    }
}

impl AppConfig {
    /// 加载配置: 默认值 -> billing.toml (可选) -> BILLING__* 环境变量 -> DATABASE_URL
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("billing")
    }

    pub fn load_from(file_stem: &str) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("server.max_upload_bytes", defaults.server.max_upload_bytes as i64)?
            .set_default("database.url", defaults.database.url)?
            .set_default("database.max_connections", i64::from(defaults.database.max_connections))?
            .add_source(File::with_name(file_stem).required(false))
            .add_source(Environment::with_prefix("BILLING").separator("__"))
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_sqlite() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 8080);
        assert!(cfg.database.url.starts_with("sqlite://"));
    }

    #[test]
    fn reads_values_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("billing");
        std::fs::write(
            dir.path().join("billing.toml"),
            "[server]\nport = 9090\n\n[database]\nmax_connections = 2\n",
        )
        .unwrap();

        let cfg = AppConfig::load_from(stem.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.database.max_connections, 2);
        assert_eq!(cfg.server.host, "127.0.0.1");
    }
}
