use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 内存仓储的数据库 URL 标记 (本地调试, 无需 Postgres)
pub const MEMORY_DATABASE_URL: &str = "memory";

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub shopify: ShopifyConfig,
    pub ads: AdsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 单个 HTTP 请求的处理上限
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyConfig {
    pub api_version: String,
    /// orders.json 的 status 过滤 (open / closed / cancelled / any)
    pub order_status: String,
    pub page_limit: u32,
    pub timeout_secs: u64,
    /// 覆盖 `https://{shop}` (测试或代理)
    #[serde(default)]
    pub base_url: Option<String>,
    /// 内存模式下预置的店铺
    #[serde(default)]
    pub dev_shop: Option<String>,
    #[serde(default)]
    pub dev_access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdsConfig {
    /// 单次广告平台调用超时
    pub timeout_secs: u64,
    pub meta_api_version: String,
    pub meta_base_url: String,
    pub google_api_version: String,
    pub google_base_url: String,
    #[serde(default)]
    pub google_developer_token: Option<String>,
    /// MCC 管理账户 ID (可选)
    #[serde(default)]
    pub google_login_customer_id: Option<String>,
}

impl ShopifyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AdsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url == MEMORY_DATABASE_URL
    }
}

impl AppConfig {
    /// 加载配置: 默认值 -> dashboard.toml (可选) -> DASHBOARD__* 环境变量 -> 兼容旧环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::defaults()?
            .add_source(File::with_name("dashboard").required(false))
            .add_source(Environment::with_prefix("DASHBOARD").separator("__"));

        for (var, key) in [
            ("DATABASE_URL", "database.url"),
            ("SERVER_HOST", "server.host"),
            ("SERVER_PORT", "server.port"),
        ] {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        builder.build()?.try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080_i64)?
            .set_default("server.request_timeout_secs", 60_i64)?
            .set_default("database.url", "postgres://localhost/profit_dashboard")?
            .set_default("database.max_connections", 20_i64)?
            .set_default("shopify.api_version", "2024-01")?
            .set_default("shopify.order_status", "any")?
            .set_default("shopify.page_limit", 250_i64)?
            .set_default("shopify.timeout_secs", 30_i64)?
            .set_default("ads.timeout_secs", 15_i64)?
            .set_default("ads.meta_api_version", "v19.0")?
            .set_default("ads.meta_base_url", "https://graph.facebook.com")?
            .set_default("ads.google_api_version", "v16")?
            .set_default("ads.google_base_url", "https://googleads.googleapis.com")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_deserialize() {
        let config: AppConfig = AppConfig::defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.shopify.page_limit, 250);
        assert_eq!(config.ads.timeout(), Duration::from_secs(15));
        assert!(config.ads.google_developer_token.is_none());
        assert!(!config.database.is_memory());
    }

    #[test]
    fn overrides_take_precedence() {
        let config: AppConfig = AppConfig::defaults()
            .unwrap()
            .set_override("database.url", MEMORY_DATABASE_URL)
            .unwrap()
            .set_override("ads.timeout_secs", "5")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(config.database.is_memory());
        assert_eq!(config.ads.timeout_secs, 5);
    }
}
