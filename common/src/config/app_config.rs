use anyhow::{Context, Result};
use config::Config;
use serde::Deserialize;
use std::path::Path;

/// 默认配置文件
pub const DEFAULT_CONFIG_FILE: &str = "api-config.toml";

/// 进程级环境变量 -> 配置键
const PROCESS_ENV_KEYS: &[(&str, &str)] = &[
    ("PORT", "server.port"),
    ("FRONTEND_URL", "server.frontend_url"),
    ("WECHAT_APP_ID", "wechat.app_id"),
    ("WECHAT_REDIRECT_URI", "wechat.redirect_uri"),
    ("NODE_ENV", "sys.node_env"),
    ("DATABASE_URL", "database.url"),
    ("JWT_SECRET", "auth.jwt_secret"),
];

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    pub database: Option<DatabaseConfig>,
    pub server: Option<ServerConfig>,
    pub sys: Option<SysConfig>,
    pub auth: Option<AuthConfig>,
    pub wechat: Option<WechatConfig>,
    pub rate_limit: Option<RateLimitConfig>,
}

impl AppConfig {
    /// 读取配置：文件（可选） -> `APP__SECTION__KEY` -> 进程环境变量
    pub fn load(file: Option<&str>) -> Result<Self> {
        let overrides = PROCESS_ENV_KEYS
            .iter()
            .map(|(env, key)| (*key, std::env::var(env).ok().filter(|v| !v.is_empty())))
            .collect::<Vec<_>>();
        Self::build(file, &overrides)
    }

    pub fn build(file: Option<&str>, overrides: &[(&str, Option<String>)]) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(file) = file {
            let required = file != DEFAULT_CONFIG_FILE || Path::new(file).exists();
            builder = builder.add_source(config::File::with_name(file).required(required));
        }
        builder = builder.add_source(config::Environment::with_prefix("APP").prefix_separator("__").separator("__"));
        for (key, value) in overrides {
            builder = builder.set_override_option(*key, value.clone()).with_context(|| format!("invalid override {}", key))?;
        }
        let cfg = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize::<AppConfig>()
            .context("Failed to deserialize configuration")?;
        Ok(cfg)
    }

    pub fn get_database(&self) -> DatabaseConfig {
        self.database.clone().unwrap_or_default()
    }
    pub fn get_server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }
    pub fn get_sys(&self) -> SysConfig {
        self.sys.clone().unwrap_or_default()
    }
    pub fn get_auth(&self) -> AuthConfig {
        self.auth.clone().unwrap_or_default()
    }
    pub fn get_wechat(&self) -> WechatConfig {
        self.wechat.clone().unwrap_or_default()
    }
    pub fn get_rate_limit(&self) -> RateLimitConfig {
        self.rate_limit.clone().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `mongodb://...`；`memory://` 使用进程内存储
    pub url: String,
    pub db_name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "memory://".to_string(), db_name: "ai_hub".to_string() }
    }
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url.starts_with("memory://")
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// CORS 允许的前端地址
    pub frontend_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 3001, frontend_url: "http://localhost:3000".to_string() }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SysConfig {
    //全局日志级别
    pub log_level: String,
    //production 时跳过开发数据初始化
    pub node_env: String,
}

impl Default for SysConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), node_env: "development".to_string() }
    }
}

impl SysConfig {
    pub fn is_production(&self) -> bool {
        self.node_env.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: "ai-hub-dev-secret".to_string(), jwt_expiry_hours: 24 * 7, bcrypt_cost: 10 }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct WechatConfig {
    pub app_id: String,
    pub redirect_uri: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub window_ms: u64,
    pub default_limit: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { enabled: true, window_ms: 60_000, default_limit: 100 }
    }
}
