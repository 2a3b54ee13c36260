use chrono_tz::Tz;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::JwtConfig;
use crate::core::ServerError;
use crate::utils::retry::RetryPolicy;
use crate::utils::time;

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// 进程内存储 (开发 / 测试)
    Memory,
    /// SQLite 文档表
    Sqlite,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!("Unknown store backend '{other}' (expected memory|sqlite)")),
        }
    }
}

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | STORE_BACKEND | memory | memory \| sqlite |
/// | DATABASE_PATH | WORK_DIR/database/till.db | SQLite 文件 |
/// | BUSINESS_TIMEZONE | UTC | 周窗口计算用的 IANA 时区 |
/// | PAYMENT_SERVICE_URL | http://localhost:4242 | 支付服务地址 |
/// | PAYMENT_TIMEOUT_MS | 10000 | 支付请求超时 |
/// | ELEVATION_SWEEP_SECS | 30 | 过期角色清理周期 |
/// | BREAK_TICK_MS | 1000 | 休息计时周期 |
/// | SHIFT_FETCH_ATTEMPTS | 3 | 排班管理查询重试次数 |
/// | SHIFT_FETCH_BASE_DELAY_MS | 2000 | 重试基础延迟 |
/// | LOG_LEVEL / LOG_JSON / LOG_DIR | info / false / - | 日志 |
/// | JWT_SECRET / JWT_ISSUER / JWT_AUDIENCE | - | 令牌校验 |
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    pub jwt: JwtConfig,
    pub store_backend: StoreBackend,
    pub database_path: Option<String>,
    pub timezone: Tz,
    pub payment_service_url: String,
    pub payment_timeout_ms: u64,
    pub elevation_sweep_secs: u64,
    pub break_tick_ms: u64,
    pub shift_fetch_attempts: u32,
    pub shift_fetch_base_delay_ms: u64,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置，未设置的项使用默认值
    pub fn from_env() -> Result<Self, ServerError> {
        let jwt = JwtConfig::from_env().map_err(|e| ServerError::Config(e.to_string()))?;
        let store_backend = match std::env::var("STORE_BACKEND") {
            Ok(v) => v.parse().map_err(ServerError::Config)?,
            Err(_) => StoreBackend::Memory,
        };

        Ok(Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: env_or("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            jwt,
            store_backend,
            database_path: std::env::var("DATABASE_PATH").ok(),
            timezone: time::parse_timezone(
                &std::env::var("BUSINESS_TIMEZONE").unwrap_or_else(|_| "UTC".into()),
            ),
            payment_service_url: std::env::var("PAYMENT_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:4242".into()),
            payment_timeout_ms: env_or("PAYMENT_TIMEOUT_MS", 10_000),
            elevation_sweep_secs: env_or("ELEVATION_SWEEP_SECS", 30),
            break_tick_ms: env_or("BREAK_TICK_MS", 1000),
            shift_fetch_attempts: env_or("SHIFT_FETCH_ATTEMPTS", 3),
            shift_fetch_base_delay_ms: env_or("SHIFT_FETCH_BASE_DELAY_MS", 2000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_or("LOG_JSON", false),
            log_dir: std::env::var("LOG_DIR").ok(),
        })
    }

    /// 测试配置：内存存储、固定 JWT 密钥、不读取环境变量
    pub fn for_testing() -> Self {
        Self {
            work_dir: std::env::temp_dir().to_string_lossy().into_owned(),
            http_port: 0,
            environment: "test".into(),
            jwt: JwtConfig::for_testing(),
            store_backend: StoreBackend::Memory,
            database_path: None,
            timezone: Tz::UTC,
            payment_service_url: "http://127.0.0.1:4242".into(),
            payment_timeout_ms: 2000,
            elevation_sweep_secs: 30,
            break_tick_ms: 1000,
            shift_fetch_attempts: 3,
            shift_fetch_base_delay_ms: 2000,
            log_level: "debug".into(),
            log_json: false,
            log_dir: None,
        }
    }

    /// SQLite 文件路径 (DATABASE_PATH 优先)
    pub fn database_file(&self) -> PathBuf {
        match &self.database_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.work_dir).join("database").join("till.db"),
        }
    }

    pub fn shift_fetch_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.shift_fetch_attempts,
            Duration::from_millis(self.shift_fetch_base_delay_ms),
        )
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
