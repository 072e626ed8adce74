//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（voxsum.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;
use crate::domain::submission::TargetMinutes;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["voxsum", "voxsum.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `VOXSUM_`，层级分隔符 `__`）
/// 2. 配置文件（`config_path`，为 None 时搜索 voxsum.toml 或 voxsum.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `VOXSUM_API__BASE_URL=http://backend:8000/api/v1`
/// - `VOXSUM_POLLING__INTERVAL_MS=1000`
/// - `VOXSUM_DEFAULTS__GENRE=news`
/// - `VOXSUM_LOG__LEVEL=debug`
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("api.base_url", "http://localhost:8000/api/v1")?
        .set_default("api.timeout_secs", 60)?
        .set_default("polling.interval_ms", 3000)?
        .set_default("defaults.genre", "general")?
        .set_default("defaults.target_minutes", 3)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级），例如 VOXSUM_API__BASE_URL
    builder = builder.add_source(
        Environment::with_prefix("VOXSUM")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let base_url = config.api.base_url.trim();
    if base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "API base URL cannot be empty".to_string(),
        ));
    }
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "API base URL must be http(s): {}",
            base_url
        )));
    }

    if config.api.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "API timeout cannot be 0".to_string(),
        ));
    }

    if config.polling.interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Polling interval cannot be 0".to_string(),
        ));
    }

    TargetMinutes::new(config.defaults.target_minutes)
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    if config.defaults.genre.is_empty() {
        return Err(ConfigError::ValidationError(
            "Default genre cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Client Configuration ===");
    tracing::info!("API Base URL: {}", config.api.base_url);
    tracing::info!("API Timeout: {}s", config.api.timeout_secs);
    tracing::info!("Poll Interval: {}ms", config.polling.interval_ms);
    tracing::info!("Default Genre: {}", config.defaults.genre);
    tracing::info!("Default Target Minutes: {}", config.defaults.target_minutes);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("============================");
}
