use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::infrastructure::paths::config_file;

/// 配置文件结构，`<data-dir>/config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 选择器没写发行版时使用的默认发行版
    #[serde(default = "default_distribution")]
    pub default_distribution: String,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_distribution: default_distribution(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

fn default_distribution() -> String {
    "temurin".to_string()
}

/// JDK 自动发现的配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,
    /// 按来源名开关，缺省的来源视为开启
    #[serde(default)]
    pub sources: HashMap<String, bool>,
}

fn default_true() -> bool {
    true
}

fn default_cache_ttl_hours() -> u64 {
    24
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig {
            enabled: true,
            cache_ttl_hours: default_cache_ttl_hours(),
            sources: HashMap::new(),
        }
    }
}

impl DiscoveryConfig {
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cache_ttl_hours as i64)
    }

    pub fn is_source_enabled(&self, name: &str) -> bool {
        self.enabled && self.sources.get(name).copied().unwrap_or(true)
    }

    /// TTL 置零的副本，用于强制刷新
    pub fn without_cache(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            cache_ttl_hours: 0,
            ..self.clone()
        }
    }
}

impl Config {
    /// 加载配置；文件不存在时返回默认配置
    pub fn load(data_dir: &Path) -> AppResult<Config> {
        let path = config_file(data_dir);
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|e| {
            AppError::config(format!("无法解析配置文件 {}: {}", path.display(), e))
        })
    }

    pub fn save(&self, data_dir: &Path) -> AppResult<()> {
        fs::create_dir_all(data_dir)?;
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::config(format!("无法序列化配置: {e}")))?;
        fs::write(config_file(data_dir), content)?;
        Ok(())
    }
}
