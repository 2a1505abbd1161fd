use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// 一个已发现的 JDK 安装
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jdk {
    pub path: PathBuf,
    pub version: String,
    pub vendor: String,
    pub architecture: String,
    pub source: String,
    pub identifier: String,
}

/// 发现结果的持久化缓存，`<data-dir>/cache.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cache {
    pub last_updated: Option<DateTime<Utc>>,
    pub jdks: Vec<Jdk>,
}

impl Cache {
    /// 读取缓存文件；文件缺失或内容损坏时返回空缓存
    pub fn load(cache_file: &Path) -> Cache {
        match fs::read_to_string(cache_file) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Cache::default(),
        }
    }

    pub fn save(&self, cache_file: &Path) -> AppResult<()> {
        if let Some(parent) = cache_file.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(cache_file, content)?;
        Ok(())
    }

    /// 缓存有效的条件：时间戳存在且距今严格小于 TTL
    pub fn is_valid(&self, ttl: Duration) -> bool {
        match self.last_updated {
            Some(t) => Utc::now() - t < ttl,
            None => false,
        }
    }

    /// 删除缓存文件，强制下一次重新扫描；文件不存在不算错误
    pub fn delete(cache_file: &Path) -> AppResult<()> {
        match fs::remove_file(cache_file) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_jdk() -> Jdk {
        Jdk {
            path: PathBuf::from("/usr/lib/jvm/temurin-21"),
            version: "21.0.4".to_string(),
            vendor: "Eclipse Adoptium".to_string(),
            architecture: "x64".to_string(),
            source: "system".to_string(),
            identifier: "eclipse-adoptium-system@21".to_string(),
        }
    }

    #[test]
    fn test_cache_round_trip() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("cache.json");
        let cache = Cache {
            last_updated: Some(Utc::now()),
            jdks: vec![sample_jdk()],
        };
        cache.save(&file).unwrap();

        let loaded = Cache::load(&file);
        assert_eq!(loaded.jdks, cache.jdks);
        assert_eq!(loaded.last_updated, cache.last_updated);
    }

    #[test]
    fn test_load_missing_or_corrupt_is_empty() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("cache.json");
        let loaded = Cache::load(&file);
        assert!(loaded.last_updated.is_none());
        assert!(loaded.jdks.is_empty());

        std::fs::write(&file, "not json at all").unwrap();
        let loaded = Cache::load(&file);
        assert!(loaded.last_updated.is_none());
        assert!(loaded.jdks.is_empty());
    }

    #[test]
    fn test_validity_requires_timestamp() {
        let cache = Cache::default();
        assert!(!cache.is_valid(Duration::hours(24)));
    }

    #[test]
    fn test_validity_is_strict_at_ttl_boundary() {
        let ttl = Duration::hours(24);
        // 恰好过期 TTL：严格小于判定下无效
        let expired = Cache {
            last_updated: Some(Utc::now() - ttl),
            jdks: vec![],
        };
        assert!(!expired.is_valid(ttl));

        let fresh = Cache {
            last_updated: Some(Utc::now() - ttl + Duration::seconds(30)),
            jdks: vec![],
        };
        assert!(fresh.is_valid(ttl));
    }

    #[test]
    fn test_zero_ttl_always_invalid() {
        let cache = Cache {
            last_updated: Some(Utc::now()),
            jdks: vec![],
        };
        assert!(!cache.is_valid(Duration::zero()));
    }

    #[test]
    fn test_delete_missing_file_is_ok() {
        let dir = TempDir::new().unwrap();
        assert!(Cache::delete(&dir.path().join("cache.json")).is_ok());
    }
}
