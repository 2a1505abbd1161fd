use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::discovery::models::{Cache, Jdk};
use crate::discovery::sources::{
    gradle_source, intellij_source, jabba_source, managed_source, system_source, DiscoverySource,
};
use crate::error::{AppError, AppResult};
use crate::infrastructure::config::DiscoveryConfig;

/// 发现流程的编排者：缓存快路径、固定顺序扫描、去重、持久化
///
/// 对缓存文件与存储目录不加锁，并发调用可能互相覆盖缓存；
/// 覆盖结果仍是某一次完整扫描的产物，可接受。
pub struct Manager {
    cache_file: PathBuf,
    config: DiscoveryConfig,
    sources: Vec<Box<dyn DiscoverySource>>,
}

impl Manager {
    pub fn new(cache_file: PathBuf, config: DiscoveryConfig) -> Self {
        Self {
            cache_file,
            config,
            sources: Vec::new(),
        }
    }

    /// 注册全部内建来源；顺序固定，同一路径以先注册的来源为准
    pub fn with_all_sources(data_dir: &Path, cache_file: PathBuf, config: DiscoveryConfig) -> Self {
        let mut manager = Self::new(cache_file, config);
        manager.register_source(Box::new(system_source()));
        manager.register_source(Box::new(jabba_source()));
        manager.register_source(Box::new(gradle_source()));
        manager.register_source(Box::new(intellij_source()));
        manager.register_source(Box::new(managed_source(data_dir)));
        manager
    }

    pub fn register_source(&mut self, source: Box<dyn DiscoverySource>) {
        self.sources.push(source);
    }

    /// 返回全部已知 JDK：缓存有效直接用缓存，否则扫描并刷新缓存
    ///
    /// 任一来源失败即中止整轮扫描，原缓存文件保持不变。
    pub fn discover_all(&self) -> AppResult<Vec<Jdk>> {
        if !self.config.enabled {
            return Ok(Vec::new());
        }

        let cache = Cache::load(&self.cache_file);
        if cache.is_valid(self.config.cache_ttl()) {
            return Ok(cache.jdks);
        }

        let mut all = Vec::new();
        for source in &self.sources {
            if !self.config.is_source_enabled(source.name()) {
                continue;
            }
            let jdks = source.discover().map_err(|e| {
                AppError::discovery(source.name(), e.to_string())
            })?;
            all.extend(jdks);
        }

        let unique = deduplicate_jdks(all);
        let cache = Cache {
            last_updated: Some(Utc::now()),
            jdks: unique.clone(),
        };
        cache.save(&self.cache_file)?;
        Ok(unique)
    }
}

/// 按路径去重，保留首次出现的记录
pub fn deduplicate_jdks(jdks: Vec<Jdk>) -> Vec<Jdk> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    jdks.into_iter()
        .filter(|jdk| seen.insert(jdk.path.clone()))
        .collect()
}
