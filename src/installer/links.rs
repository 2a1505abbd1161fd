use std::fs;
use std::path::{Path, PathBuf};

use crate::discovery::models::{Cache, Jdk};
use crate::error::{AppError, AppResult};
use crate::infrastructure::paths::{cache_file, store_dir};
use crate::installer::layout::assert_java_distribution;
use crate::semver::{Range, Version, VersionPart, VersionSliceExt};

/// 外部 JDK 链接的限定符前缀
pub const SYSTEM_PREFIX: &str = "system@";

/// 在一组 JDK 中找选择器匹配的最高版本
///
/// 版本优先按标识符解析（受管存储的标识符带限定符），
/// 解析不了再退回到版本字段；都解析不了的记录跳过。
pub fn find_best_match_jdk<'a>(jdks: &'a [Jdk], selector: &str) -> AppResult<&'a Jdk> {
    let range = Range::parse(selector)?;
    let mut best: Option<(&Jdk, Version)> = None;
    for jdk in jdks {
        let version = Version::parse(&jdk.identifier)
            .or_else(|_| Version::parse(&jdk.version));
        let Ok(version) = version else {
            continue;
        };
        if !range.contains(&version) {
            continue;
        }
        let better = best
            .as_ref()
            .map_or(true, |(_, current)| version > *current);
        if better {
            best = Some((jdk, version));
        }
    }
    best.map(|(jdk, _)| jdk)
        .ok_or_else(|| AppError::not_installed(range.to_string()))
}

fn alias_file(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join(format!("{name}.alias"))
}

/// 读取别名的值；别名不存在时返回 None
pub fn get_alias(data_dir: &Path, name: &str) -> AppResult<Option<String>> {
    match fs::read_to_string(alias_file(data_dir, name)) {
        Ok(content) => {
            let value = content.trim().to_string();
            Ok(if value.is_empty() { None } else { Some(value) })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn set_alias(data_dir: &Path, name: &str, value: &str) -> AppResult<()> {
    fs::create_dir_all(data_dir)?;
    fs::write(alias_file(data_dir, name), format!("{value}\n"))?;
    Ok(())
}

pub fn unset_alias(data_dir: &Path, name: &str) -> AppResult<()> {
    match fs::remove_file(alias_file(data_dir, name)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn symlink_dir(original: &Path, link: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    return std::os::unix::fs::symlink(original, link);
    #[cfg(windows)]
    return std::os::windows::fs::symlink_dir(original, link);
}

fn remove_link(link: &Path) -> AppResult<()> {
    match fs::remove_file(link) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// 把外部 JDK 以 `system@<version>` 的名字链接进受管存储
pub fn link(data_dir: &Path, name: &str, target: &Path) -> AppResult<()> {
    if !name.starts_with(SYSTEM_PREFIX) {
        return Err(AppError::config(format!(
            "链接名必须以 {SYSTEM_PREFIX} 开头: {name}"
        )));
    }
    Version::parse(name)?;
    assert_java_distribution(target, std::env::consts::OS)?;

    let store = store_dir(data_dir);
    fs::create_dir_all(&store)?;
    let link_path = store.join(name);
    remove_link(&link_path)?;
    symlink_dir(target, &link_path)?;
    Cache::delete(&cache_file(data_dir))?;
    Ok(())
}

pub fn unlink(data_dir: &Path, name: &str) -> AppResult<()> {
    if !name.starts_with(SYSTEM_PREFIX) {
        return Err(AppError::config(format!(
            "链接名必须以 {SYSTEM_PREFIX} 开头: {name}"
        )));
    }
    remove_link(&store_dir(data_dir).join(name))?;
    Cache::delete(&cache_file(data_dir))?;
    Ok(())
}

/// 维护受管存储里的快捷链接
///
/// - 目标已不存在的 `major.minor` 快捷链接删掉
/// - 每条 minor 线的最新正式版本重建 `major.minor` 链接
/// - `default` 别名有值时刷新对应的 `default` 链接
pub fn link_latest(data_dir: &Path, jdks: &[Jdk]) -> AppResult<()> {
    let store = store_dir(data_dir);
    if !store.is_dir() {
        return Ok(());
    }

    let mut versions = Vec::new();
    for jdk in jdks {
        if let Ok(version) =
            Version::parse(&jdk.identifier).or_else(|_| Version::parse(&jdk.version))
        {
            versions.push(version);
        }
    }

    // 清理失效的快捷链接：形如 major.minor 的符号链接，目标不再匹配任何版本
    for entry in fs::read_dir(&store)? {
        let entry = entry?;
        if !entry.file_type()?.is_symlink() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(SYSTEM_PREFIX) || name == "default" {
            continue;
        }
        if Version::parse(&name).is_err() {
            continue;
        }
        let still_resolves = versions
            .iter()
            .any(|v| Range::parse(&name).map_or(false, |r| r.contains(v)));
        if !still_resolves {
            remove_link(&entry.path())?;
        }
    }

    // 每条 minor 线的最新版本指一条 major.minor 链接
    for latest in versions.trim_to(VersionPart::Minor) {
        if latest.is_prerelease() || latest.qualifier().starts_with("system") {
            continue;
        }
        let link_name = latest.trim_to(VersionPart::Minor);
        let link_path = store.join(&link_name);
        let target = store.join(latest.to_string());
        if !target.exists() {
            continue;
        }
        if fs::read_link(&link_path).map_or(false, |t| t == target) {
            continue;
        }
        remove_link(&link_path)?;
        symlink_dir(&target, &link_path)?;
    }

    refresh_default_link(data_dir, jdks)?;
    Cache::delete(&cache_file(data_dir))?;
    Ok(())
}

/// `default` 别名对应存储里的 `default` 链接
fn refresh_default_link(data_dir: &Path, jdks: &[Jdk]) -> AppResult<()> {
    let store = store_dir(data_dir);
    let link_path = store.join("default");
    let Some(selector) = get_alias(data_dir, "default")? else {
        remove_link(&link_path)?;
        return Ok(());
    };
    let Ok(jdk) = find_best_match_jdk(jdks, &selector) else {
        remove_link(&link_path)?;
        return Ok(());
    };
    let target = store.join(&jdk.identifier);
    if !target.exists() {
        remove_link(&link_path)?;
        return Ok(());
    }
    if fs::read_link(&link_path).map_or(false, |t| t == target) {
        return Ok(());
    }
    remove_link(&link_path)?;
    symlink_dir(&target, &link_path)?;
    Ok(())
}
