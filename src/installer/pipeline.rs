use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::discovery::models::{Cache, Jdk};
use crate::error::{AppError, AppResult};
use crate::infrastructure::config::Config;
use crate::infrastructure::disco::client::host_platform;
use crate::infrastructure::disco::models::Package;
use crate::infrastructure::disco::DiscoClient;
use crate::infrastructure::download::{download, verify_checksum};
use crate::infrastructure::paths::{cache_file, store_dir};
use crate::installer::archive;
use crate::installer::layout;
use crate::semver::{Range, Version};

/// 远程包索引：版本到包的映射加降序排列的版本列表
pub struct PackageIndex {
    by_version: HashMap<Version, Package>,
    sorted: Vec<Version>,
}

impl PackageIndex {
    /// 从包列表构建索引；`java_version` 的 `+build` 后缀剥掉，
    /// 解析不了的条目跳过
    pub fn build(packages: Vec<Package>) -> PackageIndex {
        let mut by_version = HashMap::new();
        let mut sorted = Vec::new();
        for package in packages {
            let core = strip_build_suffix(&package.java_version);
            let raw = format!("{}@{}", package.distribution, core);
            if let Ok(version) = Version::parse(&raw) {
                if !by_version.contains_key(&version) {
                    sorted.push(version.clone());
                    by_version.insert(version, package);
                }
            }
        }
        sorted.sort();
        sorted.reverse();
        PackageIndex { by_version, sorted }
    }

    /// 降序排列的全部版本
    pub fn versions(&self) -> &[Version] {
        &self.sorted
    }

    pub fn package_for(&self, version: &Version) -> Option<&Package> {
        self.by_version.get(version)
    }

    /// 范围内最高的版本
    pub fn best_match(&self, range: &Range) -> Option<&Version> {
        self.sorted.iter().find(|v| range.contains(v))
    }

    pub fn available(&self) -> Vec<String> {
        self.sorted.iter().map(|v| v.to_string()).collect()
    }
}

fn strip_build_suffix(java_version: &str) -> &str {
    java_version.split('+').next().unwrap_or(java_version)
}

/// 拉取远程包列表并建立索引
pub async fn make_package_index(
    client: &DiscoClient,
    os: &str,
    arch: &str,
    distribution: &str,
) -> AppResult<PackageIndex> {
    let packages = client.get_packages(os, arch, distribution).await?;
    Ok(PackageIndex::build(packages))
}

/// 一次成功安装的结果
pub struct InstallOutcome {
    pub version: Version,
    pub destination: PathBuf,
}

/// 解析选择器、下载、校验、解压并整理布局
///
/// 已安装（发现快照中的版本或标识符等于解析结果）时返回 `Ok(None)`。
/// 解压或整理失败时安装目录会被整个删除。
pub async fn install(
    data_dir: &Path,
    config: &Config,
    client: &DiscoClient,
    jdks: &[Jdk],
    selector: &str,
    custom_dest: Option<&Path>,
) -> AppResult<Option<InstallOutcome>> {
    let range = Range::parse(selector)?;
    let distribution = range
        .qualifier()
        .unwrap_or(&config.default_distribution)
        .to_string();
    let (os, arch) = host_platform();

    let index = make_package_index(client, &os, &arch, &distribution).await?;
    let version = index
        .best_match(&range)
        .ok_or_else(|| AppError::NoCompatibleVersion {
            selector: selector.to_string(),
            available: index.available(),
        })?
        .clone();

    if custom_dest.is_none() && already_installed(jdks, &version) {
        return Ok(None);
    }

    let package = index
        .package_for(&version)
        .ok_or_else(|| AppError::network(format!("索引里找不到 {version} 对应的包")))?;
    let info = client.get_package_info(&package.id).await?;

    let destination = match custom_dest {
        Some(dest) => dest.to_path_buf(),
        None => store_dir(data_dir).join(version.to_string()),
    };
    if destination.exists() {
        return Err(AppError::config(format!(
            "目标目录已存在: {}",
            destination.display()
        )));
    }

    // file:// 指向本地文件，跳过下载且不删除源文件
    let (archive_file, remove_when_done) = match local_file_path(&info.direct_download_uri) {
        Some(path) => (path, false),
        None => (download(&info.direct_download_uri).await?, true),
    };

    if info.checksum.is_empty() || info.checksum_type.is_empty() {
        println!("⚠️ 该包没有提供校验和，跳过校验");
    } else if let Err(e) = verify_checksum(&archive_file, &info.checksum, &info.checksum_type) {
        if remove_when_done {
            let _ = fs::remove_file(&archive_file);
        }
        return Err(e);
    }

    install_archive(&archive_file, &destination)?;
    if remove_when_done {
        let _ = fs::remove_file(&archive_file);
    }

    Cache::delete(&cache_file(data_dir))?;
    Ok(Some(InstallOutcome {
        version,
        destination,
    }))
}

fn already_installed(jdks: &[Jdk], version: &Version) -> bool {
    jdks.iter().any(|jdk| {
        let by_version = Version::parse(&jdk.version).map_or(false, |v| v == *version);
        let by_identifier = Version::parse(&jdk.identifier).map_or(false, |v| v == *version);
        by_version || by_identifier
    })
}

fn local_file_path(uri: &str) -> Option<PathBuf> {
    if !uri.starts_with("file://") {
        return None;
    }
    url::Url::parse(uri).ok()?.to_file_path().ok()
}

/// 解压并整理；任何一步失败都把目标目录连根删掉
pub fn install_archive(archive_file: &Path, destination: &Path) -> AppResult<()> {
    let os = std::env::consts::OS;
    if !matches!(os, "linux" | "macos" | "windows") {
        return Err(AppError::UnsupportedOs(os.to_string()));
    }
    let result = archive::extract(archive_file, destination)
        .and_then(|_| layout::normalize_layout(destination, os));
    if result.is_err() {
        let _ = fs::remove_dir_all(destination);
    }
    result
}

/// 受管存储里的版本，降序
pub fn ls_store(data_dir: &Path) -> AppResult<Vec<Version>> {
    let store = store_dir(data_dir);
    if !store.is_dir() {
        return Ok(Vec::new());
    }
    let mut versions = Vec::new();
    for entry in fs::read_dir(&store)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Ok(version) = Version::parse(&name) {
            versions.push(version);
        }
    }
    versions.sort();
    versions.reverse();
    Ok(versions)
}

/// 删除选择器匹配到的最高版本，并使发现缓存失效
pub fn uninstall(data_dir: &Path, selector: &str) -> AppResult<Version> {
    let range = Range::parse(selector)?;
    let versions = ls_store(data_dir)?;
    let version = versions
        .into_iter()
        .find(|v| range.contains(v))
        .ok_or_else(|| AppError::not_installed(range.to_string()))?;
    fs::remove_dir_all(store_dir(data_dir).join(version.to_string()))?;
    Cache::delete(&cache_file(data_dir))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(distribution: &str, java_version: &str) -> Package {
        serde_json::from_str(&format!(
            r#"{{
                "id": "{distribution}-{java_version}",
                "distribution": "{distribution}",
                "java_version": "{java_version}",
                "distribution_version": "{java_version}"
            }}"#
        ))
        .unwrap()
    }

    fn jdk(version: &str, identifier: &str) -> Jdk {
        Jdk {
            path: PathBuf::from(format!("/store/{identifier}")),
            version: version.to_string(),
            vendor: "Eclipse Adoptium".to_string(),
            architecture: "x64".to_string(),
            source: "jdkman".to_string(),
            identifier: identifier.to_string(),
        }
    }

    #[test]
    fn test_index_strips_build_suffix_and_sorts_descending() {
        let index = PackageIndex::build(vec![
            package("temurin", "17.0.9+9"),
            package("temurin", "21.0.4+7"),
            package("temurin", "11.0.21+9"),
        ]);
        let versions = index.available();
        assert_eq!(
            versions,
            vec!["temurin@21.0.4", "temurin@17.0.9", "temurin@11.0.21"]
        );
    }

    #[test]
    fn test_best_match_tilde_picks_highest_in_line() {
        // 可用 1.8.72、1.8.73、1.9.0 时，~1.8.73 解析为 1.8.73
        let index = PackageIndex::build(vec![
            package("temurin", "1.8.72"),
            package("temurin", "1.8.73"),
            package("temurin", "1.9.0"),
        ]);
        let range = Range::parse("~1.8.73").unwrap();
        let best = index.best_match(&range).unwrap();
        assert_eq!(best.to_string(), "temurin@1.8.73");
    }

    #[test]
    fn test_best_match_none_lists_available() {
        let index = PackageIndex::build(vec![
            package("temurin", "17.0.9"),
            package("temurin", "21.0.4"),
        ]);
        let range = Range::parse("25").unwrap();
        assert!(index.best_match(&range).is_none());
        assert_eq!(
            index.available(),
            vec!["temurin@21.0.4", "temurin@17.0.9"]
        );
    }

    #[test]
    fn test_already_installed_matches_version_or_identifier() {
        let resolved = Version::parse("temurin@21.0.4").unwrap();
        assert!(already_installed(
            &[jdk("21.0.4", "temurin@21.0.4")],
            &resolved
        ));
        assert!(already_installed(
            &[jdk("temurin@21.0.4", "x")],
            &resolved
        ));
        assert!(!already_installed(
            &[jdk("21.0.4", "eclipse-adoptium-system@21")],
            &resolved
        ));
    }

    #[test]
    fn test_local_file_path() {
        assert_eq!(
            local_file_path("file:///tmp/jdk.tar.gz"),
            Some(PathBuf::from("/tmp/jdk.tar.gz"))
        );
        assert_eq!(local_file_path("https://host/jdk.tar.gz"), None);
    }

    #[test]
    fn test_ls_store_and_uninstall() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = store_dir(dir.path());
        fs::create_dir_all(store.join("temurin@21.0.4")).unwrap();
        fs::create_dir_all(store.join("temurin@17.0.9")).unwrap();
        fs::create_dir_all(store.join("not a version")).unwrap();

        let versions = ls_store(dir.path()).unwrap();
        let raws: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
        assert_eq!(raws, vec!["temurin@21.0.4", "temurin@17.0.9"]);

        let removed = uninstall(dir.path(), "temurin@17").unwrap();
        assert_eq!(removed.to_string(), "temurin@17.0.9");
        assert!(!store.join("temurin@17.0.9").exists());
        assert!(store.join("temurin@21.0.4").exists());

        let err = uninstall(dir.path(), "temurin@11").unwrap_err();
        assert!(matches!(err, AppError::NotInstalled { .. }));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_install_archive_cleans_up_on_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        // 合法的 tar.gz，但里面没有 bin/java，布局整理会失败
        let mut builder = tar::Builder::new(flate2::write::GzEncoder::new(
            Vec::new(),
            flate2::Compression::default(),
        ));
        let mut header = tar::Header::new_gnu();
        header.set_size(5);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "jdk/readme.txt", &b"hello"[..])
            .unwrap();
        let bytes = builder.into_inner().unwrap().finish().unwrap();
        let archive_file = dir.path().join("jdk.tar.gz");
        fs::write(&archive_file, bytes).unwrap();

        let destination = dir.path().join("out");
        let err = install_archive(&archive_file, &destination).unwrap_err();
        assert!(matches!(err, AppError::NotAJavaDistribution { .. }));
        assert!(!destination.exists());
    }
}
