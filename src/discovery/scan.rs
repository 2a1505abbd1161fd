use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::discovery::models::Jdk;
use crate::discovery::runner::Runner;
use crate::error::AppResult;
use crate::infrastructure::paths::expected_java_path;

/// 受管存储来源的名字；该来源的标识符直接取目录名
pub const MANAGED_SOURCE: &str = "jdkman";

/// 遍历一组根目录，收集其中的 JDK；命中后跳过该子树
pub fn scan_locations_for_jdks(
    runner: &dyn Runner,
    locations: &[PathBuf],
    source_name: &str,
) -> AppResult<Vec<Jdk>> {
    let mut jdks = Vec::new();
    for location in locations {
        if !location.is_dir() {
            continue;
        }
        let mut walker = WalkDir::new(location).into_iter();
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                // 个别不可读的目录不影响整体扫描
                Err(_) => continue,
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            if let Some(jdk) = validate_jdk(runner, entry.path(), source_name)? {
                jdks.push(jdk);
                walker.skip_current_dir();
            }
        }
    }
    Ok(jdks)
}

/// 校验一个候选目录是否为 JDK；是则提取元数据并合成标识符
///
/// 元数据优先读 `release` 清单，缺失的字段再退回到执行
/// `java -XshowSettings:properties -version`。
pub fn validate_jdk(
    runner: &dyn Runner,
    dir: &Path,
    source_name: &str,
) -> AppResult<Option<Jdk>> {
    let java_path = expected_java_path(dir, std::env::consts::OS);
    if !java_path.is_file() {
        return Ok(None);
    }
    // JDK home 是 bin 的上一级（macOS 下为 Contents/Home）
    let home = match java_path.parent().and_then(Path::parent) {
        Some(home) => home.to_path_buf(),
        None => return Ok(None),
    };

    let mut manifest = read_release_manifest(&home);
    let mut version = manifest.remove("JAVA_VERSION").unwrap_or_default();
    let mut vendor = manifest.remove("JAVA_VENDOR").unwrap_or_default();
    let mut arch = manifest.remove("OS_ARCH").unwrap_or_default();

    if version.is_empty() || vendor.is_empty() || arch.is_empty() {
        if let Ok(props) = properties_from_java(runner, &java_path) {
            if version.is_empty() {
                version = props.get("java.version").cloned().unwrap_or_default();
            }
            if vendor.is_empty() {
                vendor = props.get("java.vendor").cloned().unwrap_or_default();
            }
            if arch.is_empty() {
                arch = props.get("os.arch").cloned().unwrap_or_default();
            }
        }
    }
    if version.is_empty() {
        return Ok(None);
    }

    let identifier = make_identifier(source_name, dir, &vendor, &version);
    Ok(Some(Jdk {
        path: dir.to_path_buf(),
        version,
        vendor,
        architecture: normalize_architecture(&arch),
        source: source_name.to_string(),
        identifier,
    }))
}

/// 解析 `release` 清单的 `KEY="value"` 行；无法解析的行跳过
fn read_release_manifest(home: &Path) -> HashMap<String, String> {
    let mut manifest = HashMap::new();
    let Ok(content) = fs::read_to_string(home.join("release")) else {
        return manifest;
    };
    for line in content.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        manifest.insert(
            key.trim().to_string(),
            value.trim().trim_matches('"').to_string(),
        );
    }
    manifest
}

fn properties_from_java(
    runner: &dyn Runner,
    java_path: &Path,
) -> std::io::Result<HashMap<String, String>> {
    let output = runner.run(java_path, &["-XshowSettings:properties", "-version"])?;
    Ok(output
        .lines()
        .filter_map(|line| {
            line.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        })
        .collect())
}

/// 架构名归一化：x86_64 与 amd64 统一为 x64
pub fn normalize_architecture(arch: &str) -> String {
    match arch.trim() {
        "x86_64" | "amd64" => "x64".to_string(),
        other => other.to_lowercase(),
    }
}

fn make_identifier(source_name: &str, dir: &Path, vendor: &str, version: &str) -> String {
    if source_name == MANAGED_SOURCE {
        return dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    let major = version
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .unwrap_or("0");
    format!("{}-{}@{}", slugify(vendor), source_name, major)
}

/// 把发行商名压成小写短横线形式，如 "Red Hat, Inc." → "red-hat-inc"
fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
