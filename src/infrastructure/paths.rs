use std::env;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// 数据目录的环境变量覆盖
pub const HOME_ENV: &str = "JDKMAN_HOME";

/// 每个项目的版本文件
pub const PROJECT_VERSION_FILE: &str = ".java-version";

/// 解析数据目录：`$JDKMAN_HOME` 优先，否则 `~/.jdkman`
pub fn resolve_data_dir() -> AppResult<PathBuf> {
    if let Ok(home) = env::var(HOME_ENV) {
        if !home.is_empty() {
            return Ok(PathBuf::from(home));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".jdkman"))
        .ok_or_else(|| AppError::config("无法确定用户主目录"))
}

/// 受管 JDK 存储目录
pub fn store_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("jdk")
}

/// 发现结果的缓存文件
pub fn cache_file(data_dir: &Path) -> PathBuf {
    data_dir.join("cache.json")
}

/// 用户配置文件
pub fn config_file(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

/// java 可执行文件名
pub fn java_executable(os: &str) -> &'static str {
    if os == "windows" {
        "java.exe"
    } else {
        "java"
    }
}

/// 规范位置上的 java 可执行文件；macOS 的 JDK home 在 Contents/Home 下
pub fn expected_java_path(dir: &Path, os: &str) -> PathBuf {
    let mut path = dir.to_path_buf();
    if os == "macos" {
        path = path.join("Contents").join("Home");
    }
    path.join("bin").join(java_executable(os))
}

/// 由安装目录得到 JAVA_HOME
pub fn java_home(dir: &Path, os: &str) -> PathBuf {
    if os == "macos" {
        dir.join("Contents").join("Home")
    } else {
        dir.to_path_buf()
    }
}

/// 读取当前目录的 `.java-version`，为空或缺失时返回 None
pub fn read_project_version() -> Option<String> {
    let content = std::fs::read_to_string(PROJECT_VERSION_FILE).ok()?;
    let selector = content.trim();
    if selector.is_empty() {
        None
    } else {
        Some(selector.to_string())
    }
}
