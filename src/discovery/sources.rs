use std::env;
use std::path::{Path, PathBuf};

use crate::discovery::models::Jdk;
use crate::discovery::runner::{ExecRunner, Runner};
use crate::discovery::scan::{scan_locations_for_jdks, MANAGED_SOURCE};
use crate::error::AppResult;
use crate::infrastructure::paths::store_dir;

/// 一个 JDK 来源：给出名字，产出发现到的 JDK 列表
pub trait DiscoverySource {
    fn name(&self) -> &str;
    fn discover(&self) -> AppResult<Vec<Jdk>>;
}

/// 扫描固定根目录列表的通用来源实现
pub struct LocationSource {
    name: String,
    locations: Vec<PathBuf>,
    runner: Box<dyn Runner>,
}

impl LocationSource {
    pub fn new(name: &str, locations: Vec<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            locations,
            runner: Box::new(ExecRunner),
        }
    }

    #[cfg(test)]
    pub fn with_runner(name: &str, locations: Vec<PathBuf>, runner: Box<dyn Runner>) -> Self {
        Self {
            name: name.to_string(),
            locations,
            runner,
        }
    }
}

impl DiscoverySource for LocationSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn discover(&self) -> AppResult<Vec<Jdk>> {
        scan_locations_for_jdks(self.runner.as_ref(), &self.locations, &self.name)
    }
}

/// 操作系统常见的 JDK 安装位置
pub fn system_source() -> LocationSource {
    let locations = match env::consts::OS {
        "linux" => vec![
            PathBuf::from("/usr/lib/jvm"),
            PathBuf::from("/usr/java"),
            PathBuf::from("/opt/java"),
        ],
        "macos" => vec![PathBuf::from("/Library/Java/JavaVirtualMachines")],
        "windows" => {
            let mut locations = Vec::new();
            for var in ["ProgramFiles", "ProgramFiles(x86)"] {
                if let Ok(dir) = env::var(var) {
                    locations.push(PathBuf::from(dir).join("Java"));
                }
            }
            locations
        }
        _ => Vec::new(),
    };
    LocationSource::new("system", locations)
}

/// Gradle 的 toolchain 存储：`$GRADLE_USER_HOME/jdks` 或 `~/.gradle/jdks`
pub fn gradle_source() -> LocationSource {
    let root = env::var("GRADLE_USER_HOME")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join(".gradle")));
    LocationSource::new("gradle", root.map(|r| r.join("jdks")).into_iter().collect())
}

/// IntelliJ IDEA 下载的 JDK：`~/.jdks`（macOS 上在用户的系统 bundle 目录）
pub fn intellij_source() -> LocationSource {
    let root = dirs::home_dir().map(|home| {
        if env::consts::OS == "macos" {
            home.join("Library/Java/JavaVirtualMachines")
        } else {
            home.join(".jdks")
        }
    });
    LocationSource::new("intellij", root.into_iter().collect())
}

/// jabba 遗留存储：`~/.jabba/jdk`
pub fn jabba_source() -> LocationSource {
    let root = dirs::home_dir().map(|h| h.join(".jabba").join("jdk"));
    LocationSource::new("jabba", root.into_iter().collect())
}

/// 本工具自己的受管存储：`<data-dir>/jdk`
pub fn managed_source(data_dir: &Path) -> LocationSource {
    LocationSource::new(MANAGED_SOURCE, vec![store_dir(data_dir)])
}
