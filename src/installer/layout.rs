use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::infrastructure::paths::{expected_java_path, java_executable};

/// 把解压结果整理成规范布局：`bin/java` 位于安装目录的规范偏移处
///
/// 规范位置已就绪则不动；否则在目录树里广度优先找一个 JDK home，
/// 先把整棵树改名到 `<dir>~`，再把找到的 home 挪回规范位置，
/// 成功后才删除暂存树。
pub fn normalize_layout(dir: &Path, os: &str) -> AppResult<()> {
    if expected_java_path(dir, os).is_file() {
        return Ok(());
    }

    let java = java_executable(os);
    let Some(java_path) = find_java_home(dir, java)? else {
        return Err(AppError::NotAJavaDistribution {
            path: expected_java_path(dir, os),
        });
    };

    let staged = staging_path(dir);
    fs::rename(dir, &staged)?;

    let relative = java_path
        .strip_prefix(dir)
        .map_err(|_| AppError::config(format!("意外的 java 路径 {}", java_path.display())))?;
    let staged_java = staged.join(relative);
    // home 是 bin 的上一级
    let home = staged_java
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .ok_or_else(|| AppError::NotAJavaDistribution {
            path: expected_java_path(dir, os),
        })?;

    let (source, target) = if os == "macos" {
        if home.file_name().map_or(false, |n| n == "Home") {
            // 压缩包自带 Contents/Home 结构，整个 Contents 挪过去
            match home.parent() {
                Some(contents) => (contents.to_path_buf(), dir.join("Contents")),
                None => (home, dir.join("Contents").join("Home")),
            }
        } else {
            (home, dir.join("Contents").join("Home"))
        }
    } else {
        (home, dir.to_path_buf())
    };

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(&source, &target)?;
    // home 就是暂存树根时（扁平压缩包），上面的 rename 已把它整个挪走
    match fs::remove_dir_all(&staged) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    assert_java_distribution(dir, os)
}

/// 安装目录必须在规范位置上有 java 可执行文件
pub fn assert_java_distribution(dir: &Path, os: &str) -> AppResult<()> {
    let java_path = expected_java_path(dir, os);
    if java_path.is_file() {
        Ok(())
    } else {
        Err(AppError::NotAJavaDistribution { path: java_path })
    }
}

fn staging_path(dir: &Path) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.with_file_name(format!("{name}~"))
}

/// 广度优先找第一个 `*/bin/java`，返回 java 的完整路径
fn find_java_home(root: &Path, java: &str) -> AppResult<Option<PathBuf>> {
    let mut queue = VecDeque::from([root.to_path_buf()]);
    while let Some(current) = queue.pop_front() {
        let candidate = current.join("bin").join(java);
        if candidate.is_file() {
            return Ok(Some(candidate));
        }
        for entry in fs::read_dir(&current)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                queue.push_back(entry.path());
            }
        }
    }
    Ok(None)
}
