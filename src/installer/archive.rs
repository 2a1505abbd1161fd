use std::collections::HashSet;
use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use xz2::read::XzDecoder;

use crate::error::{AppError, AppResult};
use crate::infrastructure::download::archive_extension;

/// 按扩展名分发到对应的解压器
pub fn extract(archive: &Path, dest: &Path) -> AppResult<()> {
    let name = archive.to_string_lossy();
    match archive_extension(&name) {
        Some(".tar.gz") => extract_tar(GzDecoder::new(fs::File::open(archive)?), dest),
        Some(".tar.xz") => extract_tar(XzDecoder::new(fs::File::open(archive)?), dest),
        Some(".zip") => extract_zip(archive, dest),
        _ => Err(AppError::UnsupportedArchiveType(name.into_owned())),
    }
}

fn extract_tar<R: Read>(reader: R, dest: &Path) -> AppResult<()> {
    let mut archive = tar::Archive::new(reader);
    let mut dirs = DirCache::new();
    let mut root_prefix: Option<String> = None;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let raw_name = entry.path()?.to_string_lossy().replace('\\', "/");
        let Some(stripped) = strip_root_prefix(&mut root_prefix, &raw_name) else {
            continue;
        };
        if stripped.is_empty() {
            continue;
        }
        let target = dest.join(stripped);
        ensure_contained(dest, &target)?;

        let header = entry.header();
        match header.entry_type() {
            tar::EntryType::Directory => {
                dirs.create(&target)?;
            }
            tar::EntryType::Regular => {
                if let Some(parent) = target.parent() {
                    dirs.create(parent)?;
                }
                let mode = header.mode().unwrap_or(0o644);
                let mut out = fs::File::create(&target)?;
                io::copy(&mut entry, &mut out)?;
                set_unix_mode(&target, mode)?;
            }
            tar::EntryType::Symlink => {
                let link = entry
                    .link_name()?
                    .ok_or_else(|| AppError::extract(format!("符号链接 {stripped} 缺少目标")))?;
                create_symlink(dest, &target, &link, &mut dirs)?;
            }
            tar::EntryType::Link => {
                let link = entry
                    .link_name()?
                    .ok_or_else(|| AppError::extract(format!("硬链接 {stripped} 缺少目标")))?;
                let link_name = link.to_string_lossy().replace('\\', "/");
                let Some(link_stripped) = strip_root_prefix(&mut root_prefix, &link_name) else {
                    return Err(AppError::extract(format!(
                        "硬链接 {stripped} 指向顶层前缀之外"
                    )));
                };
                let source = dest.join(link_stripped);
                ensure_contained(dest, &source)?;
                if let Some(parent) = target.parent() {
                    dirs.create(parent)?;
                }
                // 硬链接在归档里总排在目标文件之后，按内容复制落地
                fs::copy(&source, &target)?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn extract_zip(archive: &Path, dest: &Path) -> AppResult<()> {
    let file = fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| AppError::extract(format!("无法打开 zip: {e}")))?;
    let mut dirs = DirCache::new();
    let mut root_prefix: Option<String> = None;

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| AppError::extract(format!("无法读取 zip 条目: {e}")))?;
        let raw_name = entry.name().replace('\\', "/");
        let Some(stripped) = strip_root_prefix(&mut root_prefix, &raw_name) else {
            continue;
        };
        let stripped = stripped.to_string();
        if stripped.is_empty() {
            continue;
        }
        let target = dest.join(&stripped);
        ensure_contained(dest, &target)?;

        let mode = entry.unix_mode();
        if entry.is_dir() {
            dirs.create(&target)?;
        } else if mode.map_or(false, |m| m & 0o170000 == 0o120000) {
            // zip 里的符号链接：内容即链接目标
            let mut link = String::new();
            entry.read_to_string(&mut link)?;
            create_symlink(dest, &target, Path::new(&link), &mut dirs)?;
        } else {
            if let Some(parent) = target.parent() {
                dirs.create(parent)?;
            }
            let mut out = fs::File::create(&target)?;
            io::copy(&mut entry, &mut out)?;
            set_unix_mode(&target, mode.unwrap_or(0o644))?;
        }
    }
    Ok(())
}

/// 去掉压缩包的顶层目录前缀；不在该前缀下的条目跳过
fn strip_root_prefix<'a>(root: &mut Option<String>, name: &'a str) -> Option<&'a str> {
    if root.is_none() {
        let first = name.trim_start_matches('/').split('/').next().unwrap_or("");
        *root = Some(format!("{first}/"));
    }
    let prefix = root.as_deref().unwrap_or("");
    match name.strip_prefix(prefix) {
        Some(rest) => Some(rest.trim_end_matches('/')),
        None => None,
    }
}

/// 解析 `.` 与 `..`，不触碰文件系统
fn lexical_clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !cleaned.pop() && !cleaned.has_root() {
                    cleaned.push("..");
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

/// 拼接结果必须留在目标目录内，否则判定为路径穿越
fn ensure_contained(dest: &Path, target: &Path) -> AppResult<()> {
    let dest = lexical_clean(dest);
    let target_clean = lexical_clean(target);
    if !target_clean.starts_with(&dest) || target_clean == dest {
        return Err(AppError::PathTraversal {
            path: target.to_path_buf(),
        });
    }
    Ok(())
}

fn create_symlink(
    dest: &Path,
    target: &Path,
    link: &Path,
    dirs: &mut DirCache,
) -> AppResult<()> {
    // 链接指向的位置同样不允许越出目标目录
    let resolved = match target.parent() {
        Some(parent) => parent.join(link),
        None => link.to_path_buf(),
    };
    ensure_contained(dest, &resolved)?;
    if let Some(parent) = target.parent() {
        dirs.create(parent)?;
    }
    #[cfg(unix)]
    std::os::unix::fs::symlink(link, target)?;
    #[cfg(windows)]
    std::os::windows::fs::symlink_file(link, target)?;
    Ok(())
}

fn set_unix_mode(path: &Path, mode: u32) -> AppResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mask_mode(mode)))?;
    }
    #[cfg(not(unix))]
    {
        let _ = (path, mode);
    }
    Ok(())
}

/// 丢弃 setuid/setgid 等特殊位，保证属主可读写，保留可执行位
fn mask_mode(mode: u32) -> u32 {
    (mode & 0o777) | 0o600
}

/// 同一次解压内已创建目录的备忘，避免重复 create_dir_all
struct DirCache {
    created: HashSet<PathBuf>,
}

impl DirCache {
    fn new() -> Self {
        Self {
            created: HashSet::new(),
        }
    }

    fn create(&mut self, dir: &Path) -> io::Result<()> {
        if self.created.insert(dir.to_path_buf()) {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
