use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, AppResult};

const USER_AGENT: &str = concat!("jdkman/", env!("CARGO_PKG_VERSION"));
const MAX_REDIRECTS: usize = 10;

/// 下载到临时文件并返回其路径；临时文件保留原始扩展名，
/// 后续按扩展名选择解压器
///
/// 只接受 HTTPS 地址，重定向目标同样必须是 HTTPS。
pub async fn download(url: &str) -> AppResult<PathBuf> {
    // 重定向手工跟随，逐跳检查 scheme
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| AppError::network(format!("无法创建 HTTP 客户端: {e}")))?;

    let mut current = url.to_string();
    let mut response = None;
    for _ in 0..MAX_REDIRECTS {
        if !current.starts_with("https://") {
            return Err(AppError::InsecureUrl(current));
        }
        let resp = client
            .get(&current)
            .send()
            .await
            .map_err(|e| AppError::network(format!("请求 {current} 失败: {e}")))?;
        if resp.status().is_redirection() {
            let location = resp
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    AppError::network(format!("{current} 返回了没有 Location 的重定向"))
                })?;
            let base = url::Url::parse(&current)
                .map_err(|e| AppError::network(format!("无效的下载地址 {current}: {e}")))?;
            current = base
                .join(location)
                .map_err(|e| AppError::network(format!("无效的重定向目标 {location}: {e}")))?
                .to_string();
            continue;
        }
        if !resp.status().is_success() {
            return Err(AppError::network(format!(
                "{} 返回 HTTP {}",
                current,
                resp.status()
            )));
        }
        response = Some(resp);
        break;
    }
    let response =
        response.ok_or_else(|| AppError::network(format!("{url} 重定向次数过多")))?;

    let total_size = response.content_length().unwrap_or(0);
    let progress = create_progress_bar(total_size);

    let suffix = archive_extension(&current).unwrap_or("");
    let temp = tempfile::Builder::new()
        .prefix("jdkman-")
        .suffix(suffix)
        .tempfile()?;
    let temp_path = temp
        .into_temp_path()
        .keep()
        .map_err(|e| AppError::config(format!("无法保留临时文件: {e}")))?;

    let mut file = tokio::fs::File::create(&temp_path).await?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| AppError::network(format!("下载 {current} 中断: {e}")))?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
        progress.set_position(downloaded);
    }
    file.flush().await?;
    progress.finish_with_message("下载完成");

    Ok(temp_path)
}

fn create_progress_bar(total_size: u64) -> ProgressBar {
    let progress = ProgressBar::new(total_size);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    progress
}

/// 识别支持的压缩包扩展名
pub fn archive_extension(name: &str) -> Option<&'static str> {
    // URL 带查询串时按路径部分判断
    let path = name.split(['?', '#']).next().unwrap_or(name);
    if path.ends_with(".tar.gz") || path.ends_with(".tgz") {
        Some(".tar.gz")
    } else if path.ends_with(".tar.xz") {
        Some(".tar.xz")
    } else if path.ends_with(".zip") {
        Some(".zip")
    } else {
        None
    }
}

/// 校验文件摘要；算法名与期望值都不区分大小写
pub fn verify_checksum(path: &Path, expected: &str, algo: &str) -> AppResult<()> {
    let algo = algo.trim().to_lowercase();
    let expected = expected.trim().to_lowercase();
    let actual = match algo.as_str() {
        "sha256" => hash_file::<Sha256>(path)?,
        "sha1" => hash_file::<Sha1>(path)?,
        other => return Err(AppError::UnsupportedChecksumAlgorithm(other.to_string())),
    };
    if actual != expected {
        return Err(AppError::ChecksumMismatch {
            algo,
            expected,
            actual,
        });
    }
    Ok(())
}

fn hash_file<D: Digest>(path: &Path) -> AppResult<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = D::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_download_rejects_plain_http() {
        let err = download("http://example.com/jdk.tar.gz").await.unwrap_err();
        match err {
            AppError::InsecureUrl(url) => assert_eq!(url, "http://example.com/jdk.tar.gz"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_archive_extension() {
        assert_eq!(archive_extension("jdk-21.tar.gz"), Some(".tar.gz"));
        assert_eq!(archive_extension("jdk-21.tgz"), Some(".tar.gz"));
        assert_eq!(archive_extension("jdk-21.tar.xz"), Some(".tar.xz"));
        assert_eq!(archive_extension("jdk-21.zip"), Some(".zip"));
        assert_eq!(
            archive_extension("https://host/jdk.tar.gz?token=abc"),
            Some(".tar.gz")
        );
        assert_eq!(archive_extension("jdk-21.msi"), None);
    }

    #[test]
    fn test_verify_checksum_sha256() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("data.bin");
        std::fs::write(&file, b"hello world").unwrap();
        // echo -n "hello world" | sha256sum
        let expected = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
        assert!(verify_checksum(&file, expected, "sha256").is_ok());
        // 大小写不敏感
        assert!(verify_checksum(&file, &expected.to_uppercase(), "SHA256").is_ok());
    }

    #[test]
    fn test_verify_checksum_sha1() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("data.bin");
        std::fs::write(&file, b"hello world").unwrap();
        // echo -n "hello world" | sha1sum
        let expected = "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed";
        assert!(verify_checksum(&file, expected, "sha1").is_ok());
    }

    #[test]
    fn test_verify_checksum_mismatch_reports_both_digests() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("data.bin");
        std::fs::write(&file, b"hello world").unwrap();
        let err = verify_checksum(&file, "deadbeef", "sha256").unwrap_err();
        match err {
            AppError::ChecksumMismatch {
                algo,
                expected,
                actual,
            } => {
                assert_eq!(algo, "sha256");
                assert_eq!(expected, "deadbeef");
                assert_eq!(
                    actual,
                    "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_verify_checksum_unknown_algorithm() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("data.bin");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            verify_checksum(&file, "00", "md5"),
            Err(AppError::UnsupportedChecksumAlgorithm(_))
        ));
    }
}
