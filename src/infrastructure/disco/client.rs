use std::env;
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::infrastructure::disco::models::{
    Distribution, DistributionsResponse, Package, PackageInfo, PackageInfoResponse,
    PackagesResponse,
};

/// foojay disco API 的默认地址
pub const DEFAULT_API_URL: &str = "https://api.foojay.io/disco/v3.0";

/// 覆盖 API 地址的环境变量（测试与镜像场景）
pub const API_URL_ENV: &str = "JDKMAN_DISCO_API";

const USER_AGENT: &str = concat!("jdkman/", env!("CARGO_PKG_VERSION"));

/// disco API 客户端：包列表查询与单包下载信息
pub struct DiscoClient {
    base_url: String,
    client: reqwest::Client,
}

impl DiscoClient {
    pub fn new() -> AppResult<Self> {
        let base_url = env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::with_base_url(&base_url)
    }

    pub fn with_base_url(base_url: &str) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::network(format!("无法创建 HTTP 客户端: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// 查询可安装的 JDK 包（GA 版本）
    pub async fn get_packages(
        &self,
        os: &str,
        arch: &str,
        distribution: &str,
    ) -> AppResult<Vec<Package>> {
        let url = format!("{}/packages", self.base_url);
        let query = package_query(os, arch, distribution);
        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::network(format!("请求 {url} 失败: {e}")))?;
        let response = check_status(response)?;
        let body: PackagesResponse = response
            .json()
            .await
            .map_err(|e| AppError::network(format!("无法解析 {url} 的响应: {e}")))?;
        Ok(body.packages)
    }

    /// 查询单个包的下载地址与校验和
    pub async fn get_package_info(&self, id: &str) -> AppResult<PackageInfo> {
        let url = format!("{}/ids/{}", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::network(format!("请求 {url} 失败: {e}")))?;
        let response = check_status(response)?;
        let body: PackageInfoResponse = response
            .json()
            .await
            .map_err(|e| AppError::network(format!("无法解析 {url} 的响应: {e}")))?;
        body.result
            .into_iter()
            .next()
            .ok_or_else(|| AppError::network(format!("包 {id} 没有下载信息")))
    }

    /// 列出 API 支持的全部发行版，按 api_parameter 升序
    pub async fn get_distributions(&self) -> AppResult<Vec<Distribution>> {
        let url = format!("{}/distributions", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("include_versions", "false")])
            .send()
            .await
            .map_err(|e| AppError::network(format!("请求 {url} 失败: {e}")))?;
        let response = check_status(response)?;
        let body: DistributionsResponse = response
            .json()
            .await
            .map_err(|e| AppError::network(format!("无法解析 {url} 的响应: {e}")))?;
        let mut distributions = body.distributions;
        distributions.sort_by(|a, b| a.api_parameter.cmp(&b.api_parameter));
        Ok(distributions)
    }
}

fn check_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::network(format!(
            "{} 返回 HTTP {}",
            response.url(),
            status
        )));
    }
    Ok(response)
}

/// 包列表查询参数；Windows 用 zip/c_std_lib，其余平台 tar.gz/glibc
fn package_query(os: &str, arch: &str, distribution: &str) -> Vec<(&'static str, String)> {
    let (archive_type, lib_c_type) = if os == "windows" {
        ("zip", "c_std_lib")
    } else {
        ("tar.gz", "glibc")
    };
    let mut query = vec![
        ("operating_system", os.to_string()),
        ("architecture", normalize_api_arch(arch)),
        ("archive_type", archive_type.to_string()),
        ("lib_c_type", lib_c_type.to_string()),
        ("package_type", "jdk".to_string()),
        ("release_status", "ga".to_string()),
        ("directly_downloadable", "true".to_string()),
    ];
    if !distribution.is_empty() {
        query.push(("distribution", distribution.to_string()));
    }
    query
}

fn normalize_api_arch(arch: &str) -> String {
    match arch {
        "x86_64" | "amd64" => "x64".to_string(),
        other => other.to_string(),
    }
}

/// 当前主机的 (os, arch)，已映射为 API 的取值
pub fn host_platform() -> (String, String) {
    (
        env::consts::OS.to_string(),
        normalize_api_arch(env::consts::ARCH),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_of<'a>(query: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_linux_query_uses_tar_gz() {
        let query = package_query("linux", "x86_64", "temurin");
        assert_eq!(value_of(&query, "operating_system"), Some("linux"));
        assert_eq!(value_of(&query, "architecture"), Some("x64"));
        assert_eq!(value_of(&query, "archive_type"), Some("tar.gz"));
        assert_eq!(value_of(&query, "lib_c_type"), Some("glibc"));
        assert_eq!(value_of(&query, "package_type"), Some("jdk"));
        assert_eq!(value_of(&query, "release_status"), Some("ga"));
        assert_eq!(value_of(&query, "distribution"), Some("temurin"));
    }

    #[test]
    fn test_windows_query_uses_zip() {
        let query = package_query("windows", "amd64", "zulu");
        assert_eq!(value_of(&query, "archive_type"), Some("zip"));
        assert_eq!(value_of(&query, "lib_c_type"), Some("c_std_lib"));
        assert_eq!(value_of(&query, "architecture"), Some("x64"));
    }

    #[test]
    fn test_empty_distribution_lists_all() {
        let query = package_query("linux", "aarch64", "");
        assert_eq!(value_of(&query, "distribution"), None);
        assert_eq!(value_of(&query, "architecture"), Some("aarch64"));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = DiscoClient::with_base_url("https://example.com/disco/").unwrap();
        assert_eq!(client.base_url, "https://example.com/disco");
    }
}
