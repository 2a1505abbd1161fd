use serde::Deserialize;

/// 包列表接口返回的单个条目
#[derive(Debug, Clone, Deserialize)]
pub struct Package {
    pub id: String,
    pub distribution: String,
    pub java_version: String,
    #[serde(default)]
    pub distribution_version: String,
}

#[derive(Debug, Deserialize)]
pub struct PackagesResponse {
    #[serde(rename = "result", default)]
    pub packages: Vec<Package>,
}

/// `ids/<id>` 接口返回的下载信息
#[derive(Debug, Clone, Deserialize)]
pub struct PackageInfo {
    #[serde(default)]
    pub filename: String,
    pub direct_download_uri: String,
    #[serde(default)]
    pub checksum: String,
    #[serde(default)]
    pub checksum_type: String,
}

#[derive(Debug, Deserialize)]
pub struct PackageInfoResponse {
    #[serde(rename = "result", default)]
    pub result: Vec<PackageInfo>,
}

/// 一个可用的 Java 发行版
#[derive(Debug, Clone, Deserialize)]
pub struct Distribution {
    pub name: String,
    pub api_parameter: String,
}

#[derive(Debug, Deserialize)]
pub struct DistributionsResponse {
    #[serde(rename = "result", default)]
    pub distributions: Vec<Distribution>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_packages_response() {
        let body = r#"{
            "result": [
                {
                    "id": "abc123",
                    "distribution": "temurin",
                    "java_version": "21.0.4+7",
                    "distribution_version": "21.0.4"
                }
            ],
            "message": ""
        }"#;
        let response: PackagesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.packages.len(), 1);
        assert_eq!(response.packages[0].id, "abc123");
        assert_eq!(response.packages[0].java_version, "21.0.4+7");
    }

    #[test]
    fn test_deserialize_distributions_response() {
        let body = r#"{
            "result": [
                { "name": "Temurin", "api_parameter": "temurin" },
                { "name": "Zulu", "api_parameter": "zulu" }
            ]
        }"#;
        let response: DistributionsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.distributions.len(), 2);
        assert_eq!(response.distributions[0].api_parameter, "temurin");
        assert_eq!(response.distributions[1].name, "Zulu");
    }

    #[test]
    fn test_deserialize_package_info_response() {
        let body = r#"{
            "result": [
                {
                    "filename": "jdk.tar.gz",
                    "direct_download_uri": "https://example.com/jdk.tar.gz",
                    "checksum": "deadbeef",
                    "checksum_type": "sha256"
                }
            ]
        }"#;
        let response: PackageInfoResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.result[0].checksum_type, "sha256");
        assert_eq!(
            response.result[0].direct_download_uri,
            "https://example.com/jdk.tar.gz"
        );
    }
}
