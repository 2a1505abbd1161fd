use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO 错误: {0}")]
    Io(#[from] io::Error),

    #[error("无效的版本号: {raw}")]
    InvalidVersion { raw: String },

    #[error("无效的版本范围: {raw}")]
    InvalidRange { raw: String },

    #[error("未找到与 {selector} 兼容的版本\n可安装的版本: {}", available.join(", "))]
    NoCompatibleVersion {
        selector: String,
        available: Vec<String>,
    },

    #[error("{selector} 尚未安装")]
    NotInstalled { selector: String },

    #[error("未找到 {path}，该目录不是有效的 Java 发行版")]
    NotAJavaDistribution { path: PathBuf },

    #[error("检测到路径穿越: {path}")]
    PathTraversal { path: PathBuf },

    #[error("校验和不匹配 ({algo}): 期望 {expected}，实际 {actual}")]
    ChecksumMismatch {
        algo: String,
        expected: String,
        actual: String,
    },

    #[error("不支持的校验算法: {0}")]
    UnsupportedChecksumAlgorithm(String),

    #[error("不安全的下载地址，仅允许 HTTPS: {0}")]
    InsecureUrl(String),

    #[error("不支持的压缩包类型: {0}")]
    UnsupportedArchiveType(String),

    #[error("不支持的操作系统: {0}")]
    UnsupportedOs(String),

    #[error("来源 {source_name} 扫描失败: {message}")]
    Discovery {
        source_name: String,
        message: String,
    },

    #[error("解压缩失败: {message}")]
    Extract { message: String },

    #[error("网络错误: {message}")]
    Network { message: String },

    #[error("配置错误: {message}")]
    Config { message: String },

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 应用程序 Result 类型
pub type AppResult<T> = Result<T, AppError>;

/// 便捷的错误创建函数
impl AppError {
    pub fn invalid_version(raw: impl Into<String>) -> Self {
        Self::InvalidVersion { raw: raw.into() }
    }

    pub fn invalid_range(raw: impl Into<String>) -> Self {
        Self::InvalidRange { raw: raw.into() }
    }

    pub fn not_installed(selector: impl Into<String>) -> Self {
        Self::NotInstalled {
            selector: selector.into(),
        }
    }

    pub fn discovery(source_name: &str, message: impl Into<String>) -> Self {
        Self::Discovery {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    pub fn extract(message: impl Into<String>) -> Self {
        Self::Extract {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
