use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// jdkman CLI 应用程序
#[derive(Parser)]
#[command(name = "jdkman")]
#[command(about = "跨平台 JDK 版本管理工具：发现、下载、安装与切换多个 JDK", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 顶级命令
#[derive(Subcommand)]
pub enum Commands {
    /// 下载并安装一个 JDK
    Install {
        /// 版本选择器，如 "21"、"temurin@17"、"~1.8.73"；缺省读 .java-version
        selector: Option<String>,
        /// 安装到指定目录（不纳入受管存储）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// 卸载一个已安装的 JDK
    Uninstall {
        /// 版本选择器
        selector: String,
    },
    /// 列出本机全部可用的 JDK
    Ls {
        /// 可选的过滤范围
        selector: Option<String>,
        /// 按粒度只保留每组最新（major、minor 或 patch）
        #[arg(long)]
        latest: Option<String>,
    },
    /// 列出全部可用的 Java 发行版
    LsDistributions,
    /// 列出远程可安装的版本
    LsRemote {
        /// 可选的过滤范围
        selector: Option<String>,
        /// 操作系统（linux、macos、windows）
        #[arg(long)]
        os: Option<String>,
        /// 处理器架构（x64、aarch64）
        #[arg(long)]
        arch: Option<String>,
        /// 发行版（temurin、zulu、corretto 等），"all" 列出全部
        #[arg(long, default_value = "temurin")]
        distribution: String,
        /// 按粒度只保留每组最新
        #[arg(long, default_value = "major")]
        latest: String,
    },
    /// 切换当前 shell 使用的 JDK（输出环境变量修改指令）
    Use {
        /// 版本选择器或别名；缺省读 .java-version
        selector: Option<String>,
    },
    /// 显示匹配 JDK 的安装路径
    Which {
        /// 版本选择器或别名；缺省读 .java-version
        selector: Option<String>,
        /// 输出可直接用作 JAVA_HOME 的路径
        #[arg(long)]
        home: bool,
    },
    /// 显示当前激活的 JDK
    Current,
    /// 还原 use 做出的环境变量修改
    Deactivate,
    /// 查看或设置别名
    Alias {
        /// 别名名称
        name: String,
        /// 别名的值；省略则打印当前值
        value: Option<String>,
    },
    /// 删除别名
    Unalias {
        /// 别名名称
        name: String,
    },
    /// 把外部 JDK 链接进受管存储
    Link {
        /// 链接名，必须形如 system@<version>
        name: String,
        /// 外部 JDK 的路径
        path: PathBuf,
    },
    /// 删除外部 JDK 链接
    Unlink {
        /// 链接名
        name: String,
    },
    /// JDK 自动发现管理
    Discover {
        #[command(subcommand)]
        action: DiscoverCommands,
    },
}

/// 发现相关命令
#[derive(Subcommand)]
pub enum DiscoverCommands {
    /// 忽略缓存，立即重新扫描
    Refresh,
    /// 列出发现到的 JDK
    List {
        /// 显示路径、发行商等详细信息
        #[arg(short, long)]
        details: bool,
    },
}
