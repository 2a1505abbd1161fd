use std::env;
use std::path::{Path, PathBuf};

use crate::cli::commands::{Commands, DiscoverCommands};
use crate::discovery::models::Jdk;
use crate::discovery::Manager;
use crate::error::{AppError, AppResult};
use crate::infrastructure::config::Config;
use crate::infrastructure::disco::client::host_platform;
use crate::infrastructure::disco::{DiscoClient, Distribution};
use crate::infrastructure::paths::{
    cache_file, java_home, read_project_version, resolve_data_dir, store_dir,
};
use crate::installer::links::{
    find_best_match_jdk, get_alias, link, link_latest, set_alias, unlink, unset_alias,
};
use crate::installer::pipeline;
use crate::semver::{Range, Version, VersionPart, VersionSliceExt};

/// use/deactivate 输出给 shell 包装脚本求值的指令前缀
const SET_PREFIX: &str = "SET";

/// 记录 use 之前的 JAVA_HOME，deactivate 时还原
const JAVA_HOME_BACKUP_ENV: &str = "JAVA_HOME_BEFORE_JDKMAN";

/// 命令处理器
pub struct CommandHandler {
    data_dir: PathBuf,
    config: Config,
}

impl CommandHandler {
    /// 创建新的命令处理器
    pub fn new() -> AppResult<Self> {
        let data_dir = resolve_data_dir()?;
        let config = Config::load(&data_dir)?;
        Ok(Self { data_dir, config })
    }

    /// 处理命令
    pub async fn handle_command(&mut self, command: Commands) -> AppResult<()> {
        match command {
            Commands::Install { selector, output } => {
                self.handle_install(selector, output).await
            }
            Commands::Uninstall { selector } => self.handle_uninstall(&selector),
            Commands::Ls { selector, latest } => self.handle_ls(selector, latest),
            Commands::LsDistributions => self.handle_ls_distributions().await,
            Commands::LsRemote {
                selector,
                os,
                arch,
                distribution,
                latest,
            } => {
                self.handle_ls_remote(selector, os, arch, distribution, latest)
                    .await
            }
            Commands::Use { selector } => self.handle_use(selector),
            Commands::Which { selector, home } => self.handle_which(selector, home),
            Commands::Current => self.handle_current(),
            Commands::Deactivate => self.handle_deactivate(),
            Commands::Alias { name, value } => self.handle_alias(&name, value),
            Commands::Unalias { name } => self.handle_unalias(&name),
            Commands::Link { name, path } => self.handle_link(&name, &path),
            Commands::Unlink { name } => self.handle_unlink(&name),
            Commands::Discover { action } => self.handle_discover(action),
        }
    }

    fn discover_jdks(&self, force_refresh: bool) -> AppResult<Vec<Jdk>> {
        let discovery = if force_refresh {
            self.config.discovery.without_cache()
        } else {
            self.config.discovery.clone()
        };
        let manager =
            Manager::with_all_sources(&self.data_dir, cache_file(&self.data_dir), discovery);
        manager.discover_all()
    }

    /// 命令行没给选择器时读当前目录的 .java-version
    fn required_selector(&self, selector: Option<String>) -> AppResult<String> {
        selector.or_else(read_project_version).ok_or_else(|| {
            AppError::config("未指定版本选择器，当前目录也没有 .java-version 文件")
        })
    }

    /// 别名可以出现在任何接受选择器的位置
    fn resolve_alias(&self, selector: String) -> AppResult<String> {
        match get_alias(&self.data_dir, &selector)? {
            Some(value) => Ok(value),
            None => Ok(selector),
        }
    }

    async fn handle_install(
        &mut self,
        selector: Option<String>,
        output: Option<PathBuf>,
    ) -> AppResult<()> {
        let selector = self.required_selector(selector)?;
        let selector = self.resolve_alias(selector)?;
        let jdks = self.discover_jdks(false)?;
        let client = DiscoClient::new()?;

        println!("🔍 正在解析 {selector} ...");
        let outcome = pipeline::install(
            &self.data_dir,
            &self.config,
            &client,
            &jdks,
            &selector,
            output.as_deref(),
        )
        .await?;

        match outcome {
            Some(outcome) => {
                println!(
                    "✅ 已安装 {} 到 {}",
                    outcome.version,
                    outcome.destination.display()
                );
                if output.is_none() {
                    let jdks = self.discover_jdks(true)?;
                    link_latest(&self.data_dir, &jdks)?;
                }
            }
            None => println!("ℹ️ {selector} 已安装，无需重复安装"),
        }
        Ok(())
    }

    fn handle_uninstall(&mut self, selector: &str) -> AppResult<()> {
        let version = pipeline::uninstall(&self.data_dir, selector)?;
        println!("✅ 已卸载 {version}");
        let jdks = self.discover_jdks(true)?;
        link_latest(&self.data_dir, &jdks)?;
        Ok(())
    }

    fn handle_ls(&self, selector: Option<String>, latest: Option<String>) -> AppResult<()> {
        let range = selector.map(|s| Range::parse(&s)).transpose()?;
        let jdks = self.discover_jdks(false)?;

        let mut versions = Vec::new();
        for jdk in &jdks {
            if let Ok(version) =
                Version::parse(&jdk.identifier).or_else(|_| Version::parse(&jdk.version))
            {
                versions.push(version);
            }
        }
        versions.sort();
        versions.dedup();
        if let Some(part) = latest {
            let part: VersionPart = part.parse()?;
            versions = versions.trim_to(part);
        }

        for version in versions.iter().rev() {
            if range.as_ref().map_or(true, |r| r.contains(version)) {
                println!("{version}");
            }
        }
        Ok(())
    }

    async fn handle_ls_distributions(&self) -> AppResult<()> {
        let client = DiscoClient::new()?;
        let distributions = client.get_distributions().await?;
        print!("{}", render_distribution_table(&distributions));
        Ok(())
    }

    async fn handle_ls_remote(
        &self,
        selector: Option<String>,
        os: Option<String>,
        arch: Option<String>,
        distribution: String,
        latest: String,
    ) -> AppResult<()> {
        let range = selector.map(|s| Range::parse(&s)).transpose()?;
        let part: VersionPart = latest.parse()?;
        let (host_os, host_arch) = host_platform();
        let os = os.unwrap_or(host_os);
        let arch = arch.unwrap_or(host_arch);
        let distribution = if distribution == "all" {
            String::new()
        } else {
            distribution
        };

        let client = DiscoClient::new()?;
        let index = pipeline::make_package_index(&client, &os, &arch, &distribution).await?;
        let trimmed = index.versions().trim_to(part);

        let mut header_printed = false;
        for version in &trimmed {
            if !range.as_ref().map_or(true, |r| r.contains(version)) {
                continue;
            }
            let Some(package) = index.package_for(version) else {
                continue;
            };
            if !header_printed {
                println!(
                    "{:<20} {:<15} {}",
                    "Identifier", "Full Version", "Distribution Version"
                );
                header_printed = true;
            }
            println!(
                "{:<20} {:<15} {} {}",
                version.trim_to(part),
                package.java_version,
                package.distribution,
                package.distribution_version
            );
        }
        Ok(())
    }

    fn handle_use(&self, selector: Option<String>) -> AppResult<()> {
        let selector = self.required_selector(selector)?;
        let selector = self.resolve_alias(selector)?;
        let jdks = self.discover_jdks(false)?;
        let jdk = find_best_match_jdk(&jdks, &selector)?;
        let home = java_home(&jdk.path, env::consts::OS);

        let current_path = env::var("PATH").unwrap_or_default();
        let previous_home = env::var("JAVA_HOME").ok().filter(|v| !v.is_empty());
        let cleaned = remove_managed_entries(
            &current_path,
            &store_dir(&self.data_dir),
            previous_home.as_deref(),
        );
        let bin = home.join("bin");
        let new_path = join_path(&bin.to_string_lossy(), &cleaned);

        if let Some(previous) = &previous_home {
            if env::var(JAVA_HOME_BACKUP_ENV).is_err() {
                emit_set(JAVA_HOME_BACKUP_ENV, previous);
            }
        }
        emit_set("JAVA_HOME", &home.to_string_lossy());
        emit_set("PATH", &new_path);
        Ok(())
    }

    fn handle_deactivate(&self) -> AppResult<()> {
        let current_path = env::var("PATH").unwrap_or_default();
        let active_home = env::var("JAVA_HOME").ok().filter(|v| !v.is_empty());
        let cleaned = remove_managed_entries(
            &current_path,
            &store_dir(&self.data_dir),
            active_home.as_deref(),
        );
        emit_set("PATH", &cleaned);
        match env::var(JAVA_HOME_BACKUP_ENV) {
            Ok(previous) if !previous.is_empty() => {
                emit_set("JAVA_HOME", &previous);
                emit_set(JAVA_HOME_BACKUP_ENV, "");
            }
            _ => emit_set("JAVA_HOME", ""),
        }
        Ok(())
    }

    fn handle_which(&self, selector: Option<String>, home: bool) -> AppResult<()> {
        let selector = self.required_selector(selector)?;
        let selector = self.resolve_alias(selector)?;
        let jdks = self.discover_jdks(false)?;
        let jdk = find_best_match_jdk(&jdks, &selector)?;
        if home {
            println!("{}", java_home(&jdk.path, env::consts::OS).display());
        } else {
            println!("{}", jdk.path.display());
        }
        Ok(())
    }

    fn handle_current(&self) -> AppResult<()> {
        let Some(active_home) = env::var("JAVA_HOME").ok().filter(|v| !v.is_empty()) else {
            println!("未激活任何 JDK");
            return Ok(());
        };
        let active = PathBuf::from(&active_home);
        let jdks = self.discover_jdks(false)?;
        let found = jdks.iter().find(|jdk| {
            jdk.path == active || java_home(&jdk.path, env::consts::OS) == active
        });
        match found {
            Some(jdk) => println!("{}", jdk.identifier),
            None => println!("{active_home}"),
        }
        Ok(())
    }

    fn handle_alias(&self, name: &str, value: Option<String>) -> AppResult<()> {
        match value {
            Some(value) => {
                // 值必须是合法的选择器
                Range::parse(&value)?;
                set_alias(&self.data_dir, name, &value)?;
                let jdks = self.discover_jdks(false)?;
                link_latest(&self.data_dir, &jdks)?;
                println!("✅ 别名 {name} -> {value}");
            }
            None => match get_alias(&self.data_dir, name)? {
                Some(value) => println!("{value}"),
                None => println!("别名 {name} 未设置"),
            },
        }
        Ok(())
    }

    fn handle_unalias(&self, name: &str) -> AppResult<()> {
        unset_alias(&self.data_dir, name)?;
        let jdks = self.discover_jdks(false)?;
        link_latest(&self.data_dir, &jdks)?;
        println!("✅ 已删除别名 {name}");
        Ok(())
    }

    fn handle_link(&self, name: &str, path: &Path) -> AppResult<()> {
        link(&self.data_dir, name, path)?;
        println!("✅ {} -> {}", name, path.display());
        Ok(())
    }

    fn handle_unlink(&self, name: &str) -> AppResult<()> {
        unlink(&self.data_dir, name)?;
        println!("✅ 已删除链接 {name}");
        Ok(())
    }

    fn handle_discover(&self, action: DiscoverCommands) -> AppResult<()> {
        match action {
            DiscoverCommands::Refresh => {
                let jdks = self.discover_jdks(true)?;
                println!("✅ 重新扫描完成，共发现 {} 个 JDK", jdks.len());
            }
            DiscoverCommands::List { details } => {
                let jdks = self.discover_jdks(false)?;
                if jdks.is_empty() {
                    println!("没有发现任何 JDK");
                    return Ok(());
                }
                for jdk in &jdks {
                    if details {
                        println!(
                            "{:<40} {:<10} {:<8} {:<10} {}",
                            jdk.identifier,
                            jdk.version,
                            jdk.architecture,
                            jdk.source,
                            jdk.path.display()
                        );
                    } else {
                        println!("{}", jdk.identifier);
                    }
                }
            }
        }
        Ok(())
    }
}

fn emit_set(variable: &str, value: &str) {
    println!("{SET_PREFIX}\t{variable}\t{value}");
}

fn path_separator() -> char {
    if cfg!(windows) {
        ';'
    } else {
        ':'
    }
}

/// 从 PATH 里去掉受管存储与上一个 JAVA_HOME 的 bin 条目
fn remove_managed_entries(path: &str, store: &Path, previous_home: Option<&str>) -> String {
    let separator = path_separator();
    let previous_bin = previous_home.map(|home| {
        Path::new(home)
            .join("bin")
            .to_string_lossy()
            .into_owned()
    });
    path.split(separator)
        .filter(|entry| !entry.is_empty())
        // 按路径组件比较，避免把 <store>-tools 这类同前缀的兄弟目录也剔掉
        .filter(|entry| !Path::new(entry).starts_with(store))
        .filter(|entry| previous_bin.as_deref() != Some(*entry))
        .collect::<Vec<_>>()
        .join(&separator.to_string())
}

/// 发行版列表的表格输出：api_parameter 作标识符，后跟显示名
fn render_distribution_table(distributions: &[Distribution]) -> String {
    let mut out = format!("{:<20} {}\n", "Identifier", "Name");
    for distribution in distributions {
        out.push_str(&format!(
            "{:<20} {}\n",
            distribution.api_parameter, distribution.name
        ));
    }
    out
}

fn join_path(head: &str, tail: &str) -> String {
    if tail.is_empty() {
        head.to_string()
    } else {
        format!("{head}{}{tail}", path_separator())
    }
}
