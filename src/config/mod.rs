use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use crate::core::error::DownloadError;

/// 配置结构体
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// 并发下载时的分片数，0 表示使用 CPU 核数
    pub thread_count: usize,
    /// 建立连接的超时时间（秒）
    pub connect_timeout: u64,
    /// 单个请求的总超时时间（秒），0 表示不限制
    pub timeout: u64,
    /// User-Agent
    pub user_agent: String,
    /// 是否显示进度条
    pub show_progress: bool,
    /// 日志级别：error / warn / info / debug / trace
    pub log_level: String,
    /// 日志文件路径，为空时输出到标准错误
    pub log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thread_count: 0,
            connect_timeout: 10,
            timeout: 0,
            user_agent: format!("rangefetch/{}", env!("CARGO_PKG_VERSION")),
            show_progress: true,
            log_level: "warn".to_string(),
            log_file: String::new(),
        }
    }
}

impl Config {
    /// 加载配置文件，文件不存在时返回默认配置
    pub fn load(path: &str) -> Result<Self, DownloadError> {
        if !Path::new(path).exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| DownloadError::Config(format!("无法读取配置文件 {}: {}", path, e)))?;
        toml::from_str(&content)
            .map_err(|e| DownloadError::Config(format!("配置文件格式错误 {}: {}", path, e)))
    }

    /// 保存带教程的配置文件
    pub fn save_with_tutorial(&self, path: &str) -> Result<(), DownloadError> {
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent)
                .map_err(|e| DownloadError::Config(format!("无法创建配置目录: {}", e)))?;
        }
        let config_content = toml::to_string_pretty(self)
            .map_err(|e| DownloadError::Config(format!("无法序列化配置: {}", e)))?;
        let full_content = format!("{}\n{}", Config::generate_tutorial_content(), config_content);
        fs::write(path, full_content)
            .map_err(|e| DownloadError::Config(format!("无法保存配置文件: {}", e)))?;
        Ok(())
    }

    fn generate_tutorial_content() -> &'static str {
        r#"# rangefetch 配置文件
# ====================
#
# TOML 格式。命令行参数会覆盖配置文件中的设置，优先级：命令行 > 配置文件 > 默认值
#
# 使用示例：
#   rangefetch -u https://example.com/file.zip              # 单连接下载
#   rangefetch -c -u https://example.com/file.zip           # 按 CPU 核数分片并发下载
#   rangefetch -c -t 8 -u https://example.com/file.zip      # 8 个分片
#   rangefetch -c -o /data -u https://example.com/file.zip  # 指定存放目录
#
# 配置项说明：
#   thread_count     并发下载时的分片数，0 表示使用 CPU 核数
#   connect_timeout  建立连接的超时时间（秒）
#   timeout          单个请求的总超时时间（秒），0 表示不限制
#   user_agent       User-Agent 字符串
#   show_progress    是否显示进度条
#   log_level        日志级别：error / warn / info / debug / trace
#   log_file         日志文件路径，为空时输出到标准错误
"#
    }

    /// 校验配置合法性
    pub fn validate(&self) -> Result<(), DownloadError> {
        if self.connect_timeout == 0 {
            return Err(DownloadError::Config("连接超时时间必须大于0".to_string()));
        }

        if self.user_agent.trim().is_empty() {
            return Err(DownloadError::Config("User-Agent 不能为空".to_string()));
        }

        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(DownloadError::Config(format!("无效的日志级别: {}", self.log_level)));
        }

        Ok(())
    }

    /// 合并命令行参数到配置
    pub fn merge_from_args(&mut self, args: &crate::cli::Args) {
        if let Some(threads) = args.threads {
            self.thread_count = threads;
        }

        if args.quiet {
            self.show_progress = false;
        }

        match args.verbose {
            0 => {}
            1 => self.log_level = "info".to_string(),
            2 => self.log_level = "debug".to_string(),
            _ => self.log_level = "trace".to_string(),
        }
    }

    /// 获取配置摘要信息
    pub fn get_summary(&self) -> String {
        format!(
            "配置摘要:\n\
            - 分片数: {}\n\
            - 连接超时: {} 秒\n\
            - 请求超时: {}\n\
            - User-Agent: {}\n\
            - 进度条: {}\n\
            - 日志级别: {}",
            if self.thread_count == 0 { "CPU 核数".to_string() } else { self.thread_count.to_string() },
            self.connect_timeout,
            if self.timeout == 0 { "不限制".to_string() } else { format!("{} 秒", self.timeout) },
            self.user_agent,
            if self.show_progress { "启用" } else { "禁用" },
            self.log_level,
        )
    }
}
