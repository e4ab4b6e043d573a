//! CLI: 命令行参数解析，并把参数与配置文件合并成一次下载所需的 `DownloadOptions`
//!
//! ## 支持的命令
//!
//! - 单连接下载：`rangefetch -u <url>`
//! - 分片并发下载：`rangefetch -c -u <url>`
//! - 指定存放目录：`rangefetch -c -o /data -u <url>`
//! - 生成配置文件：`rangefetch --init-config`
//!
//! ## 平台默认配置路径
//!
//! - Windows: `%APPDATA%/rangefetch/rangefetch.toml`
//! - macOS: `~/Library/Application Support/rangefetch/rangefetch.toml`
//! - Linux: `~/.config/rangefetch/rangefetch.toml`

use clap::Parser;
use std::env;
use std::path::PathBuf;

use crate::config::Config;
use crate::core::error::DownloadError;
use crate::core::task::DownloadOptions;
use crate::utils::validator;

/// 获取平台默认配置文件路径
pub fn default_config_path() -> String {
    #[cfg(target_os = "windows")]
    {
        let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        format!("{}/rangefetch/rangefetch.toml", appdata)
    }
    #[cfg(target_os = "macos")]
    {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        format!("{}/Library/Application Support/rangefetch/rangefetch.toml", home)
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        format!("{}/.config/rangefetch/rangefetch.toml", home)
    }
}

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_SHA"),
    ", built ",
    env!("VERGEN_BUILD_TIMESTAMP"),
    ")"
);

/// rangefetch 命令行参数
///
/// 示例用法：
///   rangefetch -u https://example.com/file.zip
///   rangefetch -c -u https://example.com/file.zip
///   rangefetch -c -t 8 -o /data -u https://example.com/file.zip
#[derive(Parser, Debug, Clone)]
#[command(
    name = "rangefetch",
    author = "panzhifu",
    version = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION,
    about = "把远程文件切成多个字节区间并发下载，再按顺序合并",
)]
pub struct Args {
    /// 目标下载地址
    #[arg(short, long, required_unless_present = "init_config")]
    pub url: Option<String>,

    /// 是否并发下载（分片数默认等于 CPU 核数）
    #[arg(short, long)]
    pub concurrent: bool,

    /// 指定文件存放目录
    #[arg(short = 'o', long = "outpath", default_value = "./")]
    pub out_dir: String,

    /// 并发下载时的分片数，覆盖配置文件中的设置（需要同时指定 -c）
    #[arg(short = 't', long, requires = "concurrent")]
    pub threads: Option<usize>,

    /// 配置文件路径
    #[arg(long, default_value_t = default_config_path())]
    pub config: String,

    /// 写入带说明的默认配置文件并退出
    #[arg(long)]
    pub init_config: bool,

    /// 不显示进度条
    #[arg(short, long)]
    pub quiet: bool,

    /// 提高日志级别（-v info，-vv debug，-vvv trace）
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// 加载配置文件并合并命令行参数
    pub fn load_config(&self) -> Result<Config, DownloadError> {
        let mut config = Config::load(&self.config)?;
        config.merge_from_args(self);
        config.validate()?;
        Ok(config)
    }

    /// 唯一的适配入口：命令行参数 + 配置 → DownloadOptions
    pub fn to_options(&self, config: &Config) -> Result<DownloadOptions, DownloadError> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| DownloadError::InvalidUrl("未提供下载地址".to_string()))?;
        if !validator::is_valid_url(url) {
            return Err(DownloadError::InvalidUrl(url.to_string()));
        }
        validator::validate_output_path(&self.out_dir)?;
        if let Some(threads) = self.threads {
            validator::validate_thread_count(threads)?;
        }

        let threads = match config.thread_count {
            0 => None,
            n => Some(n),
        };

        Ok(DownloadOptions {
            url: url.to_string(),
            concurrent: self.concurrent,
            out_dir: PathBuf::from(&self.out_dir),
            threads,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_args_defaults() {
        let args = parse(&["rangefetch", "-u", "https://example.com/file.zip"]);
        assert_eq!(args.url.as_deref(), Some("https://example.com/file.zip"));
        assert!(!args.concurrent);
        assert_eq!(args.out_dir, "./");
        assert_eq!(args.threads, None);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_url_is_required() {
        assert!(Args::try_parse_from(["rangefetch", "-c"]).is_err());
        assert!(Args::try_parse_from(["rangefetch", "--init-config"]).is_ok());
    }

    #[test]
    fn test_long_flags() {
        let args = parse(&[
            "rangefetch",
            "--url",
            "http://example.com/a.iso",
            "--concurrent",
            "--outpath",
            "/data",
            "-vv",
            "-q",
        ]);
        assert!(args.concurrent);
        assert_eq!(args.out_dir, "/data");
        assert_eq!(args.verbose, 2);
        assert!(args.quiet);
    }

    #[test]
    fn test_to_options_uses_config_threads() {
        let args = parse(&["rangefetch", "-c", "-u", "https://example.com/file.zip"]);
        let mut config = Config::default();
        config.thread_count = 6;

        let options = args.to_options(&config).unwrap();
        assert!(options.concurrent);
        assert_eq!(options.threads, Some(6));
        assert_eq!(options.concurrency(), 6);
        assert_eq!(options.out_dir, PathBuf::from("./"));
    }

    #[test]
    fn test_cli_threads_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("rangefetch.toml");
        std::fs::write(&config_path, "thread_count = 2\n").unwrap();

        let args = parse(&[
            "rangefetch",
            "--config",
            config_path.to_str().unwrap(),
            "-c",
            "-t",
            "5",
            "-u",
            "https://example.com/file.zip",
        ]);
        let config = args.load_config().unwrap();
        assert_eq!(config.thread_count, 5);
        assert_eq!(args.to_options(&config).unwrap().concurrency(), 5);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let args = parse(&["rangefetch", "-c", "-t", "0", "-u", "https://example.com/file.zip"]);
        assert!(matches!(
            args.to_options(&Config::default()),
            Err(DownloadError::Config(_))
        ));
    }

    #[test]
    fn test_threads_require_concurrent() {
        let result = Args::try_parse_from(["rangefetch", "-t", "4", "-u", "https://example.com/file.zip"]);
        assert!(result.is_err());

        let args = parse(&["rangefetch", "-c", "--threads", "4", "-u", "https://example.com/file.zip"]);
        assert_eq!(args.to_options(&Config::default()).unwrap().concurrency(), 4);
    }

    #[test]
    fn test_to_options_rejects_bad_url() {
        let args = parse(&["rangefetch", "-u", "ftp://example.com/file.zip"]);
        assert!(matches!(
            args.to_options(&Config::default()),
            Err(DownloadError::InvalidUrl(_))
        ));
    }
}
