use chrono::Local; // 用于获取本地时间
use env_logger::{Builder, Target};
use log::LevelFilter; // 用于设置日志级别
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// 日志环境变量，设置后覆盖配置中的级别
pub const LOG_ENV: &str = "RUST_LOG";

/// 格式化一行日志：`2024-01-01 12:00:00 [INFO] - message`
pub fn format_line(level: log::Level, message: &str) -> String {
    format!(
        "{} [{}] - {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        level,
        message
    )
}

fn builder(level: LevelFilter) -> Builder {
    let mut builder = Builder::new();
    builder
        .filter_level(level)
        .format(|buf, record| {
            writeln!(buf, "{}", format_line(record.level(), &record.args().to_string()))
        });
    if let Ok(spec) = std::env::var(LOG_ENV) {
        builder.parse_filters(&spec);
    }
    builder
}

/// 初始化全局日志，`log_file` 为空时写到标准错误，否则以追加方式写入文件
pub fn init_logger(level: LevelFilter, log_file: &str) -> Result<(), std::io::Error> {
    let mut builder = builder(level);

    if !log_file.is_empty() {
        // 确保日志目录存在
        if let Some(parent) = Path::new(log_file).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)?;
        builder.target(Target::Pipe(Box::new(file)));
    } else {
        builder.target(Target::Stderr);
    }

    // 重复初始化时保留已有的 logger
    let _ = builder.try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line() {
        let line = format_line(log::Level::Warn, "分片 #2 失败");
        assert!(line.contains("[WARN] - 分片 #2 失败"));
        // 日期 + 时间 前缀
        assert_eq!(line.split(' ').next().map(|d| d.len()), Some(10));
    }

    #[test]
    fn test_init_logger_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("rangefetch.log");
        init_logger(LevelFilter::Info, path.to_str().unwrap()).unwrap();
        assert!(path.exists());
    }
}
