mod progress;

use std::fmt;
use std::path::PathBuf;
pub use progress::{ByteCounter, ProgressManager, ProgressSink};

pub fn print_success(message: &str) {
    println!("✓ {}", message);
}

pub fn print_error(message: &str) {
    eprintln!("✗ {}", message);
}

pub struct DownloadSummary {
    pub output: PathBuf,
    pub total_size: u64,
    pub segments: usize,
    pub elapsed_time: std::time::Duration,
}

impl fmt::Display for DownloadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n下载摘要:")?;
        writeln!(f, "文件: {}", self.output.display())?;
        writeln!(f, "总大小: {}", format_size(self.total_size))?;
        writeln!(f, "分片数: {}", self.segments)?;
        writeln!(f, "耗时: {:.2}秒", self.elapsed_time.as_secs_f64())?;
        Ok(())
    }
}

pub fn format_size(size: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.00 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024 * 1024), "3072.00 GB");
    }

    #[test]
    fn test_summary_display() {
        let summary = DownloadSummary {
            output: PathBuf::from("./go.tar.gz"),
            total_size: 2048,
            segments: 4,
            elapsed_time: std::time::Duration::from_millis(1500),
        };
        let text = summary.to_string();
        assert!(text.contains("下载摘要"));
        assert!(text.contains("2.00 KB"));
        assert!(text.contains("分片数: 4"));
        assert!(text.contains("1.50秒"));
    }
}
