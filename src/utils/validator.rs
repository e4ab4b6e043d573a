use url::Url;
use crate::core::error::DownloadError;

/// 只接受 http / https 的绝对地址
pub fn is_valid_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some(),
        Err(_) => false,
    }
}

pub fn validate_thread_count(threads: usize) -> Result<(), DownloadError> {
    if threads == 0 {
        return Err(DownloadError::Config("线程数必须大于0".to_string()));
    }
    Ok(())
}

pub fn validate_output_path(path: &str) -> Result<(), DownloadError> {
    if path.trim().is_empty() {
        return Err(DownloadError::Config("输出路径不能为空".to_string()));
    }
    Ok(())
}
