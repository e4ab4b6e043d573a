use reqwest::header::ACCEPT_RANGES;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::core::error::ProbeError;

/// 获取远程文件大小并确认服务器支持 `bytes` 分段请求
pub struct SizeProber {
    client: Client,
}

impl SizeProber {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// 只接受 200、`Accept-Ranges: bytes` 和已知的 Content-Length，否则返回 ProbeError。
    /// 响应在返回前被丢弃，连接随之释放。
    pub async fn probe(&self, url: &Url) -> Result<u64, ProbeError> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT_RANGES, "bytes")
            .send()
            .await?;

        let status = response.status();
        let accepts_bytes = response
            .headers()
            .get(ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(',').any(|unit| unit.trim().eq_ignore_ascii_case("bytes")))
            .unwrap_or(false);
        let length = response.content_length();
        drop(response);

        if status != StatusCode::OK {
            return Err(ProbeError::UnexpectedStatus(status));
        }
        if !accepts_bytes {
            return Err(ProbeError::RangeNotSupported);
        }
        let size = length.ok_or(ProbeError::UnknownLength)?;

        log::debug!("探测成功: {} 大小 {} 字节", url, size);
        Ok(size)
    }
}
