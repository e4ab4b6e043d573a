use reqwest::header::RANGE;
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use url::Url;

use crate::core::error::SegmentError;
use crate::core::task::{Segment, SegmentResult};
use crate::ui::ProgressSink;

/// 临时文件写缓冲大小
const WRITE_BUFFER_SIZE: usize = 256 * 1024;

/// 下载单个分片到独立的临时文件。
///
/// 失败只记录并上报，不重试，也不影响其他分片。
#[derive(Clone)]
pub struct SegmentWorker {
    client: Client,
    url: Arc<Url>,
    progress: Option<Arc<dyn ProgressSink>>,
}

impl SegmentWorker {
    pub fn new(client: Client, url: Arc<Url>, progress: Option<Arc<dyn ProgressSink>>) -> Self {
        Self { client, url, progress }
    }

    pub async fn run(&self, segment: &Segment) -> SegmentResult {
        log::debug!("分片 #{} 开始: [{}, {})", segment.index, segment.start, segment.end);
        match self.download(segment).await {
            Ok(bytes) => {
                log::info!(
                    "#{}: 下载成功 {}-{} ({} 字节)",
                    segment.index,
                    segment.start,
                    segment.end,
                    bytes
                );
                SegmentResult::success(segment.index, bytes)
            }
            Err(error) => {
                log::error!("#{}: 下载失败: {}", segment.index, error);
                SegmentResult::failure(segment.index, error)
            }
        }
    }

    async fn download(&self, segment: &Segment) -> Result<u64, SegmentError> {
        let range = match segment.range_header() {
            Some(range) => range,
            // 空分片不发请求，只留一个空的临时文件给合并阶段
            None => {
                let file = create_file(segment.path()).await?;
                finish_file(BufWriter::new(file), segment.path()).await?;
                return Ok(0);
            }
        };

        let mut response = self
            .client
            .get(self.url.as_ref().clone())
            .header(RANGE, range)
            .send()
            .await?;

        // 200 说明服务器忽略了 Range，整份内容会破坏合并结果
        if response.status() != StatusCode::PARTIAL_CONTENT {
            return Err(SegmentError::UnexpectedStatus(response.status()));
        }

        let file = create_file(segment.path()).await?;
        let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
        let mut written = 0u64;

        while let Some(chunk) = response.chunk().await? {
            writer
                .write_all(&chunk)
                .await
                .map_err(|source| io_error(segment.path(), source))?;
            written += chunk.len() as u64;
            if let Some(progress) = &self.progress {
                progress.advance(chunk.len() as u64);
            }
        }

        finish_file(writer, segment.path()).await?;

        if written != segment.len() {
            return Err(SegmentError::LengthMismatch {
                expected: segment.len(),
                actual: written,
            });
        }
        Ok(written)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> SegmentError {
    SegmentError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// 覆盖已存在的同名临时文件
async fn create_file(path: &Path) -> Result<File, SegmentError> {
    File::create(path).await.map_err(|source| io_error(path, source))
}

async fn finish_file(mut writer: BufWriter<File>, path: &Path) -> Result<(), SegmentError> {
    writer.flush().await.map_err(|source| io_error(path, source))?;
    writer
        .into_inner()
        .sync_all()
        .await
        .map_err(|source| io_error(path, source))
}
