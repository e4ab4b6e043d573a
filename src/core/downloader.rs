use futures::future::join_all;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::core::error::{DownloadError, DownloadResult, SegmentError, SegmentFailures};
use crate::core::merger::Merger;
use crate::core::probe::SizeProber;
use crate::core::task::{DownloadTask, Segment, SegmentResult};
use crate::core::worker::SegmentWorker;
use crate::ui::ProgressSink;

/// 一次成功下载的结果
#[derive(Debug, Clone)]
pub struct DownloadReport {
    pub output: PathBuf,
    pub total_size: u64,
    pub segments: usize,
    pub elapsed: Duration,
}

/// 串联 探测 → 建临时目录 → 分片 → 并发下载 → 合并
pub struct Downloader {
    client: Client,
    progress: Option<Arc<dyn ProgressSink>>,
}

impl Downloader {
    pub fn new(config: &Config) -> DownloadResult<Self> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(Duration::from_secs(config.connect_timeout));
        if config.timeout > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout));
        }
        let client = builder
            .build()
            .map_err(|e| DownloadError::Config(format!("无法创建HTTP客户端: {}", e)))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// 任何一步失败都会让进度接收端 abandon，成功时 finish
    pub async fn run(&self, task: &mut DownloadTask) -> DownloadResult<DownloadReport> {
        let result = self.execute(task).await;
        if let Some(progress) = &self.progress {
            match &result {
                Ok(_) => progress.finish(),
                Err(_) => progress.abandon(),
            }
        }
        result
    }

    async fn execute(&self, task: &mut DownloadTask) -> DownloadResult<DownloadReport> {
        let started = Instant::now();
        log::info!("开始下载: {}", task.url);

        let size = SizeProber::new(self.client.clone()).probe(&task.url).await?;
        task.total_size = Some(size);
        log::info!("文件大小: {} 字节, 分片数: {}", size, task.concurrency);
        if let Some(progress) = &self.progress {
            progress.start(size);
        }

        let temp_dir = task.temp_dir();
        tokio::fs::create_dir_all(&temp_dir)
            .await
            .map_err(|source| DownloadError::TempDir {
                path: temp_dir.clone(),
                source,
            })?;

        let segments = task.plan(size);
        let results = self.download_segments(task, &segments).await;

        let failures = collect_failures(results);
        if !failures.is_empty() {
            log::error!("{} 个分片失败，放弃合并", failures.len());
            self.cleanup(&temp_dir).await;
            return Err(DownloadError::Segments(failures));
        }

        if let Err(error) = Merger::merge(task, &segments).await {
            self.cleanup(&temp_dir).await;
            return Err(error.into());
        }

        log::info!("[{}] 下载完成", task.file_name);

        Ok(DownloadReport {
            output: task.output_path(),
            total_size: size,
            segments: segments.len(),
            elapsed: started.elapsed(),
        })
    }

    /// 所有分片同时启动，等全部结束后再返回，不因个别失败提前取消
    async fn download_segments(&self, task: &DownloadTask, segments: &[Segment]) -> Vec<SegmentResult> {
        let worker = SegmentWorker::new(
            self.client.clone(),
            Arc::new(task.url.clone()),
            self.progress.clone(),
        );

        let handles: Vec<_> = segments
            .iter()
            .cloned()
            .map(|segment| {
                let worker = worker.clone();
                tokio::spawn(async move { worker.run(&segment).await })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(segments)
            .map(|(joined, segment)| {
                joined.unwrap_or_else(|e| {
                    SegmentResult::failure(segment.index, SegmentError::Join(e.to_string()))
                })
            })
            .collect()
    }

    async fn cleanup(&self, temp_dir: &std::path::Path) {
        if let Err(e) = Merger::discard(temp_dir).await {
            log::warn!("清理临时目录 {} 失败: {}", temp_dir.display(), e);
        }
    }
}

fn collect_failures(results: Vec<SegmentResult>) -> SegmentFailures {
    let mut failures = SegmentFailures::default();
    for result in results {
        if let Some(error) = result.error {
            failures.push(result.index, error.to_string());
        }
    }
    failures
}
