use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use url::Url;

use crate::core::error::{DownloadError, SegmentError};
use crate::core::planner;

/// 临时目录名，位于输出目录之下
pub const TEMP_DIR_NAME: &str = "tmp";

/// 无法从URL推断文件名时使用的默认名称
pub const DEFAULT_FILE_NAME: &str = "downloaded_file";

/// 一次下载所需的全部参数，由 cli 适配层构建后显式传入
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub url: String,
    pub concurrent: bool,
    pub out_dir: PathBuf,
    /// 并发时的分片数，None 表示使用 CPU 核数
    pub threads: Option<usize>,
}

impl DownloadOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            concurrent: false,
            out_dir: PathBuf::from("./"),
            threads: None,
        }
    }

    /// 计算并发度：不并发时固定为 1
    pub fn concurrency(&self) -> usize {
        if !self.concurrent {
            return 1;
        }
        match self.threads {
            Some(n) if n > 0 => n,
            _ => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

/// 下载任务，整个运行期间由 Downloader 持有
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub url: Url,
    pub out_dir: PathBuf,
    pub file_name: String,
    pub concurrency: usize,
    /// 探测后填充
    pub total_size: Option<u64>,
}

impl DownloadTask {
    pub fn new(options: &DownloadOptions) -> Result<Self, DownloadError> {
        let url = Url::parse(&options.url)
            .map_err(|e| DownloadError::InvalidUrl(format!("{} ({})", options.url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DownloadError::InvalidUrl(format!(
                "{} (只支持 HTTP 和 HTTPS 协议)",
                options.url
            )));
        }

        let concurrency = options.concurrency();
        if concurrency == 0 {
            return Err(DownloadError::Config("并发数必须大于0".to_string()));
        }

        let file_name = Self::get_filename_from_url(&url);
        // 输出文件与临时目录同名时合并必然失败，提前拒绝
        if file_name == TEMP_DIR_NAME {
            return Err(DownloadError::Config(format!(
                "文件名 {} 与临时目录冲突",
                file_name
            )));
        }

        Ok(Self {
            file_name,
            url,
            out_dir: options.out_dir.clone(),
            concurrency,
            total_size: None,
        })
    }

    /// 取URL路径的最后一段并解码作为文件名，解码后不能是目录或跨目录的名字
    pub fn get_filename_from_url(url: &Url) -> String {
        url.path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(|s| percent_decode_str(s).decode_utf8_lossy().to_string())
            .filter(|name| {
                !name.trim().is_empty()
                    && name != "."
                    && name != ".."
                    && !name.contains('/')
                    && !name.contains('\\')
            })
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string())
    }

    pub fn output_path(&self) -> PathBuf {
        self.out_dir.join(&self.file_name)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.out_dir.join(TEMP_DIR_NAME)
    }

    /// 分片临时文件路径：`<outDir>/tmp/<filename>-<index>`
    pub fn segment_path(&self, index: usize) -> PathBuf {
        self.temp_dir().join(format!("{}-{}", self.file_name, index))
    }

    /// 按已探测的文件大小划分分片
    pub fn plan(&self, file_size: u64) -> Vec<Segment> {
        planner::plan_segments(file_size, self.concurrency)
            .into_iter()
            .enumerate()
            .map(|(index, (start, end))| Segment {
                index,
                start,
                end,
                path: self.segment_path(index),
            })
            .collect()
    }
}

/// 一个分片，字节区间为左闭右开 `[start, end)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub start: u64,
    pub end: u64,
    pub path: PathBuf,
}

impl Segment {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Range 请求头的值，HTTP 的区间上界是闭区间
    pub fn range_header(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(format!("bytes={}-{}", self.start, self.end - 1))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// 每个 worker 产出一次，由 Downloader 消费一次
#[derive(Debug)]
pub struct SegmentResult {
    pub index: usize,
    pub bytes: u64,
    pub error: Option<SegmentError>,
}

impl SegmentResult {
    pub fn success(index: usize, bytes: u64) -> Self {
        Self { index, bytes, error: None }
    }

    pub fn failure(index: usize, error: SegmentError) -> Self {
        Self { index, bytes: 0, error: Some(error) }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
