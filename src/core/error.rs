use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 探测阶段错误：服务器不可达、不支持分段请求或无法得知文件大小
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("探测请求失败: {0}")]
    Request(#[from] reqwest::Error),

    #[error("探测响应状态异常: {0}")]
    UnexpectedStatus(reqwest::StatusCode),

    #[error("服务器不支持分段下载 (range not supported)")]
    RangeNotSupported,

    #[error("服务器未返回有效的文件大小")]
    UnknownLength,
}

/// 单个分片下载失败的原因
#[derive(Error, Debug)]
pub enum SegmentError {
    #[error("网络错误: {0}")]
    Request(#[from] reqwest::Error),

    #[error("服务器返回 {0}，期望 206 Partial Content")]
    UnexpectedStatus(reqwest::StatusCode),

    #[error("分片大小不匹配: 预期 {expected} 字节, 实际 {actual} 字节")]
    LengthMismatch { expected: u64, actual: u64 },

    #[error("临时文件 {path:?} 写入失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("下载任务异常退出: {0}")]
    Join(String),
}

/// 合并阶段错误
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("分片 #{index} 的临时文件缺失: {path:?}")]
    MissingSegment { index: usize, path: PathBuf },

    #[error("合并文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// 所有失败分片的汇总，每个失败分片占一行
#[derive(Debug, Default)]
pub struct SegmentFailures(pub Vec<(usize, String)>);

impl SegmentFailures {
    pub fn push(&mut self, index: usize, message: String) {
        self.0.push((index, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.0.iter().map(|(index, _)| *index).collect()
    }
}

impl fmt::Display for SegmentFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, message) in &self.0 {
            writeln!(f)?;
            write!(f, "分片 #{}: {}", index, message)?;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("无效的URL: {0}")]
    InvalidUrl(String),

    #[error("获取文件大小失败: {0}")]
    Probe(#[from] ProbeError),

    #[error("无法创建临时目录 {path:?}: {source}")]
    TempDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} 个分片下载失败:{}", .0.len(), .0)]
    Segments(SegmentFailures),

    #[error("合并临时文件失败: {0}")]
    Merge(#[from] MergeError),
}

impl DownloadError {
    /// 进程退出码，每类致命错误对应一个不同的非零值
    pub fn exit_code(&self) -> i32 {
        match self {
            DownloadError::Config(_) | DownloadError::InvalidUrl(_) => 2,
            DownloadError::Probe(_) => 3,
            DownloadError::TempDir { .. } => 4,
            DownloadError::Segments(_) => 5,
            DownloadError::Merge(_) => 6,
        }
    }
}

pub type DownloadResult<T> = Result<T, DownloadError>;
