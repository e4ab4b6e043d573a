//! Core: 分段下载的核心流程，探测、分片、并发下载、合并与错误处理

pub mod downloader;
pub mod error;
pub mod merger;
pub mod planner;
pub mod probe;
pub mod task;
pub mod worker;

pub use downloader::{DownloadReport, Downloader};
pub use error::{DownloadError, DownloadResult, MergeError, ProbeError, SegmentError, SegmentFailures};
pub use task::{DownloadOptions, DownloadTask, Segment, SegmentResult};
