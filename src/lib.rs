//! rangefetch: 把远程文件切成 N 个连续字节区间，并发下载后按序合并成一个文件

pub mod cli;
pub mod config;
pub mod core;
pub mod ui;
pub mod utils;

pub use crate::core::{DownloadError, DownloadOptions, DownloadReport, DownloadTask, Downloader};
