use indicatif::{ProgressBar, ProgressStyle};
#[cfg(test)]
use indicatif::ProgressDrawTarget;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// 进度上报接口，所有 worker 并发调用，实现必须是线程安全的。
/// 下载流程的正确性不依赖于它是否存在。
pub trait ProgressSink: Send + Sync {
    /// 探测到文件总大小后调用一次
    fn start(&self, _total: u64) {}

    fn advance(&self, bytes: u64);

    fn finish(&self) {}

    /// 下载失败时调用，代替 finish
    fn abandon(&self) {}
}

// 结构体：ProgressManager
// 基于 indicatif 的终端进度条
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{msg} [{bar:30.green/white}] {bytes}/{total_bytes} ({bytes_per_sec}, ETA {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
        bar.set_style(style);
        bar.set_message("下载中...");
        Self { bar }
    }
}

#[cfg(test)]
impl ProgressManager {
    /// 不绘制的进度条，仍然计数
    fn hidden() -> Self {
        let manager = Self::new();
        manager.bar.set_draw_target(ProgressDrawTarget::hidden());
        manager
    }

    fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ProgressManager {
    fn start(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
    }

    fn advance(&self, bytes: u64) {
        self.bar.inc(bytes);
    }

    fn finish(&self) {
        self.bar.finish_with_message("下载完成");
    }

    fn abandon(&self) {
        self.bar.abandon_with_message("下载失败");
    }
}

/// 只做计数的进度接收端
#[derive(Debug, Default)]
pub struct ByteCounter {
    total: AtomicU64,
    received: AtomicU64,
    finished: AtomicBool,
    abandoned: AtomicBool,
}

impl ByteCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn is_abandoned(&self) -> bool {
        self.abandoned.load(Ordering::SeqCst)
    }
}

impl ProgressSink for ByteCounter {
    fn start(&self, total: u64) {
        self.total.store(total, Ordering::SeqCst);
    }

    fn advance(&self, bytes: u64) {
        self.received.fetch_add(bytes, Ordering::SeqCst);
    }

    fn finish(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }

    fn abandon(&self) {
        self.abandoned.store(true, Ordering::SeqCst);
    }
}
