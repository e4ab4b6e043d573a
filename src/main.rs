use clap::Parser;
use log::LevelFilter;
use std::sync::Arc;

use rangefetch::cli::Args;
use rangefetch::core::{DownloadError, DownloadTask, Downloader};
use rangefetch::ui::{self, DownloadSummary, ProgressManager};
use rangefetch::utils::logger;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        log::error!("{}", e);
        ui::print_error(&e.to_string());
        std::process::exit(e.exit_code());
    }
}

async fn run(args: Args) -> Result<(), DownloadError> {
    // 解析参数和配置
    let config = args.load_config()?;

    if args.init_config {
        config.save_with_tutorial(&args.config)?;
        ui::print_success(&format!("配置文件已写入: {}", args.config));
        return Ok(());
    }

    let level = config.log_level.parse().unwrap_or(LevelFilter::Warn);
    logger::init_logger(level, &config.log_file)
        .map_err(|e| DownloadError::Config(format!("无法初始化日志: {}", e)))?;
    log::info!("配置文件路径: {}", args.config);
    log::debug!("{}", config.get_summary());

    let options = args.to_options(&config)?;
    let mut task = DownloadTask::new(&options)?;

    let mut downloader = Downloader::new(&config)?;
    if config.show_progress {
        downloader = downloader.with_progress(Arc::new(ProgressManager::new()));
    }

    let report = downloader.run(&mut task).await?;

    ui::print_success(&format!("[{}] 下载完成", task.file_name));
    println!(
        "{}",
        DownloadSummary {
            output: report.output,
            total_size: report.total_size,
            segments: report.segments,
            elapsed_time: report.elapsed,
        }
    );
    Ok(())
}
