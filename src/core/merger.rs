use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::{self, AsyncWriteExt, BufWriter};

use crate::core::error::MergeError;
use crate::core::task::{DownloadTask, Segment};

const MERGE_BUFFER_SIZE: usize = 1024 * 1024;

/// 按分片序号顺序拼接临时文件，成功后删除临时目录
pub struct Merger;

impl Merger {
    /// 返回写入输出文件的总字节数。
    ///
    /// 出错时删除写了一半的输出文件，临时目录留给调用方处理。
    /// 合并完成后临时目录删除失败不算错误。
    pub async fn merge(task: &DownloadTask, segments: &[Segment]) -> Result<u64, MergeError> {
        let output = task.output_path();

        // 先确认所有分片都在，避免截断已有的输出文件后才发现缺失
        for segment in segments {
            if fs::metadata(segment.path()).await.is_err() {
                return Err(MergeError::MissingSegment {
                    index: segment.index,
                    path: segment.path.clone(),
                });
            }
        }

        match Self::concat(&output, segments).await {
            Ok(written) => {
                // 输出文件已经完整，清理失败只记录
                if let Err(e) = fs::remove_dir_all(task.temp_dir()).await {
                    log::warn!("删除临时目录 {} 失败: {}", task.temp_dir().display(), e);
                }
                log::info!("合并完成: {} ({} 字节)", output.display(), written);
                Ok(written)
            }
            Err(error) => {
                if let Err(e) = fs::remove_file(&output).await {
                    log::warn!("删除未完成的输出文件 {} 失败: {}", output.display(), e);
                }
                Err(error)
            }
        }
    }

    async fn concat(output: &Path, segments: &[Segment]) -> Result<u64, MergeError> {
        let target = File::create(output).await.map_err(io_error(output))?;
        let mut writer = BufWriter::with_capacity(MERGE_BUFFER_SIZE, target);
        let mut written = 0u64;

        let mut ordered: Vec<&Segment> = segments.iter().collect();
        ordered.sort_by_key(|s| s.index);

        for segment in ordered {
            let mut part = File::open(segment.path()).await.map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    MergeError::MissingSegment {
                        index: segment.index,
                        path: segment.path.clone(),
                    }
                } else {
                    MergeError::Io {
                        path: segment.path.clone(),
                        source,
                    }
                }
            })?;
            let copied = io::copy(&mut part, &mut writer)
                .await
                .map_err(io_error(segment.path()))?;
            log::debug!("合并分片 #{}: {} 字节", segment.index, copied);
            written += copied;
        }

        writer.flush().await.map_err(io_error(output))?;
        writer
            .into_inner()
            .sync_all()
            .await
            .map_err(io_error(output))?;
        Ok(written)
    }

    /// 删除临时目录，目录不存在时视为成功
    pub async fn discard(temp_dir: &Path) -> Result<(), std::io::Error> {
        match fs::remove_dir_all(temp_dir).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> MergeError {
    let path = path.to_path_buf();
    move |source| MergeError::Io { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::DownloadOptions;

    fn task_in(dir: &Path, threads: usize) -> DownloadTask {
        let options = DownloadOptions {
            url: "https://example.com/data/archive.bin".to_string(),
            concurrent: true,
            out_dir: dir.to_path_buf(),
            threads: Some(threads),
        };
        DownloadTask::new(&options).unwrap()
    }

    fn write_parts(task: &DownloadTask, data: &[u8]) -> Vec<Segment> {
        std::fs::create_dir_all(task.temp_dir()).unwrap();
        let segments = task.plan(data.len() as u64);
        for segment in &segments {
            std::fs::write(
                &segment.path,
                &data[segment.start as usize..segment.end as usize],
            )
            .unwrap();
        }
        segments
    }

    #[tokio::test]
    async fn test_merge_in_index_order() {
        let dir = tempfile::tempdir().unwrap();
        let task = task_in(dir.path(), 4);
        let data: Vec<u8> = (0..1003u32).map(|i| (i % 251) as u8).collect();
        let mut segments = write_parts(&task, &data);
        segments.reverse();

        let written = Merger::merge(&task, &segments).await.unwrap();
        assert_eq!(written, 1003);
        assert_eq!(std::fs::read(task.output_path()).unwrap(), data);
        assert!(!task.temp_dir().exists());
    }

    #[tokio::test]
    async fn test_merge_truncates_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let task = task_in(dir.path(), 2);
        std::fs::write(task.output_path(), vec![0xffu8; 4096]).unwrap();
        let segments = write_parts(&task, b"hello world");

        Merger::merge(&task, &segments).await.unwrap();
        assert_eq!(std::fs::read(task.output_path()).unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_missing_segment_aborts_before_output() {
        let dir = tempfile::tempdir().unwrap();
        let task = task_in(dir.path(), 3);
        let segments = write_parts(&task, b"abcdefghi");
        std::fs::remove_file(&segments[1].path).unwrap();

        let result = Merger::merge(&task, &segments).await;
        assert!(matches!(result, Err(MergeError::MissingSegment { index: 1, .. })));
        assert!(!task.output_path().exists());
        assert!(task.temp_dir().exists());
    }

    #[tokio::test]
    async fn test_cleanup_failure_keeps_completed_output() {
        let dir = tempfile::tempdir().unwrap();
        let task = task_in(dir.path(), 2);
        // 分片放在别处，task 的临时目录不存在，删除必然失败
        let parts = dir.path().join("parts");
        std::fs::create_dir_all(&parts).unwrap();
        let segments: Vec<Segment> = task
            .plan(6)
            .into_iter()
            .map(|mut segment| {
                segment.path = parts.join(format!("part-{}", segment.index));
                segment
            })
            .collect();
        std::fs::write(&segments[0].path, b"abc").unwrap();
        std::fs::write(&segments[1].path, b"def").unwrap();
        assert!(!task.temp_dir().exists());

        let written = Merger::merge(&task, &segments).await.unwrap();
        assert_eq!(written, 6);
        assert_eq!(std::fs::read(task.output_path()).unwrap(), b"abcdef");
    }

    #[test]
    fn test_discard_missing_dir_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(tokio_test::block_on(Merger::discard(&dir.path().join("tmp"))).is_ok());
    }
}
