//! 分片规划：把 `[0, file_size)` 切成 n 个首尾相接的左闭右开区间

/// 返回 n 个 `(start, end)` 区间，最后一个分片吸收余数。
///
/// n 为 0 时按 1 处理。
pub fn plan_segments(file_size: u64, n: usize) -> Vec<(u64, u64)> {
    let n = n.max(1) as u64;
    let step = file_size / n;

    (0..n)
        .map(|i| {
            let start = i * step;
            let end = if i == n - 1 { file_size } else { start + step };
            (start, end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(file_size: u64, n: usize) {
        let ranges = plan_segments(file_size, n);
        assert_eq!(ranges.len(), n, "size={} n={}", file_size, n);

        let mut expected_start = 0;
        for &(start, end) in &ranges {
            assert_eq!(start, expected_start, "gap or overlap at size={} n={}", file_size, n);
            assert!(end >= start);
            expected_start = end;
        }
        assert_eq!(expected_start, file_size);

        let total: u64 = ranges.iter().map(|(s, e)| e - s).sum();
        assert_eq!(total, file_size);
    }

    #[test]
    fn test_partition_property() {
        let sizes = [0u64, 1, 2, 3, 7, 999, 1000, 1001, 4096, 1 << 20, (1 << 32) + 17];
        for &size in &sizes {
            for n in 1..=17 {
                assert_partition(size, n);
            }
        }
    }

    #[test]
    fn test_single_segment_covers_whole_file() {
        assert_eq!(plan_segments(1000, 1), vec![(0, 1000)]);
        assert_eq!(plan_segments(0, 1), vec![(0, 0)]);
    }

    #[test]
    fn test_last_segment_absorbs_remainder() {
        assert_eq!(
            plan_segments(1003, 4),
            vec![(0, 250), (250, 500), (500, 750), (750, 1003)]
        );
    }

    #[test]
    fn test_more_segments_than_bytes() {
        assert_eq!(plan_segments(2, 3), vec![(0, 0), (0, 0), (0, 2)]);
    }

    #[test]
    fn test_zero_count_treated_as_one() {
        assert_eq!(plan_segments(10, 0), vec![(0, 10)]);
    }
}
