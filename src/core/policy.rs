//! Size based strategy selection.

use super::types::{ByteRange, TransportMode};

/// Payloads above this size go multipart (8 MiB).
pub const DEFAULT_MULTIPART_THRESHOLD: u64 = 8 * 1024 * 1024;

/// Smallest part the storage service accepts for non-final parts (5 MiB).
pub const DEFAULT_PART_SIZE: u64 = 5 * 1024 * 1024;

/// How one payload will be transferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPlan {
    Single,
    Multipart {
        part_size: u64,
        /// Index `i` holds the range of part number `i + 1`.
        ranges: Vec<ByteRange>,
    },
}

impl UploadPlan {
    pub fn mode(&self) -> TransportMode {
        match self {
            UploadPlan::Single => TransportMode::Single,
            UploadPlan::Multipart { .. } => TransportMode::Multipart,
        }
    }

    pub fn part_count(&self) -> usize {
        match self {
            UploadPlan::Single => 1,
            UploadPlan::Multipart { ranges, .. } => ranges.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdPolicy {
    threshold: u64,
    part_size: u64,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MULTIPART_THRESHOLD,
            part_size: DEFAULT_PART_SIZE,
        }
    }
}

impl ThresholdPolicy {
    /// A zero part size is clamped to one byte so planning stays total. A
    /// `threshold` below `part_size` lets a multipart plan have one part;
    /// [`Config`](crate::Config) rejects that combination.
    pub fn new(threshold: u64, part_size: u64) -> Self {
        Self {
            threshold,
            part_size: part_size.max(1),
        }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn part_size(&self) -> u64 {
        self.part_size
    }

    pub fn plan(&self, size: u64) -> UploadPlan {
        if size <= self.threshold {
            return UploadPlan::Single;
        }

        UploadPlan::Multipart {
            part_size: self.part_size,
            ranges: partition(size, self.part_size),
        }
    }
}

/// Splits `[0, size)` into `ceil(size / part_size)` contiguous ranges. The last
/// one takes the remainder, or a full part when the remainder is zero.
pub fn partition(size: u64, part_size: u64) -> Vec<ByteRange> {
    let part_size = part_size.max(1);
    let count = size.div_ceil(part_size);
    let mut ranges = Vec::with_capacity(count as usize);
    let mut offset = 0;

    while offset < size {
        let end = offset + std::cmp::min(part_size, size - offset);
        ranges.push(ByteRange::new(offset, end));
        offset = end;
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    fn assert_partition(size: u64, part_size: u64) {
        let ranges = partition(size, part_size);
        let expected = size.div_ceil(part_size);
        assert_eq!(ranges.len() as u64, expected, "size {} part {}", size, part_size);

        let mut expected_start = 0;
        for range in &ranges {
            assert_eq!(range.start, expected_start);
            assert!(range.len() > 0);
            assert!(range.len() <= part_size);
            expected_start = range.end;
        }
        assert_eq!(expected_start, size);
    }

    #[test]
    fn test_partition_covers_payload() {
        for size in [1, 2, 7, 8, 9, 63, 64, 65, 1000, 4096] {
            for part_size in [1, 2, 3, 8, 64, 100, 5000] {
                assert_partition(size, part_size);
            }
        }
        assert_partition(12 * MB, 5 * MB);
        assert_partition(15 * MB, 5 * MB);
    }

    #[test]
    fn test_partition_of_zero_is_empty() {
        assert!(partition(0, 5 * MB).is_empty());
    }

    #[test]
    fn test_exact_multiple_keeps_full_last_part() {
        let ranges = partition(15 * MB, 5 * MB);
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[2].len(), 5 * MB);
    }

    #[test]
    fn test_threshold_boundary() {
        let policy = ThresholdPolicy::new(8 * MB, 5 * MB);

        assert_eq!(policy.plan(8 * MB), UploadPlan::Single);

        let plan = policy.plan(8 * MB + 1);
        assert_eq!(plan.mode(), TransportMode::Multipart);
        assert!(plan.part_count() >= 2);
    }

    #[test]
    fn test_twelve_megabytes_split_five_five_two() {
        let plan = ThresholdPolicy::default().plan(12 * MB);
        match plan {
            UploadPlan::Multipart { part_size, ranges } => {
                assert_eq!(part_size, 5 * MB);
                let sizes: Vec<u64> = ranges.iter().map(|r| r.len()).collect();
                assert_eq!(sizes, vec![5 * MB, 5 * MB, 2 * MB]);
            }
            UploadPlan::Single => panic!("expected multipart"),
        }
    }

    #[test]
    fn test_zero_bytes_is_single() {
        assert_eq!(ThresholdPolicy::default().plan(0), UploadPlan::Single);
    }

    #[test]
    fn test_zero_part_size_is_clamped() {
        let policy = ThresholdPolicy::new(0, 0);
        assert_eq!(policy.part_size(), 1);
        assert_eq!(policy.plan(3).part_count(), 3);
    }
}
