//! Range chunker: split sorted response ids into contiguous bounded runs

use serde::{Deserialize, Serialize};

/// Inclusive range of consecutive response ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRange {
    pub first: i64,
    pub last: i64,
}

impl IdRange {
    pub fn new(first: i64, last: i64) -> Self {
        Self { first, last }
    }

    /// Number of ids in the range
    pub fn len(&self) -> u64 {
        (self.last - self.first + 1) as u64
    }

    pub fn is_empty(&self) -> bool {
        self.last < self.first
    }
}

impl From<(i64, i64)> for IdRange {
    fn from((first, last): (i64, i64)) -> Self {
        Self { first, last }
    }
}

/// Partition ascending `ids` into gap-free runs of at most `max_run` ids.
///
/// A run closes when the next id is not `previous + 1` or when it already
/// holds `max_run` ids. A `max_run` of 0 is treated as 1.
pub fn chunk_contiguous(ids: &[i64], max_run: usize) -> Vec<IdRange> {
    let max_run = max_run.max(1);
    let mut ranges = Vec::new();

    let mut iter = ids.iter().copied();
    let Some(first) = iter.next() else {
        return ranges;
    };

    let (mut start, mut previous, mut count) = (first, first, 1usize);
    for id in iter {
        if id == previous + 1 && count < max_run {
            previous = id;
            count += 1;
        } else {
            ranges.push(IdRange::new(start, previous));
            start = id;
            previous = id;
            count = 1;
        }
    }
    ranges.push(IdRange::new(start, previous));

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pairs(ranges: &[IdRange]) -> Vec<(i64, i64)> {
        ranges.iter().map(|r| (r.first, r.last)).collect()
    }

    #[test]
    fn test_gap_and_limit() {
        let ranges = chunk_contiguous(&[1, 2, 3, 5, 6, 9], 2);
        assert_eq!(pairs(&ranges), vec![(1, 2), (3, 3), (5, 6), (9, 9)]);
    }

    #[test]
    fn test_singletons() {
        let ranges = chunk_contiguous(&[4, 5, 6], 1);
        assert_eq!(pairs(&ranges), vec![(4, 4), (5, 5), (6, 6)]);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(chunk_contiguous(&[], 10).is_empty());
        assert_eq!(pairs(&chunk_contiguous(&[7], 10)), vec![(7, 7)]);
    }

    #[test]
    fn test_zero_limit_behaves_like_one() {
        assert_eq!(chunk_contiguous(&[1, 2], 0), chunk_contiguous(&[1, 2], 1));
    }

    #[test]
    fn test_long_run_is_split() {
        let ids: Vec<i64> = (1..=25).collect();
        let ranges = chunk_contiguous(&ids, 10);
        assert_eq!(pairs(&ranges), vec![(1, 10), (11, 20), (21, 25)]);
    }

    fn sorted_ids() -> impl Strategy<Value = Vec<i64>> {
        proptest::collection::btree_set(0i64..500, 0..120)
            .prop_map(|set| set.into_iter().collect())
    }

    proptest! {
        #[test]
        fn prop_chunks_partition_ids(ids in sorted_ids(), max_run in 1usize..15) {
            let ranges = chunk_contiguous(&ids, max_run);

            let mut covered = Vec::new();
            for range in &ranges {
                prop_assert!(range.first <= range.last);
                prop_assert!(range.len() as usize <= max_run);
                covered.extend(range.first..=range.last);
            }
            // Exact cover in order: every range is gap-free over existing ids
            prop_assert_eq!(covered, ids);

            for pair in ranges.windows(2) {
                prop_assert!(pair[0].last < pair[1].first);
            }
        }
    }
}
