//! Custom assertion helpers for integration tests.

#![allow(dead_code)]

use std::fmt::Debug;

/// Asserts that per-rank tag lists together hold each of `0..total` exactly once.
///
/// # Panics
///
/// Panics if a tag is missing or duplicated.
pub fn assert_permutation(per_rank: &[Vec<usize>], total: usize) {
    let mut all: Vec<usize> = per_rank.iter().flatten().copied().collect();
    all.sort_unstable();
    assert_eq!(all, (0..total).collect::<Vec<_>>(), "tags are not a permutation of 0..{total}");
}

/// Asserts that every value on a rank is <= every value on any later rank,
/// and that each rank is locally non-decreasing.
///
/// # Panics
///
/// Panics at the first out-of-order pair, naming the ranks involved.
pub fn assert_rank_monotone<T: PartialOrd + Debug>(per_rank: &[Vec<T>]) {
    for (rank, values) in per_rank.iter().enumerate() {
        for pair in values.windows(2) {
            assert!(pair[0] <= pair[1], "rank {rank} is not locally sorted: {pair:?}");
        }
    }
    let non_empty: Vec<(usize, &Vec<T>)> = per_rank.iter().enumerate().filter(|(_, v)| !v.is_empty()).collect();
    for pair in non_empty.windows(2) {
        let (left_rank, left) = pair[0];
        let (right_rank, right) = pair[1];
        let (last, first) = (&left[left.len() - 1], &right[0]);
        assert!(
            last <= first,
            "rank {left_rank} ends with {last:?} but rank {right_rank} starts with {first:?}"
        );
    }
}
