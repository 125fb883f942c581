//! Restoring original file order after a semantic sort.

use segsort_lib::comm::{Communicator, run_ranks};
use segsort_lib::sort::{OrderEntry, SortConfig, SortType, distributed_sort, recover_file_order};

use crate::helpers::{decode_for_sort, encode_traces, random_traces, split_by_sizes};

/// Sort by `sort`, then recover file order; returns (sorted tags, recovered entries) per rank.
fn sort_then_recover(sort: SortType, sizes: &[usize], seed: u64) -> Vec<(Vec<usize>, Vec<OrderEntry>)> {
    let traces = random_traces(seed, sizes.iter().sum());
    let chunks = split_by_sizes(&traces, sizes);
    let config = SortConfig::default();
    run_ranks(sizes.len(), |comm| {
        let mut store = decode_for_sort(&comm, sort, &encode_traces(&chunks[comm.rank()]));
        let less = sort.comparator(&store).unwrap();
        let outcome = distributed_sort(&comm, &mut store, less.as_ref(), &config).unwrap();
        let recovered = recover_file_order(&comm, &outcome.global_tags, &config).unwrap();
        (outcome.global_tags, recovered)
    })
}

#[test]
fn test_recovered_offsets_follow_file_layout() {
    let sizes = [8usize, 14, 10];
    let results = sort_then_recover(SortType::OffLine, &sizes, 17);

    let mut start = 0;
    for ((_, recovered), &size) in results.iter().zip(&sizes) {
        let offsets: Vec<usize> = recovered.iter().map(|e| e.file_offset).collect();
        assert_eq!(offsets, (start..start + size).collect::<Vec<_>>());
        start += size;
    }
}

#[test]
fn test_sort_positions_point_back_into_sorted_order() {
    let results = sort_then_recover(SortType::SrcRcv, &[12, 12, 12, 12], 23);
    let sorted: Vec<usize> = results.iter().flat_map(|(tags, _)| tags.iter().copied()).collect();

    for entry in results.iter().flat_map(|(_, recovered)| recovered) {
        assert_eq!(sorted[entry.sort_position], entry.file_offset);
    }
}
