//! Multi-rank sorts checked against a single-rank sort of the same records.

use rstest::rstest;
use segsort_lib::comm::{Communicator, LocalComm, run_ranks};
use segsort_lib::keys::MetaKey;
use segsort_lib::sort::{SortConfig, SortType, distributed_sort, verify_global_order};

use crate::helpers::{
    assert_permutation, assert_rank_monotone, decode_for_sort, encode_traces, random_traces,
    split_by_sizes, tags_of,
};

/// Global tags in sorted order, computed by one rank holding every record.
fn reference_order(sort: SortType, headers: &[u8]) -> Vec<usize> {
    let comm = LocalComm::solo();
    let mut store = decode_for_sort(&comm, sort, headers);
    let less = sort.comparator(&store).unwrap();
    let outcome = distributed_sort(&comm, &mut store, less.as_ref(), &SortConfig::default()).unwrap();
    assert_eq!(outcome.rounds, 0, "a single rank never exchanges");
    outcome.global_tags
}

#[rstest]
#[case::src_rcv(SortType::SrcRcv)]
#[case::src_off(SortType::SrcOff)]
#[case::src_roff(SortType::SrcROff)]
#[case::rcv_off(SortType::RcvOff)]
#[case::rcv_roff(SortType::RcvROff)]
#[case::line_off(SortType::LineOff)]
#[case::line_roff(SortType::LineROff)]
#[case::off_line(SortType::OffLine)]
fn test_four_ranks_match_single_rank_order(#[case] sort: SortType) {
    let sizes = [7usize, 12, 9, 16];
    let traces = random_traces(11, sizes.iter().sum());
    let expected = reference_order(sort, &encode_traces(&traces));
    let chunks = split_by_sizes(&traces, &sizes);

    let per_rank = run_ranks(sizes.len(), |comm| {
        let mut store = decode_for_sort(&comm, sort, &encode_traces(&chunks[comm.rank()]));
        let less = sort.comparator(&store).unwrap();
        let outcome = distributed_sort(&comm, &mut store, less.as_ref(), &SortConfig::default()).unwrap();
        assert!(verify_global_order(&comm, &store, less.as_ref()).unwrap());
        assert_eq!(outcome.global_tags, tags_of(&store));
        outcome.global_tags
    });

    for (tags, &size) in per_rank.iter().zip(&sizes) {
        assert_eq!(tags.len(), size, "rank sizes must be preserved");
    }
    assert_permutation(&per_rank, expected.len());
    assert_eq!(per_rank.concat(), expected);
}

#[test]
fn test_line_order_is_monotone_across_ranks() {
    let traces = random_traces(5, 60);
    let chunks = split_by_sizes(&traces, &[15, 15, 15, 15]);
    let sort = SortType::LineROff;

    let keys = run_ranks(4, |comm| {
        let mut store = decode_for_sort(&comm, sort, &encode_traces(&chunks[comm.rank()]));
        let less = sort.comparator(&store).unwrap();
        distributed_sort(&comm, &mut store, less.as_ref(), &SortConfig::default()).unwrap();
        (0..store.len())
            .map(|i| {
                (
                    store.get_integer(i, MetaKey::Inline).unwrap(),
                    store.get_integer(i, MetaKey::Crossline).unwrap(),
                    store.get_integer(i, MetaKey::Offset).unwrap(),
                )
            })
            .collect::<Vec<_>>()
    });
    assert_rank_monotone(&keys);
}

#[test]
fn test_sorting_sorted_data_converges_in_one_round() {
    let traces = random_traces(3, 40);
    let chunks = split_by_sizes(&traces, &[10, 10, 10, 10]);
    let sort = SortType::SrcOff;

    let outcomes = run_ranks(4, |comm| {
        let mut store = decode_for_sort(&comm, sort, &encode_traces(&chunks[comm.rank()]));
        let less = sort.comparator(&store).unwrap();
        let first = distributed_sort(&comm, &mut store, less.as_ref(), &SortConfig::default()).unwrap();
        let second = distributed_sort(&comm, &mut store, less.as_ref(), &SortConfig::default()).unwrap();
        (first, second)
    });

    for (first, second) in &outcomes {
        assert_eq!(first.global_tags, second.global_tags);
        assert_eq!(second.rounds, 1);
        assert_eq!(second.changed_rounds, 0);
    }
}

#[rstest]
#[case::half_of_each_rank(2)]
#[case::default_region(4)]
#[case::single_record_region(20)]
fn test_region_divisor_does_not_change_result(#[case] divisor: usize) {
    let sizes = [20usize, 20, 20];
    let traces = random_traces(29, 60);
    let sort = SortType::RcvOff;
    let expected = reference_order(sort, &encode_traces(&traces));
    let chunks = split_by_sizes(&traces, &sizes);
    let config = SortConfig::new().with_region_divisor(divisor).with_min_records_per_rank(1);

    let per_rank = run_ranks(3, |comm| {
        let mut store = decode_for_sort(&comm, sort, &encode_traces(&chunks[comm.rank()]));
        let less = sort.comparator(&store).unwrap();
        distributed_sort(&comm, &mut store, less.as_ref(), &config).unwrap().global_tags
    });
    assert_eq!(per_rank.concat(), expected);
}
