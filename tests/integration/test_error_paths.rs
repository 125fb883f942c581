//! Failures that every rank of a group must observe together.

use segsort_lib::SegsortError;
use segsort_lib::comm::{Communicator, LocalGroup, MessageTag, run_ranks};
use segsort_lib::keys::MetaKey;
use segsort_lib::metadata::TraceMetadata;
use segsort_lib::schema::{ExtentMode, Schema};
use segsort_lib::sort::{SortConfig, SortOutcome, SortPhase, SortType, assign_global_tags, distributed_sort};

use crate::helpers::{Fault, FaultyComm, decode_for_sort, encode_traces, random_traces};

#[test]
fn test_float_accessor_on_integer_field_is_type_mismatch() {
    let schema = Schema::from_keys(&[MetaKey::Inline], ExtentMode::Tight).unwrap().into_shared();
    let store = TraceMetadata::new(schema, 1);
    let err = store.get_floating_point(0, MetaKey::Inline).unwrap_err();
    assert!(matches!(err, SegsortError::TypeMismatch { key: MetaKey::Inline, .. }));
}

#[test]
fn test_comparator_rejects_coordinate_stored_as_integer() {
    let mut schema = SortType::SrcRcv.schema(ExtentMode::Full).unwrap();
    schema.add_integer(MetaKey::SrcX, 73).unwrap();
    let store = TraceMetadata::new(schema.into_shared(), 0);
    let err = SortType::SrcRcv.comparator(&store).err().unwrap();
    assert!(matches!(err, SegsortError::TypeMismatch { key: MetaKey::SrcX, .. }));
}

#[test]
fn test_comparator_requires_every_sort_key() {
    let schema = Schema::from_keys(&[MetaKey::Inline, MetaKey::Crossline, MetaKey::Gtn], ExtentMode::Tight)
        .unwrap()
        .into_shared();
    let store = TraceMetadata::new(schema, 0);
    let err = SortType::LineROff.comparator(&store).err().unwrap();
    assert!(matches!(err, SegsortError::UnknownKey { key: MetaKey::Offset }));
}

#[test]
fn test_too_few_records_fails_on_every_rank() {
    let traces = random_traces(9, 6);
    let results = run_ranks(2, |comm| {
        let chunk = &traces[comm.rank() * 3..comm.rank() * 3 + 3];
        let mut store = decode_for_sort(&comm, SortType::LineOff, &encode_traces(chunk));
        let less = SortType::LineOff.comparator(&store).unwrap();
        distributed_sort(&comm, &mut store, less.as_ref(), &SortConfig::default())
    });
    for (rank, result) in results.iter().enumerate() {
        match result {
            Err(SegsortError::InsufficientRecords { rank: r, min_local: 3, required: 4 }) => assert_eq!(*r, rank),
            other => panic!("rank {rank}: unexpected result {other:?}"),
        }
    }
}

#[test]
fn test_out_of_step_ranks_report_lockstep_violation() {
    let results = run_ranks(2, |comm| {
        if comm.rank() == 0 {
            comm.send(1, MessageTag::new("send-right", 2), vec![0; 8]).map(|()| Vec::new())
        } else {
            comm.recv(0, MessageTag::new("send-right", 3))
        }
    });
    let err = results[1].as_ref().unwrap_err();
    assert!(matches!(err, SegsortError::LockstepViolation { .. }));
    assert!(err.to_string().contains("send-right of round 3"));
}

#[test]
fn test_sort_against_departed_rank_is_communication_error() {
    let traces = random_traces(13, 8);
    let mut group = LocalGroup::new(2);
    let comm = group.remove(0);
    drop(group);

    let schema = SortType::LineROff.schema(ExtentMode::Tight).unwrap().into_shared();
    let mut store = TraceMetadata::new(schema, traces.len());
    let less = SortType::LineROff.comparator(&store).unwrap();
    let err = distributed_sort(&comm, &mut store, less.as_ref(), &SortConfig::default()).unwrap_err();
    assert!(matches!(err, SegsortError::Communication { .. }), "unexpected error {err:?}");
}

/// Sort three ranks of eight globally reversed records, with `fault` applied
/// to rank 1's send-right message of round 2.
fn sort_with_fault(fault: Fault) -> Vec<segsort_lib::Result<SortOutcome>> {
    let schema = Schema::from_keys(&[MetaKey::Inline, MetaKey::Gtn], ExtentMode::Tight).unwrap().into_shared();
    let target = MessageTag::for_phase(SortPhase::SendRight, 2);
    let by_inline = |s: &TraceMetadata, a: usize, b: usize| {
        let key = |i| (s.get_integer(i, MetaKey::Inline).unwrap(), s.get_index(i, MetaKey::Gtn).unwrap());
        key(a) < key(b)
    };
    run_ranks(3, |comm| {
        let injected = (comm.rank() == 1).then_some((target, fault));
        let comm = FaultyComm::new(comm, injected);
        let mut store = TraceMetadata::new(std::sync::Arc::clone(&schema), 8);
        let offset = assign_global_tags(&comm, &mut store).unwrap();
        for i in 0..8 {
            store.set_integer(i, MetaKey::Inline, 100 - (offset + i) as i64).unwrap();
        }
        distributed_sort(&comm, &mut store, &by_inline, &SortConfig::default())
    })
}

#[test]
fn test_failed_send_inside_a_round_stops_every_rank() {
    let results = sort_with_fault(Fault::FailSend);
    assert!(results.iter().all(Result::is_err), "every rank must fail: {results:?}");
    let err = results[1].as_ref().unwrap_err();
    let SegsortError::Communication { operation, direction, .. } = err else {
        panic!("unexpected error on rank 1: {err:?}");
    };
    assert_eq!(operation, "send-right");
    assert_eq!(direction, "to rank 2");
    assert!(err.to_string().contains("link down"));
    for rank in [0, 2] {
        assert!(
            matches!(results[rank], Err(SegsortError::Communication { .. })),
            "rank {rank}: {:?}",
            results[rank]
        );
    }
}

#[test]
fn test_short_region_inside_a_round_is_communication_error() {
    let results = sort_with_fault(Fault::EmptyPayload);
    assert!(results.iter().all(Result::is_err), "every rank must fail: {results:?}");
    let err = results[2].as_ref().unwrap_err();
    let SegsortError::Communication { operation, direction, .. } = err else {
        panic!("unexpected error on rank 2: {err:?}");
    };
    assert_eq!(operation, "send-right");
    assert_eq!(direction, "from rank 1");
    assert!(err.to_string().contains("expected 2 records, received 0"), "{err}");
}
