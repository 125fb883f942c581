//! Decoding and re-encoding trace headers through schemas.

use approx::assert_relative_eq;
use rstest::rstest;
use segsort_fields::layout::pos;
use segsort_fields::{TRACE_HEADER_LEN, read_i16, read_i32};
use segsort_lib::comm::LocalComm;
use segsort_lib::header::{read_headers, write_headers};
use segsort_lib::keys::MetaKey;
use segsort_lib::metadata::TraceMetadata;
use segsort_lib::schema::{ExtentMode, Schema};
use segsort_lib::sort::SortType;

use crate::helpers::{SyntheticTrace, decode_with_schema, encode_traces, random_traces};

fn assert_matches_trace(store: &TraceMetadata, record: usize, trace: &SyntheticTrace) {
    assert_eq!(store.get_integer(record, MetaKey::Inline).unwrap(), trace.inline);
    assert_eq!(store.get_integer(record, MetaKey::Crossline).unwrap(), trace.crossline);
    assert_eq!(store.get_integer(record, MetaKey::Offset).unwrap(), trace.offset);
    assert_relative_eq!(store.get_floating_point(record, MetaKey::SrcX).unwrap(), trace.src_x);
    assert_relative_eq!(store.get_floating_point(record, MetaKey::SrcY).unwrap(), trace.src_y);
    assert_relative_eq!(store.get_floating_point(record, MetaKey::RcvX).unwrap(), trace.rcv_x);
    assert_relative_eq!(store.get_floating_point(record, MetaKey::RcvY).unwrap(), trace.rcv_y);
}

#[test]
fn test_default_schema_decodes_generated_headers() {
    let traces = random_traces(1, 20);
    let schema = Schema::with_defaults(ExtentMode::Full);
    let store = decode_with_schema(&LocalComm::solo(), schema, &encode_traces(&traces));
    for (i, trace) in traces.iter().enumerate() {
        assert_matches_trace(&store, i, trace);
        assert_eq!(store.get_index(i, MetaKey::Gtn).unwrap(), i);
    }
}

#[test]
fn test_reencoded_headers_decode_to_same_values() {
    let traces = random_traces(2, 12);
    let schema = Schema::with_defaults(ExtentMode::Full).into_shared();
    let mut store = TraceMetadata::new(schema, traces.len());
    read_headers(&mut store, 0, &encode_traces(&traces)).unwrap();

    let mut headers = vec![0u8; traces.len() * TRACE_HEADER_LEN];
    write_headers(&store, 0, traces.len(), &mut headers).unwrap();

    let mut back = TraceMetadata::new(std::sync::Arc::clone(store.schema()), traces.len());
    read_headers(&mut back, 0, &headers).unwrap();
    for (i, trace) in traces.iter().enumerate() {
        assert_matches_trace(&back, i, trace);
    }
}

#[test]
fn test_fractional_coordinate_roundtrip() {
    let schema = Schema::from_keys(&[MetaKey::SrcX], ExtentMode::Tight).unwrap().into_shared();
    let mut store = TraceMetadata::new(schema, 1);
    store.set_floating_point(0, MetaKey::SrcX, 1234.5).unwrap();

    let mut header = vec![0u8; TRACE_HEADER_LEN];
    write_headers(&store, 0, 1, &mut header).unwrap();
    assert_eq!(read_i16(&header, pos::COORD_SCALAR), -10);
    assert_eq!(read_i32(&header, pos::SRC_X), 12345);
}

#[test]
fn test_copied_headers_keep_unmapped_bytes_through_a_sort_layout() {
    let traces = random_traces(4, 3);
    let mut input = encode_traces(&traces);
    for (i, header) in input.chunks_exact_mut(TRACE_HEADER_LEN).enumerate() {
        header[230] = 0xC0 + i as u8;
    }

    let mut schema = SortType::LineROff.schema(ExtentMode::Tight).unwrap();
    schema.add_copy();
    let mut store = decode_with_schema(&LocalComm::solo(), schema, &input);
    store.set_integer(1, MetaKey::Offset, 4321).unwrap();

    let mut output = vec![0u8; input.len()];
    write_headers(&store, 0, traces.len(), &mut output).unwrap();
    for (i, header) in output.chunks_exact(TRACE_HEADER_LEN).enumerate() {
        assert_eq!(header[230], 0xC0 + i as u8);
    }
    assert_eq!(read_i32(&output[TRACE_HEADER_LEN..], pos::OFFSET), 4321);
    assert_eq!(&output[..TRACE_HEADER_LEN], &input[..TRACE_HEADER_LEN]);
}

#[rstest]
#[case::full_defaults(Schema::with_defaults(ExtentMode::Full), 240)]
#[case::tight_inline(Schema::from_keys(&[MetaKey::Inline], ExtentMode::Tight).unwrap(), 4)]
#[case::tight_line_roff(SortType::LineROff.schema(ExtentMode::Tight).unwrap(), 160)]
fn test_extent(#[case] schema: Schema, #[case] expected: usize) {
    assert_eq!(schema.extent(), expected);
}
