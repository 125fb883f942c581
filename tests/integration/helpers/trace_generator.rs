//! Synthetic trace headers for integration tests.
//!
//! Headers are encoded here with the raw field primitives, independently of
//! `segsort_lib::header::write_headers`, so decoding is checked against a
//! second encoder.

#![allow(dead_code)]
#![allow(clippy::cast_precision_loss)]

use rand::SeedableRng;
use rand::distr::{Distribution, Uniform};
use rand::rngs::StdRng;
use segsort_fields::layout::pos;
use segsort_fields::{TRACE_HEADER_LEN, write_i16, write_i32, write_scaled};
use segsort_lib::comm::Communicator;
use segsort_lib::header::read_headers;
use segsort_lib::keys::MetaKey;
use segsort_lib::metadata::TraceMetadata;
use segsort_lib::schema::{ExtentMode, Schema};
use segsort_lib::sort::{SortType, assign_global_tags};

/// Coordinate scale code used for every generated header (two decimals).
pub const COORD_SCALE: i16 = -100;

/// Values of one synthetic trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticTrace {
    pub inline: i64,
    pub crossline: i64,
    pub offset: i64,
    pub src_x: f64,
    pub src_y: f64,
    pub rcv_x: f64,
    pub rcv_y: f64,
}

/// Generate `count` traces from a small grid, so that ties are common.
pub fn random_traces(seed: u64, count: usize) -> Vec<SyntheticTrace> {
    let mut rng = StdRng::seed_from_u64(seed);
    let line = Uniform::new_inclusive(1i64, 6).unwrap();
    let coord = Uniform::new_inclusive(0i64, 40).unwrap();
    let offset = Uniform::new_inclusive(0i64, 8).unwrap();
    (0..count)
        .map(|_| SyntheticTrace {
            inline: line.sample(&mut rng),
            crossline: line.sample(&mut rng),
            offset: offset.sample(&mut rng) * 100,
            src_x: coord.sample(&mut rng) as f64 * 12.5,
            src_y: coord.sample(&mut rng) as f64 * 0.25,
            rcv_x: coord.sample(&mut rng) as f64 * 12.5,
            rcv_y: coord.sample(&mut rng) as f64 * 0.25,
        })
        .collect()
}

/// Encode traces as consecutive 240-byte headers.
pub fn encode_traces(traces: &[SyntheticTrace]) -> Vec<u8> {
    let mut headers = vec![0u8; traces.len() * TRACE_HEADER_LEN];
    for (trace, header) in traces.iter().zip(headers.chunks_exact_mut(TRACE_HEADER_LEN)) {
        write_i32(header, pos::INLINE, trace.inline as i32);
        write_i32(header, pos::CROSSLINE, trace.crossline as i32);
        write_i32(header, pos::OFFSET, trace.offset as i32);
        write_i16(header, pos::COORD_SCALAR, COORD_SCALE);
        write_scaled(header, pos::SRC_X, trace.src_x, COORD_SCALE).unwrap();
        write_scaled(header, pos::SRC_Y, trace.src_y, COORD_SCALE).unwrap();
        write_scaled(header, pos::RCV_X, trace.rcv_x, COORD_SCALE).unwrap();
        write_scaled(header, pos::RCV_Y, trace.rcv_y, COORD_SCALE).unwrap();
    }
    headers
}

/// Decode `headers` into a store laid out for `sort`, with global tags
/// assigned across the group and local trace numbers equal to file position.
pub fn decode_for_sort<C: Communicator>(comm: &C, sort: SortType, headers: &[u8]) -> TraceMetadata {
    decode_with_schema(comm, sort.schema(ExtentMode::Tight).unwrap(), headers)
}

/// Decode `headers` through `schema`, then assign global and local tags.
pub fn decode_with_schema<C: Communicator>(comm: &C, schema: Schema, headers: &[u8]) -> TraceMetadata {
    let count = headers.len() / TRACE_HEADER_LEN;
    let mut store = TraceMetadata::new(schema.into_shared(), count);
    read_headers(&mut store, 0, headers).unwrap();
    let offset = assign_global_tags(comm, &mut store).unwrap();
    for i in 0..count {
        store.set_index(i, MetaKey::Ltn, offset + i).unwrap();
    }
    store
}

/// Split `traces` into consecutive per-rank chunks of the given sizes.
pub fn split_by_sizes(traces: &[SyntheticTrace], sizes: &[usize]) -> Vec<Vec<SyntheticTrace>> {
    assert_eq!(sizes.iter().sum::<usize>(), traces.len());
    let mut rest = traces;
    sizes
        .iter()
        .map(|&n| {
            let (head, tail) = rest.split_at(n);
            rest = tail;
            head.to_vec()
        })
        .collect()
}

/// Global tags of the store, in local order.
pub fn tags_of(store: &TraceMetadata) -> Vec<usize> {
    (0..store.len()).map(|i| store.get_index(i, MetaKey::Gtn).unwrap()).collect()
}
