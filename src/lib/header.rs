//! Decoding and encoding of raw trace headers through a schema.
//!
//! This is where a [`Schema`](crate::schema::Schema) meets the bytes: each
//! physical entry is read from (or written to) a 240-byte SEG-Y trace header
//! with the big-endian primitives from [`segsort_fields`]. Index entries have
//! no bytes and are left alone in both directions.
//!
//! # Shared scale fields
//!
//! Several scaled coordinates usually share one scale field (source and
//! receiver x/y all use the coordinate scalar at byte 71). When encoding, all
//! float values of one record that share a scale position are grouped and get
//! a single code from [`group_scale`], which is written once. Scaled fields are
//! written after plain integer fields, so a scale chosen for the group wins
//! over a `Short` entry bound to the same position.

use std::collections::BTreeMap;

use segsort_fields::{
    TRACE_HEADER_LEN, group_scale, read_i16, read_i32, read_scaled, write_i16, write_i32,
    write_scaled,
};

use crate::errors::{Result, SegsortError};
use crate::metadata::TraceMetadata;
use crate::schema::FieldDescriptor;

/// Decode consecutive trace headers into records `first..` of `store`.
///
/// `headers` must hold a whole number of 240-byte headers. Returns the number
/// of records decoded.
///
/// # Errors
///
/// Returns an error if `headers` is not a multiple of the header length or
/// the records would overrun the store.
pub fn read_headers(store: &mut TraceMetadata, first: usize, headers: &[u8]) -> Result<usize> {
    if headers.len() % TRACE_HEADER_LEN != 0 {
        return Err(SegsortError::BufferTooShort {
            required: headers.len().next_multiple_of(TRACE_HEADER_LEN),
            actual: headers.len(),
        });
    }
    let count = headers.len() / TRACE_HEADER_LEN;
    check_span(store, first, count)?;

    let schema = std::sync::Arc::clone(store.schema());
    for (i, header) in headers.chunks_exact(TRACE_HEADER_LEN).enumerate() {
        let record = first + i;
        for (key, entry) in schema.iter() {
            match entry.descriptor {
                FieldDescriptor::Integer { pos } => {
                    store.set_integer(record, key, i64::from(read_i32(header, pos)))?;
                }
                FieldDescriptor::Short { pos } => {
                    store.set_integer(record, key, i64::from(read_i16(header, pos)))?;
                }
                FieldDescriptor::ScaledFloat { pos, scale_pos } => {
                    store.set_floating_point(record, key, read_scaled(header, pos, scale_pos))?;
                }
                FieldDescriptor::Index => {}
                FieldDescriptor::Copy => store.raw_header_mut(record)?.copy_from_slice(header),
            }
        }
    }
    Ok(count)
}

/// Encode `count` records starting at `first` into consecutive trace headers.
///
/// Bytes not covered by the schema are left as they are in `headers`, unless
/// the schema buffers raw headers, in which case the raw header is written
/// first and decoded fields are overlaid on it.
///
/// # Errors
///
/// Returns an error if `headers` is too short, the records overrun the store,
/// an integer does not fit its field width, or a coordinate group cannot be
/// scaled.
pub fn write_headers(
    store: &TraceMetadata,
    first: usize,
    count: usize,
    headers: &mut [u8],
) -> Result<()> {
    let required = count * TRACE_HEADER_LEN;
    if headers.len() < required {
        return Err(SegsortError::BufferTooShort { required, actual: headers.len() });
    }
    check_span(store, first, count)?;

    let schema = store.schema();
    let mut groups: BTreeMap<usize, Vec<(usize, f64)>> = BTreeMap::new();
    for (i, header) in headers[..required].chunks_exact_mut(TRACE_HEADER_LEN).enumerate() {
        let record = first + i;
        if schema.has_copy() {
            header.copy_from_slice(store.raw_header(record)?);
        }

        groups.clear();
        for (key, entry) in schema.iter() {
            match entry.descriptor {
                FieldDescriptor::Integer { pos } => {
                    let value = store.get_integer(record, key)?;
                    let v = i32::try_from(value)
                        .map_err(|_| SegsortError::ValueOutOfRange { key, value, width: 4 })?;
                    write_i32(header, pos, v);
                }
                FieldDescriptor::Short { pos } => {
                    let value = store.get_integer(record, key)?;
                    let v = i16::try_from(value)
                        .map_err(|_| SegsortError::ValueOutOfRange { key, value, width: 2 })?;
                    write_i16(header, pos, v);
                }
                FieldDescriptor::ScaledFloat { pos, scale_pos } => {
                    groups
                        .entry(scale_pos)
                        .or_default()
                        .push((pos, store.get_floating_point(record, key)?));
                }
                FieldDescriptor::Index | FieldDescriptor::Copy => {}
            }
        }

        for (&scale_pos, fields) in &groups {
            let values: Vec<f64> = fields.iter().map(|&(_, v)| v).collect();
            let code = group_scale(&values)?;
            write_i16(header, scale_pos, code);
            for &(pos, value) in fields {
                write_scaled(header, pos, value, code)?;
            }
        }
    }
    Ok(())
}

fn check_span(store: &TraceMetadata, first: usize, count: usize) -> Result<()> {
    if first + count > store.len() {
        return Err(SegsortError::RecordOutOfRange {
            index: (first + count).saturating_sub(1),
            len: store.len(),
        });
    }
    Ok(())
}
