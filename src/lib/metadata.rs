//! Columnar trace-metadata record store.
//!
//! A [`TraceMetadata`] holds decoded values for `len` records under one shared
//! [`Schema`]. Values live in one homogeneous vector per [`ColumnKind`]; the
//! value of the entry with ordinal `o` for record `r` sits at
//! `r * count_of_kind + o`.
//!
//! # Typed access
//!
//! The `get_*` / `set_*` accessors check both that the key exists and that it
//! is stored under the accessor's column kind. Reading a scaled coordinate with
//! [`TraceMetadata::get_integer`] is a [`SegsortError::TypeMismatch`], never a
//! silent zero.
//!
//! Hot loops (sort predicates) resolve a [`FieldSlot`] once and then read with
//! the infallible `*_at` accessors.
//!
//! # Wire image
//!
//! [`TraceMetadata::pack_records`] produces a compact little-endian image of a
//! record range (a `u64` record count followed by each record's integer, float,
//! index and raw columns). [`TraceMetadata::unpack_records`] is its inverse and
//! is what the distributed sort sends between ranks.

use std::cmp::Ordering;
use std::ops::Range;
use std::sync::Arc;

use segsort_fields::TRACE_HEADER_LEN;

use crate::errors::{Result, SegsortError};
use crate::keys::MetaKey;
use crate::schema::{ColumnKind, Schema};

/// Size of one packed column value on the wire.
const WORD: usize = 8;

/// A resolved, validated column handle for one key of one store's schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSlot {
    key: MetaKey,
    ordinal: usize,
    stride: usize,
}

impl FieldSlot {
    /// The key this slot reads.
    #[must_use]
    pub fn key(&self) -> MetaKey {
        self.key
    }

    #[inline]
    fn at(&self, record: usize) -> usize {
        record * self.stride + self.ordinal
    }
}

/// Decoded metadata for a fixed number of records.
#[derive(Debug, Clone)]
pub struct TraceMetadata {
    schema: Arc<Schema>,
    len: usize,
    integers: Vec<i64>,
    floats: Vec<f64>,
    indices: Vec<usize>,
    raw: Vec<u8>,
}

impl TraceMetadata {
    /// Create a zero-initialised store of `len` records.
    #[must_use]
    pub fn new(schema: Arc<Schema>, len: usize) -> Self {
        let raw_len = if schema.has_copy() { TRACE_HEADER_LEN } else { 0 };
        Self {
            integers: vec![0; len * schema.count(ColumnKind::Integer)],
            floats: vec![0.0; len * schema.count(ColumnKind::Float)],
            indices: vec![0; len * schema.count(ColumnKind::Index)],
            raw: vec![0; len * raw_len],
            schema,
            len,
        }
    }

    /// A new store with the same schema and `len` records, the first
    /// `min(self.len(), len)` copied from this one.
    #[must_use]
    pub fn resized(&self, len: usize) -> Self {
        let mut out = Self::new(Arc::clone(&self.schema), len);
        for i in 0..self.len.min(len) {
            out.copy_row(i, self, i);
        }
        out
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The schema this store was built with.
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Approximate heap bytes used by the columns.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.len * self.schema.memory_per_record()
    }

    // ========================================================================
    // Typed accessors
    // ========================================================================

    /// Resolve `key` to a column slot, checking it is stored as `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`SegsortError::UnknownKey`] if the schema lacks the key and
    /// [`SegsortError::TypeMismatch`] if it is stored under another kind.
    pub fn slot(&self, key: MetaKey, expected: ColumnKind) -> Result<FieldSlot> {
        let entry = self.schema.entry(key).ok_or(SegsortError::UnknownKey { key })?;
        let found = entry.descriptor.column();
        if found != expected {
            return Err(SegsortError::TypeMismatch { key, expected, found });
        }
        Ok(FieldSlot { key, ordinal: entry.ordinal, stride: self.schema.count(expected) })
    }

    fn locate(&self, record: usize, key: MetaKey, expected: ColumnKind) -> Result<usize> {
        self.check_record(record)?;
        Ok(self.slot(key, expected)?.at(record))
    }

    fn check_record(&self, record: usize) -> Result<()> {
        if record < self.len {
            Ok(())
        } else {
            Err(SegsortError::RecordOutOfRange { index: record, len: self.len })
        }
    }

    /// Integer value of `key` for `record`.
    ///
    /// # Errors
    ///
    /// [`SegsortError::UnknownKey`] if the schema lacks `key`,
    /// [`SegsortError::TypeMismatch`] if it is not stored as an integer, and
    /// [`SegsortError::RecordOutOfRange`] if `record` is past the end.
    pub fn get_integer(&self, record: usize, key: MetaKey) -> Result<i64> {
        Ok(self.integers[self.locate(record, key, ColumnKind::Integer)?])
    }

    /// Set the integer value of `key` for `record`.
    ///
    /// # Errors
    ///
    /// [`SegsortError::UnknownKey`] if the schema lacks `key`,
    /// [`SegsortError::TypeMismatch`] if it is not stored as an integer, and
    /// [`SegsortError::RecordOutOfRange`] if `record` is past the end.
    pub fn set_integer(&mut self, record: usize, key: MetaKey, value: i64) -> Result<()> {
        let at = self.locate(record, key, ColumnKind::Integer)?;
        self.integers[at] = value;
        Ok(())
    }

    /// Floating point value of `key` for `record`.
    ///
    /// # Errors
    ///
    /// [`SegsortError::UnknownKey`] if the schema lacks `key`,
    /// [`SegsortError::TypeMismatch`] if it is not stored as a float, and
    /// [`SegsortError::RecordOutOfRange`] if `record` is past the end.
    pub fn get_floating_point(&self, record: usize, key: MetaKey) -> Result<f64> {
        Ok(self.floats[self.locate(record, key, ColumnKind::Float)?])
    }

    /// Set the floating point value of `key` for `record`.
    ///
    /// # Errors
    ///
    /// [`SegsortError::UnknownKey`] if the schema lacks `key`,
    /// [`SegsortError::TypeMismatch`] if it is not stored as a float, and
    /// [`SegsortError::RecordOutOfRange`] if `record` is past the end.
    pub fn set_floating_point(&mut self, record: usize, key: MetaKey, value: f64) -> Result<()> {
        let at = self.locate(record, key, ColumnKind::Float)?;
        self.floats[at] = value;
        Ok(())
    }

    /// Index value of `key` for `record`.
    ///
    /// # Errors
    ///
    /// [`SegsortError::UnknownKey`] if the schema lacks `key`,
    /// [`SegsortError::TypeMismatch`] if it is not stored as an index, and
    /// [`SegsortError::RecordOutOfRange`] if `record` is past the end.
    pub fn get_index(&self, record: usize, key: MetaKey) -> Result<usize> {
        Ok(self.indices[self.locate(record, key, ColumnKind::Index)?])
    }

    /// Set the index value of `key` for `record`.
    ///
    /// # Errors
    ///
    /// [`SegsortError::UnknownKey`] if the schema lacks `key`,
    /// [`SegsortError::TypeMismatch`] if it is not stored as an index, and
    /// [`SegsortError::RecordOutOfRange`] if `record` is past the end.
    pub fn set_index(&mut self, record: usize, key: MetaKey, value: usize) -> Result<()> {
        let at = self.locate(record, key, ColumnKind::Index)?;
        self.indices[at] = value;
        Ok(())
    }

    /// Raw header bytes buffered for `record`.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema has no Copy entry or `record` is past the end.
    pub fn raw_header(&self, record: usize) -> Result<&[u8]> {
        self.locate(record, MetaKey::Copy, ColumnKind::Raw)?;
        let start = record * TRACE_HEADER_LEN;
        Ok(&self.raw[start..start + TRACE_HEADER_LEN])
    }

    /// Mutable raw header bytes buffered for `record`.
    ///
    /// # Errors
    ///
    /// Same as [`raw_header`](Self::raw_header).
    pub fn raw_header_mut(&mut self, record: usize) -> Result<&mut [u8]> {
        self.locate(record, MetaKey::Copy, ColumnKind::Raw)?;
        let start = record * TRACE_HEADER_LEN;
        Ok(&mut self.raw[start..start + TRACE_HEADER_LEN])
    }

    /// Integer value through a resolved slot. Panics if `record` is out of range.
    #[inline]
    #[must_use]
    pub fn integer_at(&self, slot: FieldSlot, record: usize) -> i64 {
        self.integers[slot.at(record)]
    }

    /// Floating point value through a resolved slot. Panics if `record` is out of range.
    #[inline]
    #[must_use]
    pub fn float_at(&self, slot: FieldSlot, record: usize) -> f64 {
        self.floats[slot.at(record)]
    }

    /// Index value through a resolved slot. Panics if `record` is out of range.
    #[inline]
    #[must_use]
    pub fn index_at(&self, slot: FieldSlot, record: usize) -> usize {
        self.indices[slot.at(record)]
    }

    // ========================================================================
    // Whole-record operations
    // ========================================================================

    /// Copy every field the two schemas have in common from `src[src_index]`
    /// into `self[dst_index]`.
    ///
    /// # Errors
    ///
    /// Returns an error if either index is out of range, or a common key is
    /// stored under different column kinds in the two schemas.
    pub fn copy_entries(&mut self, dst_index: usize, src: &TraceMetadata, src_index: usize) -> Result<()> {
        self.check_record(dst_index)?;
        src.check_record(src_index)?;

        if Arc::ptr_eq(&self.schema, &src.schema) {
            self.copy_row(dst_index, src, src_index);
            return Ok(());
        }

        let schema = Arc::clone(&self.schema);
        for (key, entry) in schema.iter() {
            let Some(src_entry) = src.schema.entry(key) else { continue };
            let kind = entry.descriptor.column();
            let found = src_entry.descriptor.column();
            if kind != found {
                return Err(SegsortError::TypeMismatch { key, expected: kind, found });
            }
            let dst_at = dst_index * schema.count(kind) + entry.ordinal;
            let src_at = src_index * src.schema.count(kind) + src_entry.ordinal;
            match kind {
                ColumnKind::Integer => self.integers[dst_at] = src.integers[src_at],
                ColumnKind::Float => self.floats[dst_at] = src.floats[src_at],
                ColumnKind::Index => self.indices[dst_at] = src.indices[src_at],
                ColumnKind::Raw => {
                    let d = dst_index * TRACE_HEADER_LEN;
                    let s = src_index * TRACE_HEADER_LEN;
                    self.raw[d..d + TRACE_HEADER_LEN]
                        .copy_from_slice(&src.raw[s..s + TRACE_HEADER_LEN]);
                }
            }
        }
        Ok(())
    }

    /// Copy a whole row between stores with identical column layout.
    fn copy_row(&mut self, dst: usize, src: &TraceMetadata, src_index: usize) {
        fn copy<T: Copy>(d: &mut [T], s: &[T], width: usize, dst: usize, src: usize) {
            d[dst * width..(dst + 1) * width].copy_from_slice(&s[src * width..(src + 1) * width]);
        }
        let ni = self.schema.count(ColumnKind::Integer);
        let nf = self.schema.count(ColumnKind::Float);
        let nx = self.schema.count(ColumnKind::Index);
        let nr = if self.schema.has_copy() { TRACE_HEADER_LEN } else { 0 };
        copy(&mut self.integers, &src.integers, ni, dst, src_index);
        copy(&mut self.floats, &src.floats, nf, dst, src_index);
        copy(&mut self.indices, &src.indices, nx, dst, src_index);
        copy(&mut self.raw, &src.raw, nr, dst, src_index);
    }

    /// Stable-sort the records in `range` with a strict-weak-order predicate.
    ///
    /// `less(store, i, j)` compares records `i` and `j` of `store`.
    ///
    /// # Panics
    ///
    /// Panics if `range` extends past the end of the store.
    pub fn sort_range_by<F>(&mut self, range: Range<usize>, less: &F)
    where
        F: Fn(&TraceMetadata, usize, usize) -> bool + ?Sized,
    {
        assert!(range.end <= self.len, "sort range {range:?} exceeds store of {}", self.len);
        if range.len() < 2 {
            return;
        }
        let mut order: Vec<usize> = range.clone().collect();
        order.sort_by(|&a, &b| ordering(self, less, a, b));
        if order.iter().copied().eq(range.clone()) {
            return;
        }

        self.permute_range(range.start, &order);
    }

    /// Move record `order[k]` to `start + k` for every `k`, following the
    /// permutation's cycles with a single row of scratch space.
    fn permute_range(&mut self, start: usize, order: &[usize]) {
        let mut scratch = Self::new(Arc::clone(&self.schema), 1);
        let mut placed = vec![false; order.len()];
        for first in 0..order.len() {
            if placed[first] {
                continue;
            }
            placed[first] = true;
            if order[first] == start + first {
                continue;
            }
            scratch.copy_row(0, self, start + first);
            let mut hole = first;
            loop {
                let src = order[hole];
                if src == start + first {
                    self.copy_row(start + hole, &scratch, 0);
                    break;
                }
                self.move_row(start + hole, src);
                hole = src - start;
                placed[hole] = true;
            }
        }
    }

    /// Copy record `src` over record `dst` of this store.
    fn move_row(&mut self, dst: usize, src: usize) {
        fn shift<T: Copy>(v: &mut [T], width: usize, dst: usize, src: usize) {
            v.copy_within(src * width..(src + 1) * width, dst * width);
        }
        let ni = self.schema.count(ColumnKind::Integer);
        let nf = self.schema.count(ColumnKind::Float);
        let nx = self.schema.count(ColumnKind::Index);
        let nr = if self.schema.has_copy() { TRACE_HEADER_LEN } else { 0 };
        shift(&mut self.integers, ni, dst, src);
        shift(&mut self.floats, nf, dst, src);
        shift(&mut self.indices, nx, dst, src);
        shift(&mut self.raw, nr, dst, src);
    }

    // ========================================================================
    // Wire image
    // ========================================================================

    /// Bytes per packed record.
    #[must_use]
    pub fn record_wire_size(&self) -> usize {
        let words = self.schema.count(ColumnKind::Integer)
            + self.schema.count(ColumnKind::Float)
            + self.schema.count(ColumnKind::Index);
        words * WORD + if self.schema.has_copy() { TRACE_HEADER_LEN } else { 0 }
    }

    /// Pack the records in `range` into a byte image.
    ///
    /// # Panics
    ///
    /// Panics if `range` extends past the end of the store.
    #[must_use]
    pub fn pack_records(&self, range: Range<usize>) -> Vec<u8> {
        assert!(range.end <= self.len, "pack range {range:?} exceeds store of {}", self.len);
        let ni = self.schema.count(ColumnKind::Integer);
        let nf = self.schema.count(ColumnKind::Float);
        let nx = self.schema.count(ColumnKind::Index);
        let nr = if self.schema.has_copy() { TRACE_HEADER_LEN } else { 0 };

        let mut out = Vec::with_capacity(WORD + range.len() * self.record_wire_size());
        out.extend_from_slice(&(range.len() as u64).to_le_bytes());
        for r in range {
            for v in &self.integers[r * ni..(r + 1) * ni] {
                out.extend_from_slice(&v.to_le_bytes());
            }
            for v in &self.floats[r * nf..(r + 1) * nf] {
                out.extend_from_slice(&v.to_le_bytes());
            }
            for v in &self.indices[r * nx..(r + 1) * nx] {
                out.extend_from_slice(&(*v as u64).to_le_bytes());
            }
            out.extend_from_slice(&self.raw[r * nr..(r + 1) * nr]);
        }
        out
    }

    /// Unpack a byte image produced by [`pack_records`](Self::pack_records)
    /// into records starting at `at`. Returns the number of records written.
    ///
    /// The image must come from a store with the same column layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is truncated or would overrun the store.
    pub fn unpack_records(&mut self, at: usize, bytes: &[u8]) -> Result<usize> {
        if bytes.len() < WORD {
            return Err(SegsortError::BufferTooShort { required: WORD, actual: bytes.len() });
        }
        let count = u64::from_le_bytes(read_word(bytes, 0)) as usize;
        let required = WORD + count * self.record_wire_size();
        if bytes.len() != required {
            return Err(SegsortError::BufferTooShort { required, actual: bytes.len() });
        }
        if at + count > self.len {
            return Err(SegsortError::RecordOutOfRange { index: at + count - 1, len: self.len });
        }

        let ni = self.schema.count(ColumnKind::Integer);
        let nf = self.schema.count(ColumnKind::Float);
        let nx = self.schema.count(ColumnKind::Index);
        let nr = if self.schema.has_copy() { TRACE_HEADER_LEN } else { 0 };

        let mut p = WORD;
        for r in at..at + count {
            for v in &mut self.integers[r * ni..(r + 1) * ni] {
                *v = i64::from_le_bytes(read_word(bytes, p));
                p += WORD;
            }
            for v in &mut self.floats[r * nf..(r + 1) * nf] {
                *v = f64::from_le_bytes(read_word(bytes, p));
                p += WORD;
            }
            for v in &mut self.indices[r * nx..(r + 1) * nx] {
                *v = u64::from_le_bytes(read_word(bytes, p)) as usize;
                p += WORD;
            }
            self.raw[r * nr..(r + 1) * nr].copy_from_slice(&bytes[p..p + nr]);
            p += nr;
        }
        Ok(count)
    }
}

#[inline]
fn read_word(bytes: &[u8], p: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word.copy_from_slice(&bytes[p..p + WORD]);
    word
}

/// Turn a `less` predicate into an [`Ordering`] for two records of one store.
#[inline]
pub(crate) fn ordering<F>(store: &TraceMetadata, less: &F, a: usize, b: usize) -> Ordering
where
    F: Fn(&TraceMetadata, usize, usize) -> bool + ?Sized,
{
    if less(store, a, b) {
        Ordering::Less
    } else if less(store, b, a) {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}
