//! Direct field access on raw SEG-Y trace headers.
//!
//! All multi-byte values are big-endian regardless of host byte order.
//! Positions are 1-based, matching the SEG-Y standard (see [`crate::layout`]).
//!
//! All read and write primitives below assume the buffer covers the field.
//! Passing a shorter slice panics on out-of-bounds indexing; callers validate
//! buffer length (usually [`TRACE_HEADER_LEN`](crate::layout::TRACE_HEADER_LEN))
//! before calling them.

use crate::scale::{ScaleError, apply_scale, mantissa};

// ============================================================================
// Read Primitives
// ============================================================================

/// Read a 4-byte signed big-endian integer at 1-based `pos`.
#[inline]
#[must_use]
pub fn read_i32(header: &[u8], pos: usize) -> i32 {
    let o = pos - 1;
    i32::from_be_bytes([header[o], header[o + 1], header[o + 2], header[o + 3]])
}

/// Read a 2-byte signed big-endian integer at 1-based `pos`.
#[inline]
#[must_use]
pub fn read_i16(header: &[u8], pos: usize) -> i16 {
    let o = pos - 1;
    i16::from_be_bytes([header[o], header[o + 1]])
}

/// Read a scaled coordinate: the mantissa at `pos` times the factor coded at `scale_pos`.
#[inline]
#[must_use]
pub fn read_scaled(header: &[u8], pos: usize, scale_pos: usize) -> f64 {
    apply_scale(read_i32(header, pos), read_i16(header, scale_pos))
}

// ============================================================================
// Write Primitives
// ============================================================================

/// Write a 4-byte signed big-endian integer at 1-based `pos`.
#[inline]
pub fn write_i32(header: &mut [u8], pos: usize, value: i32) {
    let o = pos - 1;
    header[o..o + 4].copy_from_slice(&value.to_be_bytes());
}

/// Write a 2-byte signed big-endian integer at 1-based `pos`.
#[inline]
pub fn write_i16(header: &mut [u8], pos: usize, value: i16) {
    let o = pos - 1;
    header[o..o + 2].copy_from_slice(&value.to_be_bytes());
}

/// Write `value` as a mantissa under an already chosen scale `code`.
///
/// The scale field itself is not written; several mantissas usually share
/// one scale field and the caller writes it once.
///
/// # Errors
///
/// Returns an error if the rounded mantissa does not fit in 4 bytes.
#[inline]
pub fn write_scaled(header: &mut [u8], pos: usize, value: f64, code: i16) -> Result<(), ScaleError> {
    write_i32(header, pos, mantissa(value, code)?);
    Ok(())
}
