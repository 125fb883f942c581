//! SEG-Y trace header layout.
//!
//! Positions are 1-based byte numbers exactly as printed in the SEG-Y
//! standard's trace header table. Read and write primitives in
//! [`crate::fields`] take these positions directly and subtract one.
//!
//! # Trace Header Layout (fields used by default schemas)
//!
//! ```text
//! Pos  Size  Field
//! ---  ----  -----
//!   1     4  trace sequence number within line
//!   5     4  trace sequence number within file
//!   9     4  original field record number
//!  13     4  trace number within field record
//!  21     4  CDP ensemble number
//!  37     4  source to receiver offset
//!  41     4  receiver group elevation
//!  45     4  surface elevation at source
//!  49     4  source depth below surface
//!  61     4  water depth at source
//!  65     4  water depth at receiver group
//!  69     2  elevation / depth scalar
//!  71     2  coordinate scalar
//!  73     4  source x
//!  77     4  source y
//!  81     4  receiver group x
//!  85     4  receiver group y
//!  89     2  coordinate units
//! 115     2  number of samples
//! 117     2  sample interval (us)
//! 181     4  CDP x
//! 185     4  CDP y
//! 189     4  inline number
//! 193     4  crossline number
//! ```

/// Size in bytes of one SEG-Y trace header.
pub const TRACE_HEADER_LEN: usize = 240;

/// First valid 1-based position in a trace header.
pub const FIRST_POS: usize = 1;

/// Named 1-based positions of the trace header fields used by default schemas.
pub mod pos {
    /// Trace sequence number within line.
    pub const TRACE_NUMBER_IN_LINE: usize = 1;
    /// Trace sequence number within file.
    pub const TRACE_NUMBER_IN_FILE: usize = 5;
    /// Original field record number.
    pub const FIELD_RECORD: usize = 9;
    /// Trace number within the original field record.
    pub const FIELD_TRACE: usize = 13;
    /// CDP ensemble number.
    pub const CDP: usize = 21;
    /// Distance from source point to receiver group.
    pub const OFFSET: usize = 37;
    /// Receiver group elevation.
    pub const RCV_ELEVATION: usize = 41;
    /// Surface elevation at source.
    pub const SRC_SURFACE_ELEVATION: usize = 45;
    /// Source depth below surface.
    pub const SRC_DEPTH: usize = 49;
    /// Water depth at source.
    pub const WATER_DEPTH_SRC: usize = 61;
    /// Water depth at receiver group.
    pub const WATER_DEPTH_RCV: usize = 65;
    /// Scalar applied to elevations and depths.
    pub const ELEVATION_SCALAR: usize = 69;
    /// Scalar applied to coordinates.
    pub const COORD_SCALAR: usize = 71;
    /// Source x coordinate.
    pub const SRC_X: usize = 73;
    /// Source y coordinate.
    pub const SRC_Y: usize = 77;
    /// Receiver group x coordinate.
    pub const RCV_X: usize = 81;
    /// Receiver group y coordinate.
    pub const RCV_Y: usize = 85;
    /// Coordinate units.
    pub const COORD_UNITS: usize = 89;
    /// Number of samples in this trace.
    pub const SAMPLE_COUNT: usize = 115;
    /// Sample interval in microseconds.
    pub const SAMPLE_INTERVAL: usize = 117;
    /// CDP x coordinate.
    pub const CMP_X: usize = 181;
    /// CDP y coordinate.
    pub const CMP_Y: usize = 185;
    /// Inline number.
    pub const INLINE: usize = 189;
    /// Crossline number.
    pub const CROSSLINE: usize = 193;
}

/// Returns true if a field of `size` bytes at 1-based `pos` lies inside a trace header.
#[inline]
#[must_use]
pub fn fits_in_header(pos: usize, size: usize) -> bool {
    pos >= FIRST_POS && pos - 1 + size <= TRACE_HEADER_LEN
}
