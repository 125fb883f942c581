//! Semantic metadata keys.
//!
//! A [`MetaKey`] names a quantity (source x, inline number, ...) independently
//! of where, or whether, it lives in the binary trace header. The mapping to
//! physical bytes is the job of a [`Schema`](crate::schema::Schema).

use std::fmt;
use std::str::FromStr;

use crate::errors::SegsortError;

/// Semantic identifier for one piece of trace metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetaKey {
    /// Source x coordinate.
    SrcX,
    /// Source y coordinate.
    SrcY,
    /// Receiver group x coordinate.
    RcvX,
    /// Receiver group y coordinate.
    RcvY,
    /// CMP x coordinate.
    CmpX,
    /// CMP y coordinate.
    CmpY,
    /// Inline number.
    Inline,
    /// Crossline number.
    Crossline,
    /// Source to receiver offset as stored in the header.
    Offset,
    /// Trace sequence number within line.
    TraceNumberInLine,
    /// Trace sequence number within file.
    TraceNumberInFile,
    /// Original field record number.
    FieldRecord,
    /// Trace number within the field record.
    FieldTrace,
    /// CDP ensemble number.
    Cdp,
    /// Receiver group elevation.
    RcvElevation,
    /// Surface elevation at source.
    SrcSurfaceElevation,
    /// Source depth below surface.
    SrcDepth,
    /// Water depth at source.
    WaterDepthSrc,
    /// Water depth at receiver group.
    WaterDepthRcv,
    /// Coordinate scalar as a raw short.
    CoordScalar,
    /// Elevation scalar as a raw short.
    ElevationScalar,
    /// Coordinate units code.
    CoordUnits,
    /// Number of samples in the trace.
    SampleCount,
    /// Sample interval in microseconds.
    SampleInterval,
    /// Global trace number: a tag unique across the whole process group.
    Gtn,
    /// Local trace number: the trace's position in its file.
    Ltn,
    /// Sorted position carried through order recovery.
    SortPosition,
    /// Marker for buffering the whole raw header.
    Copy,
}

impl MetaKey {
    /// Every key, in declaration order.
    pub const ALL: [MetaKey; 28] = [
        MetaKey::SrcX,
        MetaKey::SrcY,
        MetaKey::RcvX,
        MetaKey::RcvY,
        MetaKey::CmpX,
        MetaKey::CmpY,
        MetaKey::Inline,
        MetaKey::Crossline,
        MetaKey::Offset,
        MetaKey::TraceNumberInLine,
        MetaKey::TraceNumberInFile,
        MetaKey::FieldRecord,
        MetaKey::FieldTrace,
        MetaKey::Cdp,
        MetaKey::RcvElevation,
        MetaKey::SrcSurfaceElevation,
        MetaKey::SrcDepth,
        MetaKey::WaterDepthSrc,
        MetaKey::WaterDepthRcv,
        MetaKey::CoordScalar,
        MetaKey::ElevationScalar,
        MetaKey::CoordUnits,
        MetaKey::SampleCount,
        MetaKey::SampleInterval,
        MetaKey::Gtn,
        MetaKey::Ltn,
        MetaKey::SortPosition,
        MetaKey::Copy,
    ];

    /// Stable snake_case name, used in logs and on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::SrcX => "src_x",
            Self::SrcY => "src_y",
            Self::RcvX => "rcv_x",
            Self::RcvY => "rcv_y",
            Self::CmpX => "cmp_x",
            Self::CmpY => "cmp_y",
            Self::Inline => "inline",
            Self::Crossline => "crossline",
            Self::Offset => "offset",
            Self::TraceNumberInLine => "trace_number_in_line",
            Self::TraceNumberInFile => "trace_number_in_file",
            Self::FieldRecord => "field_record",
            Self::FieldTrace => "field_trace",
            Self::Cdp => "cdp",
            Self::RcvElevation => "rcv_elevation",
            Self::SrcSurfaceElevation => "src_surface_elevation",
            Self::SrcDepth => "src_depth",
            Self::WaterDepthSrc => "water_depth_src",
            Self::WaterDepthRcv => "water_depth_rcv",
            Self::CoordScalar => "coord_scalar",
            Self::ElevationScalar => "elevation_scalar",
            Self::CoordUnits => "coord_units",
            Self::SampleCount => "sample_count",
            Self::SampleInterval => "sample_interval",
            Self::Gtn => "gtn",
            Self::Ltn => "ltn",
            Self::SortPosition => "sort_position",
            Self::Copy => "copy",
        }
    }
}

impl fmt::Display for MetaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetaKey {
    type Err = SegsortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| SegsortError::UnknownKeyName { name: s.to_string() })
    }
}
