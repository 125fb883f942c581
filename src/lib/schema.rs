//! Schema (rule table) mapping metadata keys onto trace header fields.
//!
//! A [`Schema`] binds each [`MetaKey`] it holds to a [`FieldDescriptor`] that
//! says how the value is physically stored. It also assigns every entry an
//! ordinal within its [`ColumnKind`], which is the entry's column inside a
//! [`TraceMetadata`](crate::metadata::TraceMetadata) store.
//!
//! # Sharing
//!
//! Schemas are plain owned values. Stores share one through `Arc<Schema>` and
//! never mutate it; code that wants to change a shared schema goes through
//! `Arc::make_mut`, which clones it if any store still holds the old one.
//!
//! # Extent
//!
//! The extent is the contiguous byte span a schema touches in the 240-byte
//! header. In [`ExtentMode::Full`] it is always the full header. In
//! [`ExtentMode::Tight`] it is computed from the entries on first use after a
//! mutation and cached until the next one.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use segsort_fields::layout::pos;
use segsort_fields::{TRACE_HEADER_LEN, fits_in_header};

use crate::errors::{Result, SegsortError};
use crate::keys::MetaKey;

/// Keys bound by [`Schema::with_defaults`].
pub const DEFAULT_KEYS: [MetaKey; 12] = [
    MetaKey::SrcX,
    MetaKey::SrcY,
    MetaKey::RcvX,
    MetaKey::RcvY,
    MetaKey::CmpX,
    MetaKey::CmpY,
    MetaKey::Inline,
    MetaKey::Crossline,
    MetaKey::Offset,
    MetaKey::TraceNumberInFile,
    MetaKey::Ltn,
    MetaKey::Gtn,
];

/// Storage group a descriptor decodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// `i64` column (4-byte and 2-byte integer fields)
    Integer,
    /// `f64` column (scaled coordinates)
    Float,
    /// `usize` column (logical fields with no bytes in the header)
    Index,
    /// Raw header bytes
    Raw,
}

impl ColumnKind {
    /// All column kinds in storage order.
    pub const ALL: [ColumnKind; 4] =
        [ColumnKind::Integer, ColumnKind::Float, ColumnKind::Index, ColumnKind::Raw];

    #[inline]
    pub(crate) fn slot(self) -> usize {
        match self {
            Self::Integer => 0,
            Self::Float => 1,
            Self::Index => 2,
            Self::Raw => 3,
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Index => "index",
            Self::Raw => "raw",
        })
    }
}

/// How one metadata key is physically stored.
///
/// Positions are 1-based SEG-Y byte numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldDescriptor {
    /// 4-byte signed integer at `pos`.
    Integer { pos: usize },
    /// 2-byte signed integer at `pos`.
    Short { pos: usize },
    /// 4-byte mantissa at `pos`, scaled by the 2-byte code at `scale_pos`.
    ScaledFloat { pos: usize, scale_pos: usize },
    /// Logical value with no bytes in the header.
    Index,
    /// Buffer the whole raw header verbatim.
    Copy,
}

impl FieldDescriptor {
    /// Column kind this descriptor decodes into.
    #[must_use]
    pub fn column(&self) -> ColumnKind {
        match self {
            Self::Integer { .. } | Self::Short { .. } => ColumnKind::Integer,
            Self::ScaledFloat { .. } => ColumnKind::Float,
            Self::Index => ColumnKind::Index,
            Self::Copy => ColumnKind::Raw,
        }
    }

    /// Half-open `[start, end)` range of 1-based positions this field touches,
    /// or `None` for index fields.
    #[must_use]
    pub fn byte_range(&self) -> Option<(usize, usize)> {
        match *self {
            Self::Integer { pos } => Some((pos, pos + 4)),
            Self::Short { pos } => Some((pos, pos + 2)),
            Self::ScaledFloat { pos, scale_pos } => {
                Some((pos.min(scale_pos), (pos + 4).max(scale_pos + 2)))
            }
            Self::Index => None,
            Self::Copy => Some((1, TRACE_HEADER_LEN + 1)),
        }
    }

    fn validate(&self, key: MetaKey) -> Result<()> {
        let invalid = |reason: String| Err(SegsortError::InvalidDescriptor { key, reason });
        match *self {
            Self::Copy if key != MetaKey::Copy => {
                invalid("only the 'copy' key may hold a copy descriptor".to_string())
            }
            _ if key == MetaKey::Copy && *self != Self::Copy => {
                invalid("the 'copy' key only accepts a copy descriptor".to_string())
            }
            Self::Integer { pos } if !fits_in_header(pos, 4) => {
                invalid(format!("4-byte field at {pos} lies outside the trace header"))
            }
            Self::Short { pos } if !fits_in_header(pos, 2) => {
                invalid(format!("2-byte field at {pos} lies outside the trace header"))
            }
            Self::ScaledFloat { pos, scale_pos }
                if !fits_in_header(pos, 4) || !fits_in_header(scale_pos, 2) =>
            {
                invalid(format!(
                    "scaled field at {pos} with scale at {scale_pos} lies outside the trace header"
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Returns the standard SEG-Y layout for a key, if it has one.
#[must_use]
pub fn default_descriptor(key: MetaKey) -> Option<FieldDescriptor> {
    use FieldDescriptor::{Copy, Index, Integer, ScaledFloat, Short};

    let coord = |p| ScaledFloat { pos: p, scale_pos: pos::COORD_SCALAR };
    let elev = |p| ScaledFloat { pos: p, scale_pos: pos::ELEVATION_SCALAR };
    Some(match key {
        MetaKey::SrcX => coord(pos::SRC_X),
        MetaKey::SrcY => coord(pos::SRC_Y),
        MetaKey::RcvX => coord(pos::RCV_X),
        MetaKey::RcvY => coord(pos::RCV_Y),
        MetaKey::CmpX => coord(pos::CMP_X),
        MetaKey::CmpY => coord(pos::CMP_Y),
        MetaKey::Inline => Integer { pos: pos::INLINE },
        MetaKey::Crossline => Integer { pos: pos::CROSSLINE },
        MetaKey::Offset => Integer { pos: pos::OFFSET },
        MetaKey::TraceNumberInLine => Integer { pos: pos::TRACE_NUMBER_IN_LINE },
        MetaKey::TraceNumberInFile => Integer { pos: pos::TRACE_NUMBER_IN_FILE },
        MetaKey::FieldRecord => Integer { pos: pos::FIELD_RECORD },
        MetaKey::FieldTrace => Integer { pos: pos::FIELD_TRACE },
        MetaKey::Cdp => Integer { pos: pos::CDP },
        MetaKey::RcvElevation => elev(pos::RCV_ELEVATION),
        MetaKey::SrcSurfaceElevation => elev(pos::SRC_SURFACE_ELEVATION),
        MetaKey::SrcDepth => elev(pos::SRC_DEPTH),
        MetaKey::WaterDepthSrc => elev(pos::WATER_DEPTH_SRC),
        MetaKey::WaterDepthRcv => elev(pos::WATER_DEPTH_RCV),
        MetaKey::CoordScalar => Short { pos: pos::COORD_SCALAR },
        MetaKey::ElevationScalar => Short { pos: pos::ELEVATION_SCALAR },
        MetaKey::CoordUnits => Short { pos: pos::COORD_UNITS },
        MetaKey::SampleCount => Short { pos: pos::SAMPLE_COUNT },
        MetaKey::SampleInterval => Short { pos: pos::SAMPLE_INTERVAL },
        MetaKey::Gtn | MetaKey::Ltn | MetaKey::SortPosition => Index,
        MetaKey::Copy => Copy,
    })
}

/// Whether the extent is pinned to the full header or computed from entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtentMode {
    /// Extent is always the full trace header.
    #[default]
    Full,
    /// Extent is the minimal span covering all physical entries.
    Tight,
}

/// One schema entry: descriptor plus column ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaEntry {
    /// How the value is stored.
    pub descriptor: FieldDescriptor,
    /// Column within the descriptor's [`ColumnKind`].
    pub ordinal: usize,
}

/// Mapping from metadata keys to field descriptors.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    mode: ExtentMode,
    entries: BTreeMap<MetaKey, SchemaEntry>,
    counts: [usize; 4],
    /// Cached `[start, end)` span; reset on every mutation.
    span: OnceLock<(usize, usize)>,
}

impl Schema {
    /// Create an empty schema.
    #[must_use]
    pub fn new(mode: ExtentMode) -> Self {
        Self { mode, ..Self::default() }
    }

    /// Create a schema holding the [`DEFAULT_KEYS`] with their standard layout.
    #[must_use]
    pub fn with_defaults(mode: ExtentMode) -> Self {
        let mut schema = Self::new(mode);
        for key in DEFAULT_KEYS {
            if let Some(descriptor) = default_descriptor(key) {
                schema.insert(key, descriptor);
            }
        }
        schema
    }

    /// Create a schema holding `keys`, each bound to its built-in descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if a key has no default descriptor.
    pub fn from_keys(keys: &[MetaKey], mode: ExtentMode) -> Result<Self> {
        let mut schema = Self::new(mode);
        for &key in keys {
            let descriptor =
                default_descriptor(key).ok_or(SegsortError::NoDefaultDescriptor { key })?;
            schema.add(key, descriptor)?;
        }
        Ok(schema)
    }

    /// Create a schema with the same entries as `other` but its own extent mode.
    #[must_use]
    pub fn from_schema(other: &Schema, mode: ExtentMode) -> Self {
        let mut schema = Self::new(mode);
        schema.merge(other);
        schema
    }

    /// Freeze this schema for sharing between stores.
    #[must_use]
    pub fn into_shared(self) -> Arc<Schema> {
        Arc::new(self)
    }

    /// Add or replace the descriptor for `key`.
    ///
    /// Replacing first removes the old entry, so ordinals stay dense.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor does not fit in the trace header, or a
    /// copy descriptor is used with a key other than [`MetaKey::Copy`].
    pub fn add(&mut self, key: MetaKey, descriptor: FieldDescriptor) -> Result<()> {
        descriptor.validate(key)?;
        self.insert(key, descriptor);
        Ok(())
    }

    /// Add a 4-byte integer field.
    pub fn add_integer(&mut self, key: MetaKey, pos: usize) -> Result<()> {
        self.add(key, FieldDescriptor::Integer { pos })
    }

    /// Add a 2-byte integer field.
    pub fn add_short(&mut self, key: MetaKey, pos: usize) -> Result<()> {
        self.add(key, FieldDescriptor::Short { pos })
    }

    /// Add a scaled coordinate field.
    pub fn add_scaled_float(&mut self, key: MetaKey, pos: usize, scale_pos: usize) -> Result<()> {
        self.add(key, FieldDescriptor::ScaledFloat { pos, scale_pos })
    }

    /// Add a logical index field.
    pub fn add_index(&mut self, key: MetaKey) -> Result<()> {
        self.add(key, FieldDescriptor::Index)
    }

    /// Request that the raw header is buffered verbatim.
    pub fn add_copy(&mut self) {
        self.insert(MetaKey::Copy, FieldDescriptor::Copy);
    }

    /// Add every entry of `other`, replacing entries for keys already present.
    pub fn merge(&mut self, other: &Schema) {
        for (&key, entry) in &other.entries {
            self.insert(key, entry.descriptor);
        }
    }

    /// Remove `key`, returning its descriptor if it was present.
    pub fn remove(&mut self, key: MetaKey) -> Option<FieldDescriptor> {
        let removed = self.entries.remove(&key)?;
        let kind = removed.descriptor.column();
        for entry in self.entries.values_mut() {
            if entry.descriptor.column() == kind && entry.ordinal > removed.ordinal {
                entry.ordinal -= 1;
            }
        }
        self.counts[kind.slot()] -= 1;
        self.span = OnceLock::new();
        Some(removed.descriptor)
    }

    fn insert(&mut self, key: MetaKey, descriptor: FieldDescriptor) {
        self.remove(key);
        let kind = descriptor.column();
        let ordinal = self.counts[kind.slot()];
        self.counts[kind.slot()] += 1;
        self.entries.insert(key, SchemaEntry { descriptor, ordinal });
        self.span = OnceLock::new();
    }

    /// Descriptor for `key`, or `None` if the schema does not hold it.
    #[must_use]
    pub fn get(&self, key: MetaKey) -> Option<&FieldDescriptor> {
        self.entries.get(&key).map(|e| &e.descriptor)
    }

    /// Full entry (descriptor and ordinal) for `key`.
    #[must_use]
    pub fn entry(&self, key: MetaKey) -> Option<&SchemaEntry> {
        self.entries.get(&key)
    }

    /// Whether the schema holds `key`.
    #[must_use]
    pub fn contains(&self, key: MetaKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Column ordinal of `key` within its kind.
    #[must_use]
    pub fn ordinal(&self, key: MetaKey) -> Option<usize> {
        self.entries.get(&key).map(|e| e.ordinal)
    }

    /// Number of entries stored under `kind`.
    #[must_use]
    pub fn count(&self, kind: ColumnKind) -> usize {
        self.counts[kind.slot()]
    }

    /// Whether the schema buffers raw headers.
    #[must_use]
    pub fn has_copy(&self) -> bool {
        self.counts[ColumnKind::Raw.slot()] > 0
    }

    /// Number of keys in the schema.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the schema holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Extent mode of the schema.
    #[must_use]
    pub fn mode(&self) -> ExtentMode {
        self.mode
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (MetaKey, &SchemaEntry)> {
        self.entries.iter().map(|(&k, e)| (k, e))
    }

    /// Number of header bytes this schema touches.
    #[must_use]
    pub fn extent(&self) -> usize {
        let (start, end) = self.span();
        end - start
    }

    /// First 1-based header position this schema touches.
    #[must_use]
    pub fn start(&self) -> usize {
        self.span().0
    }

    /// One past the last 1-based header position this schema touches.
    #[must_use]
    pub fn end(&self) -> usize {
        self.span().1
    }

    fn span(&self) -> (usize, usize) {
        match self.mode {
            ExtentMode::Full => (1, TRACE_HEADER_LEN + 1),
            ExtentMode::Tight => *self.span.get_or_init(|| {
                self.entries
                    .values()
                    .filter_map(|e| e.descriptor.byte_range())
                    .reduce(|(s0, e0), (s1, e1)| (s0.min(s1), e0.max(e1)))
                    .unwrap_or((1, 1))
            }),
        }
    }

    /// Bytes a record store spends per record under this schema.
    #[must_use]
    pub fn memory_per_record(&self) -> usize {
        let word = std::mem::size_of::<u64>();
        let raw = if self.has_copy() { TRACE_HEADER_LEN } else { 0 };
        (self.count(ColumnKind::Integer) + self.count(ColumnKind::Float) + self.count(ColumnKind::Index))
            * word
            + raw
    }
}
