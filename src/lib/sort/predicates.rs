//! Canonical trace sort orders.
//!
//! Each [`SortType`] is a lexicographic comparison over a short list of
//! [`Criterion`]s, always followed by the local trace number and then the
//! global trace number. The global trace number is unique across the process
//! group, so every comparator is a strict total order.
//!
//! "Off" orders use the source-receiver distance computed from the
//! coordinates; "ROff" orders use the offset stored in the trace header.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::errors::{Result, SegsortError};
use crate::keys::MetaKey;
use crate::metadata::{FieldSlot, TraceMetadata};
use crate::schema::{ColumnKind, ExtentMode, Schema};

/// A resolved `less(store, i, j)` predicate.
pub type Comparator = Box<dyn Fn(&TraceMetadata, usize, usize) -> bool + Send + Sync>;

/// One field of a lexicographic sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    /// A scaled floating point field.
    Float(MetaKey),
    /// An integer field.
    Integer(MetaKey),
    /// An index field.
    Index(MetaKey),
    /// Distance between source and receiver coordinates.
    ComputedOffset,
}

impl Criterion {
    fn keys(self) -> Vec<MetaKey> {
        match self {
            Self::Float(key) | Self::Integer(key) | Self::Index(key) => vec![key],
            Self::ComputedOffset => vec![MetaKey::SrcX, MetaKey::SrcY, MetaKey::RcvX, MetaKey::RcvY],
        }
    }

    fn resolve(self, store: &TraceMetadata) -> Result<Resolved> {
        Ok(match self {
            Self::Float(key) => Resolved::Float(store.slot(key, ColumnKind::Float)?),
            Self::Integer(key) => Resolved::Integer(store.slot(key, ColumnKind::Integer)?),
            Self::Index(key) => Resolved::Index(store.slot(key, ColumnKind::Index)?),
            Self::ComputedOffset => Resolved::Offset {
                src: [
                    store.slot(MetaKey::SrcX, ColumnKind::Float)?,
                    store.slot(MetaKey::SrcY, ColumnKind::Float)?,
                ],
                rcv: [
                    store.slot(MetaKey::RcvX, ColumnKind::Float)?,
                    store.slot(MetaKey::RcvY, ColumnKind::Float)?,
                ],
            },
        })
    }
}

/// A criterion bound to the column slots of one schema.
#[derive(Debug, Clone, Copy)]
enum Resolved {
    Float(FieldSlot),
    Integer(FieldSlot),
    Index(FieldSlot),
    Offset { src: [FieldSlot; 2], rcv: [FieldSlot; 2] },
}

impl Resolved {
    #[inline]
    fn compare(&self, store: &TraceMetadata, a: usize, b: usize) -> Ordering {
        match *self {
            Self::Float(s) => store.float_at(s, a).total_cmp(&store.float_at(s, b)),
            Self::Integer(s) => store.integer_at(s, a).cmp(&store.integer_at(s, b)),
            Self::Index(s) => store.index_at(s, a).cmp(&store.index_at(s, b)),
            Self::Offset { src, rcv } => {
                let distance = |r: usize| {
                    let dx = store.float_at(src[0], r) - store.float_at(rcv[0], r);
                    let dy = store.float_at(src[1], r) - store.float_at(rcv[1], r);
                    dx.hypot(dy)
                };
                distance(a).total_cmp(&distance(b))
            }
        }
    }
}

const TIE_BREAK: [Criterion; 2] = [Criterion::Index(MetaKey::Ltn), Criterion::Index(MetaKey::Gtn)];

/// The canonical sort orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortType {
    /// Source x, source y, receiver x, receiver y.
    SrcRcv,
    /// Source x, source y, computed offset.
    SrcOff,
    /// Source x, source y, stored offset.
    SrcROff,
    /// Receiver x, receiver y, computed offset.
    RcvOff,
    /// Receiver x, receiver y, stored offset.
    RcvROff,
    /// Inline, crossline, computed offset.
    LineOff,
    /// Inline, crossline, stored offset.
    LineROff,
    /// Computed offset, inline, crossline.
    OffLine,
}

impl SortType {
    /// Every sort type.
    pub const ALL: [SortType; 8] = [
        SortType::SrcRcv,
        SortType::SrcOff,
        SortType::SrcROff,
        SortType::RcvOff,
        SortType::RcvROff,
        SortType::LineOff,
        SortType::LineROff,
        SortType::OffLine,
    ];

    /// Primary comparison fields, before the trace-number tie-break.
    #[must_use]
    pub fn criteria(self) -> &'static [Criterion] {
        use Criterion::{ComputedOffset, Float, Integer};
        use MetaKey::{Crossline, Inline, Offset, RcvX, RcvY, SrcX, SrcY};
        match self {
            Self::SrcRcv => &[Float(SrcX), Float(SrcY), Float(RcvX), Float(RcvY)],
            Self::SrcOff => &[Float(SrcX), Float(SrcY), ComputedOffset],
            Self::SrcROff => &[Float(SrcX), Float(SrcY), Integer(Offset)],
            Self::RcvOff => &[Float(RcvX), Float(RcvY), ComputedOffset],
            Self::RcvROff => &[Float(RcvX), Float(RcvY), Integer(Offset)],
            Self::LineOff => &[Integer(Inline), Integer(Crossline), ComputedOffset],
            Self::LineROff => &[Integer(Inline), Integer(Crossline), Integer(Offset)],
            Self::OffLine => &[ComputedOffset, Integer(Inline), Integer(Crossline)],
        }
    }

    /// Keys a store must hold for [`comparator`](Self::comparator) to succeed,
    /// without duplicates.
    #[must_use]
    pub fn required_keys(self) -> Vec<MetaKey> {
        let mut keys = Vec::new();
        for criterion in self.criteria().iter().chain(TIE_BREAK.iter()) {
            for key in criterion.keys() {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// A schema holding the required keys with their built-in descriptors.
    ///
    /// # Errors
    ///
    /// Propagates schema construction errors.
    pub fn schema(self, mode: ExtentMode) -> Result<Schema> {
        Schema::from_keys(&self.required_keys(), mode)
    }

    /// Resolve this order against `store`'s schema.
    ///
    /// The returned comparator may be used on any store sharing the schema.
    ///
    /// # Errors
    ///
    /// Returns [`SegsortError::UnknownKey`] or [`SegsortError::TypeMismatch`]
    /// if a required key is missing or stored under the wrong kind.
    pub fn comparator(self, store: &TraceMetadata) -> Result<Comparator> {
        let resolved = self
            .criteria()
            .iter()
            .chain(TIE_BREAK.iter())
            .map(|c| c.resolve(store))
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(move |s: &TraceMetadata, a: usize, b: usize| {
            for criterion in &resolved {
                match criterion.compare(s, a, b) {
                    Ordering::Equal => {}
                    ord => return ord == Ordering::Less,
                }
            }
            false
        }))
    }

    /// Kebab-case name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::SrcRcv => "src-rcv",
            Self::SrcOff => "src-off",
            Self::SrcROff => "src-roff",
            Self::RcvOff => "rcv-off",
            Self::RcvROff => "rcv-roff",
            Self::LineOff => "line-off",
            Self::LineROff => "line-roff",
            Self::OffLine => "off-line",
        }
    }
}

impl fmt::Display for SortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortType {
    type Err = SegsortError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL.iter().copied().find(|t| t.name() == wanted).ok_or_else(|| {
            SegsortError::UnknownSortType { name: s.to_string() }
        })
    }
}
