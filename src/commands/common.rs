//! Common CLI options shared across commands.
//!
//! Argument structures here are composed into command structs with
//! `#[command(flatten)]`.

use clap::{Args, ValueEnum};

use segsort_lib::schema::{ExtentMode, Schema};
use segsort_lib::sort::SortType;

/// Canonical sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortTypeArg {
    /// Source x/y, then receiver x/y
    SrcRcv,
    /// Source x/y, then computed offset
    SrcOff,
    /// Source x/y, then stored offset
    #[value(name = "src-roff")]
    SrcROff,
    /// Receiver x/y, then computed offset
    RcvOff,
    /// Receiver x/y, then stored offset
    #[value(name = "rcv-roff")]
    RcvROff,
    /// Inline/crossline, then computed offset
    LineOff,
    /// Inline/crossline, then stored offset
    #[value(name = "line-roff")]
    LineROff,
    /// Computed offset, then inline/crossline
    OffLine,
}

impl From<SortTypeArg> for SortType {
    fn from(arg: SortTypeArg) -> Self {
        match arg {
            SortTypeArg::SrcRcv => SortType::SrcRcv,
            SortTypeArg::SrcOff => SortType::SrcOff,
            SortTypeArg::SrcROff => SortType::SrcROff,
            SortTypeArg::RcvOff => SortType::RcvOff,
            SortTypeArg::RcvROff => SortType::RcvROff,
            SortTypeArg::LineOff => SortType::LineOff,
            SortTypeArg::LineROff => SortType::LineROff,
            SortTypeArg::OffLine => SortType::OffLine,
        }
    }
}

/// Options controlling how a schema is laid out.
#[derive(Debug, Clone, Default, Args)]
pub struct SchemaOptions {
    /// Compute the extent from the fields in use instead of the full header
    #[arg(long = "tight", default_value = "false")]
    pub tight: bool,

    /// Also buffer each raw trace header
    #[arg(long = "copy-headers", default_value = "false")]
    pub copy_headers: bool,
}

impl SchemaOptions {
    /// The extent mode selected by `--tight`.
    #[must_use]
    pub fn mode(&self) -> ExtentMode {
        if self.tight { ExtentMode::Tight } else { ExtentMode::Full }
    }

    /// Apply `--copy-headers` to `schema`.
    pub fn apply(&self, schema: &mut Schema) {
        if self.copy_headers {
            schema.add_copy();
        }
    }
}
