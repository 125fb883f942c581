//! CLI command implementations for segsort.
//!
//! # Commands
//!
//! - [`simulate`] - Run a distributed sort over synthetic trace headers
//! - [`schema`] - Describe the header layout of a schema

#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::uninlined_format_args
)]

pub mod command;
pub mod common;
pub mod schema;
pub mod simulate;
