#![deny(unsafe_code)]

pub mod fields;
pub mod layout;
pub mod scale;

// Flat re-exports: callers use segsort_fields::read_i32() etc.
pub use fields::*;
pub use layout::{FIRST_POS, TRACE_HEADER_LEN, fits_in_header};
pub use scale::*;
