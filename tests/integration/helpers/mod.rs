//! Helper utilities for integration tests.

pub mod assertions;
pub mod faulty_comm;
pub mod trace_generator;

pub use assertions::*;
pub use faulty_comm::*;
pub use trace_generator::*;
