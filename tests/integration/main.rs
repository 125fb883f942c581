//! Integration tests for segsort.
//!
//! Library tests drive several in-process ranks through `run_ranks`; CLI tests
//! invoke the compiled binary.

mod helpers;
mod test_cli_commands;
mod test_distributed_sort;
mod test_error_paths;
mod test_header_roundtrip;
mod test_order_recovery;
