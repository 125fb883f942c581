//! Distributed sorting of trace metadata.
//!
//! Records are spread over a fixed group of ranks, each holding a
//! [`TraceMetadata`](crate::metadata::TraceMetadata) slice. The boundary
//! rotation sort leaves the group in global order: every rank's slice is
//! locally sorted and every record on rank `r` sorts at or before every record
//! on rank `r + 1`.
//!
//! # Architecture
//!
//! 1. **Tagging**: [`assign_global_tags`] stamps each record with its position
//!    in file order, the final tie-break of every sort order
//! 2. **Sort**: [`distributed_sort`] runs the [`SortPhase`] state machine in
//!    lockstep on every rank
//! 3. **Recovery**: [`recover_file_order`] maps the result back to file order,
//!    annotated with sorted positions
//! 4. **Verification**: [`verify_global_order`] checks the group invariant
//!
//! The canonical orders live in [`predicates`] as [`SortType`].

pub mod engine;
pub mod phase;
pub mod predicates;
pub mod recovery;
pub mod verify;

pub use engine::{
    DEFAULT_MIN_RECORDS_PER_RANK, DEFAULT_REGION_DIVISOR, SortConfig, SortOutcome,
    assign_global_tags, distributed_sort, sort_positions,
};
pub use phase::SortPhase;
pub use predicates::{Comparator, Criterion, SortType};
pub use recovery::{OrderEntry, recover_file_order};
pub use verify::verify_global_order;
