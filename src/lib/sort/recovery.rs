//! Recovery of original file order after a semantic sort.
//!
//! After [`distributed_sort`] each rank knows, for every record it now holds,
//! the record's global tag (its original position in file order) and, by
//! position, its global sorted position. Writers usually need the opposite
//! view: records back in file order, each annotated with where it landed in
//! the sort. This pass builds `(file offset, sorted position)` pairs and runs
//! the same engine again ordered purely by file offset, carrying the sorted
//! position as payload.

use std::sync::Arc;

use crate::comm::Communicator;
use crate::errors::Result;
use crate::keys::MetaKey;
use crate::metadata::TraceMetadata;
use crate::schema::{ColumnKind, ExtentMode, Schema};

use super::engine::{SortConfig, distributed_sort, sort_positions};

/// One record in recovered file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct OrderEntry {
    /// Original position of the record in the input.
    pub file_offset: usize,
    /// Global position of the record in the semantic sort.
    pub sort_position: usize,
}

fn recovery_schema() -> Result<Arc<Schema>> {
    let mut schema = Schema::new(ExtentMode::Full);
    schema.add_index(MetaKey::Gtn)?;
    schema.add_index(MetaKey::SortPosition)?;
    Ok(schema.into_shared())
}

/// Return this rank's share of the records in increasing original file order,
/// each annotated with its global sorted position.
///
/// `global_tags` is the [`SortOutcome::global_tags`](super::SortOutcome) of a
/// completed sort: the original file offset of the record at each local
/// position. Rank sizes are preserved, so rank `r` receives the file offsets
/// that fall in its slice of the file.
///
/// # Errors
///
/// Propagates the errors of [`distributed_sort`].
pub fn recover_file_order<C>(
    comm: &C,
    global_tags: &[usize],
    config: &SortConfig,
) -> Result<Vec<OrderEntry>>
where
    C: Communicator + ?Sized,
{
    let positions = sort_positions(comm, global_tags.len())?;
    let mut store = TraceMetadata::new(recovery_schema()?, global_tags.len());
    for (i, (&tag, &position)) in global_tags.iter().zip(&positions).enumerate() {
        store.set_index(i, MetaKey::Gtn, tag)?;
        store.set_index(i, MetaKey::SortPosition, position)?;
    }

    let gtn = store.slot(MetaKey::Gtn, ColumnKind::Index)?;
    let by_file_offset =
        move |s: &TraceMetadata, a: usize, b: usize| s.index_at(gtn, a) < s.index_at(gtn, b);
    distributed_sort(comm, &mut store, &by_file_offset, config)?;

    let position = store.slot(MetaKey::SortPosition, ColumnKind::Index)?;
    Ok((0..store.len())
        .map(|i| OrderEntry {
            file_offset: store.index_at(gtn, i),
            sort_position: store.index_at(position, i),
        })
        .collect())
}
