//! Check that a group of stores is in global order.

use log::warn;

use crate::comm::{Communicator, MessageTag};
use crate::errors::Result;
use crate::metadata::TraceMetadata;

use super::engine::agree;

const BOUNDARY: MessageTag = MessageTag::new("verify-boundary", 0);

/// Whether the records of all ranks, concatenated in rank order, are ordered
/// by `less`. Every rank returns the same answer.
///
/// Each rank checks its own slice, then sends its first record to the nearest
/// non-empty rank on its left, which compares it with its last record. Empty
/// ranks take part in the reductions but exchange nothing.
///
/// # Errors
///
/// Returns an error if an exchange fails or a received record cannot be
/// unpacked.
pub fn verify_global_order<C, F>(comm: &C, store: &TraceMetadata, less: &F) -> Result<bool>
where
    C: Communicator + ?Sized,
    F: Fn(&TraceMetadata, usize, usize) -> bool + ?Sized,
{
    let rank = comm.rank();
    let locally_sorted = (1..store.len()).all(|i| !less(store, i, i - 1));
    if !locally_sorted {
        warn!("Rank {rank}: local records are out of order");
    }

    let sizes = comm.all_gather(store.len() as u64)?;
    let non_empty: Vec<usize> = (0..sizes.len()).filter(|&r| sizes[r] > 0).collect();
    let me = non_empty.iter().position(|&r| r == rank);
    let left = me.and_then(|i| i.checked_sub(1)).map(|i| non_empty[i]);
    let right = me.and_then(|i| non_empty.get(i + 1).copied());

    if let Some(left) = left {
        comm.send(left, BOUNDARY, store.pack_records(0..1))?;
    }

    let boundary_ok = match right {
        None => Ok(true),
        Some(right) => comm.recv(right, BOUNDARY).and_then(|bytes| {
            let mut pair = TraceMetadata::new(std::sync::Arc::clone(store.schema()), 2);
            pair.copy_entries(0, store, store.len() - 1)?;
            pair.unpack_records(1, &bytes)?;
            Ok(!less(&pair, 1, 0))
        }),
    };
    let boundary_ok = agree(comm, "verify-boundary", boundary_ok)?;
    if !boundary_ok {
        warn!("Rank {rank}: last record sorts after the first record of the next rank");
    }

    let failures = comm.sum(u64::from(!(locally_sorted && boundary_ok)))?;
    Ok(failures == 0)
}
