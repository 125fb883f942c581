//! Boundary rotation sort across a process group.
//!
//! Each rank holds a slice of the records. After a local sort, ranks
//! repeatedly exchange a fixed-size boundary region with their neighbours and
//! re-sort the overlapping windows, a distributed take on odd-even
//! transposition sort that only moves boundary regions:
//!
//! 1. **send-left**: every rank but the first sends its first `region` records
//!    to its left neighbour, which appends them to a scratch buffer of
//!    `local + region` records.
//! 2. **sort-suffix**: sort from `edge_left` (`region`, or 0 on rank 0) to the
//!    end of the scratch buffer.
//! 3. **send-right**: every rank but the last sends its trailing `region`
//!    records to its right neighbour, which overwrites the region it sent left.
//! 4. **sort-prefix**: sort the `local` records this rank now owns.
//! 5. **convergence-check**: compare this round's global tags with the last
//!    round's and sum the changed flags over the group; stop at zero.
//!
//! A round with no change anywhere is a fixed point only a globally sorted
//! sequence can reach, so termination is detected rather than assumed.
//!
//! Every rank walks the same [`SortPhase`] sequence and every message carries
//! the phase and round it belongs to. A communication failure is logged and
//! returned; the group is then in an inconsistent state and the sort cannot be
//! resumed.

use log::{debug, error, info};

use crate::comm::{Communicator, MessageTag};
use crate::errors::{Result, SegsortError};
use crate::keys::MetaKey;
use crate::metadata::{FieldSlot, TraceMetadata};
use crate::schema::ColumnKind;

use super::phase::SortPhase;

/// Default divisor applied to the smallest local record count to get the
/// boundary region size.
pub const DEFAULT_REGION_DIVISOR: usize = 4;

/// Default minimum number of records every rank must hold in a multi-rank sort.
pub const DEFAULT_MIN_RECORDS_PER_RANK: usize = 4;

/// Tunables for [`distributed_sort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig {
    region_divisor: usize,
    min_records_per_rank: usize,
    max_rounds: Option<usize>,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            region_divisor: DEFAULT_REGION_DIVISOR,
            min_records_per_rank: DEFAULT_MIN_RECORDS_PER_RANK,
            max_rounds: None,
        }
    }
}

impl SortConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the boundary region divisor. Values below 1 are treated as 1.
    #[must_use]
    pub fn with_region_divisor(mut self, divisor: usize) -> Self {
        self.region_divisor = divisor.max(1);
        self
    }

    /// Set the minimum local record count for a multi-rank sort.
    #[must_use]
    pub fn with_min_records_per_rank(mut self, min: usize) -> Self {
        self.min_records_per_rank = min;
        self
    }

    /// Fail instead of running more than `rounds` exchange rounds.
    #[must_use]
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = Some(rounds);
        self
    }

    /// The boundary region divisor.
    #[must_use]
    pub fn region_divisor(&self) -> usize {
        self.region_divisor
    }

    /// The minimum local record count for a multi-rank sort.
    #[must_use]
    pub fn min_records_per_rank(&self) -> usize {
        self.min_records_per_rank
    }

    /// The round limit, if any.
    #[must_use]
    pub fn max_rounds(&self) -> Option<usize> {
        self.max_rounds
    }

    /// Region size for a group whose smallest rank holds `min_local` records.
    #[must_use]
    pub fn region_for(&self, min_local: usize) -> usize {
        min_local / self.region_divisor
    }
}

/// Result of a [`distributed_sort`] on one rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOutcome {
    /// `global_tags[i]` is the global tag of the record now at local position `i`.
    pub global_tags: Vec<usize>,
    /// Number of exchange rounds run, including the final unchanged one.
    pub rounds: usize,
    /// Number of rounds in which some rank's order changed.
    pub changed_rounds: usize,
    /// Boundary region size used for the exchanges.
    pub region: usize,
}

/// Run a fallible local step on every rank and agree on the outcome.
///
/// A rank whose own step failed returns its error; the others return
/// [`SegsortError::RemoteFailure`]. Either way every rank leaves together.
pub(crate) fn agree<C, T>(comm: &C, step: &str, local: Result<T>) -> Result<T>
where
    C: Communicator + ?Sized,
{
    let failures = comm.sum(u64::from(local.is_err()))?;
    match local {
        Ok(_) if failures > 0 => {
            Err(SegsortError::RemoteFailure { step: step.to_string(), ranks: failures })
        }
        other => other,
    }
}

/// Set each record's `Gtn` to its position in the concatenation of all ranks'
/// records. Returns this rank's offset into that sequence.
///
/// # Errors
///
/// Returns an error on every rank if any store lacks an Index `Gtn` field,
/// or if the reduction fails.
pub fn assign_global_tags<C>(comm: &C, store: &mut TraceMetadata) -> Result<usize>
where
    C: Communicator + ?Sized,
{
    agree(comm, "assign-global-tags", store.slot(MetaKey::Gtn, ColumnKind::Index))?;
    let offset = comm.offset(store.len() as u64)? as usize;
    for i in 0..store.len() {
        store.set_index(i, MetaKey::Gtn, offset + i)?;
    }
    Ok(offset)
}

/// Global sorted position of each of this rank's `len` records, assuming the
/// group is in global order.
pub fn sort_positions<C>(comm: &C, len: usize) -> Result<Vec<usize>>
where
    C: Communicator + ?Sized,
{
    let offset = comm.offset(len as u64)? as usize;
    Ok((offset..offset + len).collect())
}

/// Sort `store` so that the records of all ranks, concatenated in rank order,
/// are ordered by `less`.
///
/// `store` must hold global tags in an Index `Gtn` field (see
/// [`assign_global_tags`]) and `less` must be a strict total order. Each rank
/// keeps its record count.
///
/// # Errors
///
/// * [`SegsortError::InsufficientRecords`] if a multi-rank group has a rank
///   with too few records for a non-empty boundary region.
/// * [`SegsortError::RoundLimitExceeded`] if the configured round limit is hit.
/// * [`SegsortError::Communication`] or [`SegsortError::LockstepViolation`] if
///   an exchange fails. These are fatal to the whole group.
pub fn distributed_sort<C, F>(
    comm: &C,
    store: &mut TraceMetadata,
    less: &F,
    config: &SortConfig,
) -> Result<SortOutcome>
where
    C: Communicator + ?Sized,
    F: Fn(&TraceMetadata, usize, usize) -> bool + ?Sized,
{
    let gtn = agree(comm, "sort-setup", store.slot(MetaKey::Gtn, ColumnKind::Index))?;

    let rank = comm.rank();
    let num_ranks = comm.num_ranks();
    let multi_rank = num_ranks > 1;
    let local = store.len();

    let min_local = reduce(comm, "min-local", comm.min(local as u64))? as usize;
    let region = config.region_for(min_local);
    if multi_rank && (min_local < config.min_records_per_rank || region == 0) {
        return Err(SegsortError::InsufficientRecords {
            rank,
            min_local,
            required: config.min_records_per_rank.max(config.region_divisor),
        });
    }

    let first = rank == 0;
    let last = rank + 1 == num_ranks;
    let edge_left = if first { 0 } else { region };
    let suffix_end = if last { local } else { local + region };

    let mut work = store.resized(if multi_rank { local + region } else { local });
    let tags = |w: &TraceMetadata| leading_tags(w, gtn, local);

    let mut phase = SortPhase::LocalSort;
    let mut previous = Vec::new();
    let mut round = 0usize;
    let mut changed_rounds = 0usize;
    let mut converged = false;

    while phase != SortPhase::Done {
        if phase == SortPhase::SendLeft {
            round += 1;
        }
        let tag = MessageTag::for_phase(phase, round as u64);
        if phase.is_exchange() {
            debug!("Rank {rank}: {tag}, {region} record(s) each way");
        }
        match phase {
            SortPhase::LocalSort => {
                work.sort_range_by(0..local, less);
                previous = tags(&work);
            }
            SortPhase::SendLeft => {
                if !first {
                    send_region(comm, &work, rank - 1, tag, 0..region)?;
                }
                if !last {
                    receive_region(comm, &mut work, rank + 1, tag, local, region)?;
                }
            }
            SortPhase::SortSuffix => work.sort_range_by(edge_left..suffix_end, less),
            SortPhase::SendRight => {
                if !last {
                    send_region(comm, &work, rank + 1, tag, local..local + region)?;
                }
                if !first {
                    receive_region(comm, &mut work, rank - 1, tag, 0, region)?;
                }
            }
            SortPhase::SortPrefix => work.sort_range_by(0..local, less),
            SortPhase::ConvergenceCheck => {
                let current = tags(&work);
                let changed = current != previous;
                let changed_ranks = reduce(comm, phase.name(), comm.sum(u64::from(changed)))?;
                debug!("Rank {rank}: round {round} changed on {changed_ranks} rank(s)");

                converged = changed_ranks == 0;
                if !converged {
                    changed_rounds += 1;
                    if let Some(limit) = config.max_rounds.filter(|&limit| round >= limit) {
                        return Err(SegsortError::RoundLimitExceeded { rounds: limit });
                    }
                }
                previous = current;
            }
            SortPhase::Done => {}
        }
        phase = phase.next(converged, multi_rank);
    }

    *store = work.resized(local);
    if first {
        info!(
            "Sort finished on {num_ranks} rank(s): {round} round(s), {changed_rounds} with changes, region {region}"
        );
    }

    Ok(SortOutcome { global_tags: leading_tags(store, gtn, local), rounds: round, changed_rounds, region })
}

fn reduce<T>(comm: &(impl Communicator + ?Sized), operation: &str, result: Result<T>) -> Result<T> {
    result.inspect_err(|e| error!("Rank {}: {operation} reduction failed: {e}", comm.rank()))
}

fn send_region<C>(
    comm: &C,
    work: &TraceMetadata,
    dest: usize,
    tag: MessageTag,
    range: std::ops::Range<usize>,
) -> Result<()>
where
    C: Communicator + ?Sized,
{
    comm.send(dest, tag, work.pack_records(range))
        .inspect_err(|e| error!("Rank {}: {tag} to rank {dest} failed: {e}", comm.rank()))
}

fn receive_region<C>(
    comm: &C,
    work: &mut TraceMetadata,
    src: usize,
    tag: MessageTag,
    at: usize,
    expected: usize,
) -> Result<()>
where
    C: Communicator + ?Sized,
{
    let received = comm.recv(src, tag).and_then(|bytes| {
        let count = work.unpack_records(at, &bytes)?;
        if count == expected {
            Ok(())
        } else {
            Err(SegsortError::communication(
                tag.label,
                format!("from rank {src}"),
                format!("expected {expected} records, received {count}"),
            ))
        }
    });
    received.inspect_err(|e| error!("Rank {}: {tag} from rank {src} failed: {e}", comm.rank()))
}

fn leading_tags(store: &TraceMetadata, gtn: FieldSlot, count: usize) -> Vec<usize> {
    (0..count).map(|i| store.index_at(gtn, i)).collect()
}
