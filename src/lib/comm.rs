//! Process-group communication.
//!
//! The distributed sort only needs a small collective vocabulary: tagged
//! point-to-point send/receive between ranks, and an all-gather of one `u64`
//! per rank from which the reductions (sum, min, max, exclusive prefix sum)
//! and the barrier are derived. [`Communicator`] captures that vocabulary so
//! the sort can run over any transport.
//!
//! [`LocalGroup`] is an in-process implementation: each rank is a
//! [`LocalComm`] handle, normally driven on its own thread (see
//! [`run_ranks`]). Every ordered pair of ranks has an unbounded
//! `crossbeam-channel`, so sends never block and "everyone sends, then
//! everyone receives" cannot deadlock.
//!
//! # Lockstep checking
//!
//! Every point-to-point message carries a [`MessageTag`] naming the phase and
//! round it belongs to, and every all-gather carries a sequence number. A rank
//! that receives anything other than what it is waiting for reports
//! [`SegsortError::LockstepViolation`] instead of silently consuming data
//! meant for another step.

use std::cell::Cell;
use std::fmt;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};

use crate::errors::{Result, SegsortError};
use crate::sort::SortPhase;

/// Identifies which step of a collective protocol a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageTag {
    /// Name of the step (e.g. "send-left")
    pub label: &'static str,
    /// Round number within the protocol
    pub round: u64,
}

impl MessageTag {
    /// Create a tag from a step label and round.
    #[must_use]
    pub const fn new(label: &'static str, round: u64) -> Self {
        Self { label, round }
    }

    /// Create a tag for a sort phase.
    #[must_use]
    pub fn for_phase(phase: SortPhase, round: u64) -> Self {
        Self::new(phase.name(), round)
    }
}

impl fmt::Display for MessageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of round {}", self.label, self.round)
    }
}

/// Collective operations the distributed sort relies on.
///
/// Every rank must call the same operations in the same order.
pub trait Communicator {
    /// This process's rank.
    fn rank(&self) -> usize;

    /// Number of ranks in the group.
    fn num_ranks(&self) -> usize;

    /// Send `payload` to `dest`. Must not block waiting for the receiver.
    fn send(&self, dest: usize, tag: MessageTag, payload: Vec<u8>) -> Result<()>;

    /// Receive the next message from `src`, which must carry `tag`.
    fn recv(&self, src: usize, tag: MessageTag) -> Result<Vec<u8>>;

    /// Gather one value from every rank, in rank order.
    fn all_gather(&self, value: u64) -> Result<Vec<u64>>;

    /// Sum of `value` over all ranks.
    fn sum(&self, value: u64) -> Result<u64> {
        Ok(self.all_gather(value)?.iter().sum())
    }

    /// Minimum of `value` over all ranks.
    fn min(&self, value: u64) -> Result<u64> {
        Ok(self.all_gather(value)?.into_iter().min().unwrap_or(value))
    }

    /// Maximum of `value` over all ranks.
    fn max(&self, value: u64) -> Result<u64> {
        Ok(self.all_gather(value)?.into_iter().max().unwrap_or(value))
    }

    /// Exclusive prefix sum: the sum of `value` over all lower ranks.
    fn offset(&self, value: u64) -> Result<u64> {
        let all = self.all_gather(value)?;
        Ok(all[..self.rank()].iter().sum())
    }

    /// Block until every rank has reached this point.
    fn barrier(&self) -> Result<()> {
        self.all_gather(0).map(|_| ())
    }
}

/// Wire envelope between two in-process ranks.
#[derive(Debug)]
enum Envelope {
    Point { tag: MessageTag, payload: Vec<u8> },
    Gather { seq: u64, value: u64 },
}

impl Envelope {
    fn describe(&self) -> String {
        match self {
            Self::Point { tag, .. } => tag.to_string(),
            Self::Gather { seq, .. } => format!("all-gather #{seq}"),
        }
    }
}

/// Factory for in-process rank groups.
pub struct LocalGroup;

impl LocalGroup {
    /// Create `n` connected rank handles, indexed by rank.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero.
    #[must_use]
    #[allow(clippy::new_ret_no_self)]
    pub fn new(n: usize) -> Vec<LocalComm> {
        assert!(n > 0, "a process group needs at least one rank");
        // channels[from][to]
        let mut txs: Vec<Vec<Sender<Envelope>>> = Vec::with_capacity(n);
        let mut rxs: Vec<Vec<Option<Receiver<Envelope>>>> = (0..n).map(|_| Vec::new()).collect();
        for _from in 0..n {
            let mut row = Vec::with_capacity(n);
            for to_rx in rxs.iter_mut() {
                let (tx, rx) = unbounded();
                row.push(tx);
                to_rx.push(Some(rx));
            }
            txs.push(row);
        }

        txs.into_iter()
            .enumerate()
            .map(|(rank, senders)| {
                let receivers = rxs[rank].iter_mut().filter_map(Option::take).collect();
                LocalComm { rank, senders, receivers, gather_seq: Cell::new(0), timeout: None }
            })
            .collect()
    }
}

/// One rank's handle into a [`LocalGroup`].
pub struct LocalComm {
    rank: usize,
    /// `senders[dest]` carries messages from this rank to `dest`.
    senders: Vec<Sender<Envelope>>,
    /// `receivers[src]` carries messages from `src` to this rank.
    receivers: Vec<Receiver<Envelope>>,
    gather_seq: Cell<u64>,
    timeout: Option<Duration>,
}

impl LocalComm {
    /// A group of exactly one rank.
    #[must_use]
    pub fn solo() -> Self {
        let mut group = LocalGroup::new(1);
        group.remove(0)
    }

    /// Fail receives that wait longer than `timeout` instead of blocking forever.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn sender(&self, dest: usize, operation: &str) -> Result<&Sender<Envelope>> {
        self.senders.get(dest).ok_or_else(|| {
            SegsortError::communication(
                operation,
                format!("to rank {dest}"),
                format!("no such rank in a group of {}", self.senders.len()),
            )
        })
    }

    fn post(&self, dest: usize, envelope: Envelope, operation: &str) -> Result<()> {
        self.sender(dest, operation)?.send(envelope).map_err(|e| {
            SegsortError::communication(operation, format!("to rank {dest}"), e)
        })
    }

    fn take(&self, src: usize, operation: &str) -> Result<Envelope> {
        let direction = || format!("from rank {src}");
        let receiver = self.receivers.get(src).ok_or_else(|| {
            SegsortError::communication(operation, direction(), "no such rank")
        })?;
        match self.timeout {
            None => receiver
                .recv()
                .map_err(|e| SegsortError::communication(operation, direction(), e)),
            Some(timeout) => receiver.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => SegsortError::communication(
                    operation,
                    direction(),
                    format!("timed out after {timeout:?}"),
                ),
                RecvTimeoutError::Disconnected => {
                    SegsortError::communication(operation, direction(), e)
                }
            }),
        }
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn num_ranks(&self) -> usize {
        self.senders.len()
    }

    fn send(&self, dest: usize, tag: MessageTag, payload: Vec<u8>) -> Result<()> {
        self.post(dest, Envelope::Point { tag, payload }, tag.label)
    }

    fn recv(&self, src: usize, tag: MessageTag) -> Result<Vec<u8>> {
        match self.take(src, tag.label)? {
            Envelope::Point { tag: found, payload } if found == tag => Ok(payload),
            other => Err(SegsortError::LockstepViolation {
                expected: tag.to_string(),
                found: other.describe(),
            }),
        }
    }

    fn all_gather(&self, value: u64) -> Result<Vec<u64>> {
        let seq = self.gather_seq.get() + 1;
        self.gather_seq.set(seq);

        for dest in (0..self.num_ranks()).filter(|&d| d != self.rank) {
            self.post(dest, Envelope::Gather { seq, value }, "all-gather")?;
        }

        let mut values = Vec::with_capacity(self.num_ranks());
        for src in 0..self.num_ranks() {
            if src == self.rank {
                values.push(value);
                continue;
            }
            match self.take(src, "all-gather")? {
                Envelope::Gather { seq: found, value } if found == seq => values.push(value),
                other => {
                    return Err(SegsortError::LockstepViolation {
                        expected: format!("all-gather #{seq}"),
                        found: other.describe(),
                    });
                }
            }
        }
        Ok(values)
    }
}

/// Run `f` once per rank of a fresh `n`-rank group, each on its own thread,
/// and return the results in rank order.
///
/// A panic on any rank is resumed on the calling thread.
pub fn run_ranks<F, R>(n: usize, f: F) -> Vec<R>
where
    F: Fn(LocalComm) -> R + Sync,
    R: Send,
{
    let comms = LocalGroup::new(n);
    let f = &f;
    std::thread::scope(|scope| {
        let handles: Vec<_> =
            comms.into_iter().map(|comm| scope.spawn(move || f(comm))).collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    })
}
