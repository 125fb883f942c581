//! Lockstep state machine for the boundary rotation sort.
//!
//! Every rank walks the same sequence of phases. The transition function is
//! pure and depends only on values every rank agrees on (the group size and
//! the reduced convergence flag), so all ranks make identical transitions.

use std::fmt;

/// One step of the boundary rotation sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortPhase {
    /// Sort the whole local slice.
    LocalSort,
    /// Send the leading boundary region to the left neighbour.
    SendLeft,
    /// Sort from the left edge to the end of the scratch buffer.
    SortSuffix,
    /// Send the trailing boundary region to the right neighbour.
    SendRight,
    /// Sort the records this rank keeps.
    SortPrefix,
    /// Compare tags with the previous round and reduce the changed flag.
    ConvergenceCheck,
    /// Sorting is complete.
    Done,
}

impl SortPhase {
    /// The phase that follows this one.
    ///
    /// `converged` is only consulted after [`SortPhase::ConvergenceCheck`];
    /// `multi_rank` only after [`SortPhase::LocalSort`].
    #[must_use]
    pub fn next(self, converged: bool, multi_rank: bool) -> Self {
        match self {
            Self::LocalSort if multi_rank => Self::SendLeft,
            Self::LocalSort => Self::Done,
            Self::SendLeft => Self::SortSuffix,
            Self::SortSuffix => Self::SendRight,
            Self::SendRight => Self::SortPrefix,
            Self::SortPrefix => Self::ConvergenceCheck,
            Self::ConvergenceCheck if converged => Self::Done,
            Self::ConvergenceCheck => Self::SendLeft,
            Self::Done => Self::Done,
        }
    }

    /// Kebab-case name, used in message tags and logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::LocalSort => "local-sort",
            Self::SendLeft => "send-left",
            Self::SortSuffix => "sort-suffix",
            Self::SendRight => "send-right",
            Self::SortPrefix => "sort-prefix",
            Self::ConvergenceCheck => "convergence-check",
            Self::Done => "done",
        }
    }

    /// Whether the phase exchanges records with a neighbour.
    #[must_use]
    pub fn is_exchange(self) -> bool {
        matches!(self, Self::SendLeft | Self::SendRight)
    }
}

impl fmt::Display for SortPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
