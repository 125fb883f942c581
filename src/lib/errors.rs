//! Custom error types for segsort operations.

use segsort_fields::ScaleError;
use thiserror::Error;

use crate::keys::MetaKey;
use crate::schema::ColumnKind;

/// Result type alias for segsort operations
pub type Result<T> = std::result::Result<T, SegsortError>;

/// Error type for segsort operations
#[derive(Error, Debug)]
pub enum SegsortError {
    /// A record store was asked for a key its schema does not hold
    #[error("Metadata key '{key}' is not part of the schema")]
    UnknownKey {
        /// The missing key
        key: MetaKey,
    },

    /// A field was accessed through an accessor of the wrong kind
    #[error("Metadata key '{key}' is stored as {found}, not {expected}")]
    TypeMismatch {
        /// The key that was accessed
        key: MetaKey,
        /// The column kind the accessor expected
        expected: ColumnKind,
        /// The column kind the schema actually uses
        found: ColumnKind,
    },

    /// A string did not name any metadata key
    #[error("'{name}' is not a metadata key name")]
    UnknownKeyName {
        /// The unparsed name
        name: String,
    },

    /// A string did not name any sort type
    #[error("'{name}' is not a sort type")]
    UnknownSortType {
        /// The unparsed name
        name: String,
    },

    /// A key has no built-in layout to fall back on
    #[error("Metadata key '{key}' has no default descriptor")]
    NoDefaultDescriptor {
        /// The key without a default
        key: MetaKey,
    },

    /// A descriptor cannot be placed in the schema
    #[error("Invalid descriptor for '{key}': {reason}")]
    InvalidDescriptor {
        /// The key being added
        key: MetaKey,
        /// Explanation of the problem
        reason: String,
    },

    /// A record index was outside the store
    #[error("Record {index} is out of range for a store of {len} records")]
    RecordOutOfRange {
        /// The requested record
        index: usize,
        /// Number of records in the store
        len: usize,
    },

    /// A byte buffer was too short for the records it should hold
    #[error("Buffer of {actual} bytes is too short, need {required}")]
    BufferTooShort {
        /// Bytes needed
        required: usize,
        /// Bytes provided
        actual: usize,
    },

    /// An integer value does not fit the width of its header field
    #[error("Value {value} of '{key}' does not fit a {width}-byte field")]
    ValueOutOfRange {
        /// The key being written
        key: MetaKey,
        /// The value that did not fit
        value: i64,
        /// Field width in bytes
        width: usize,
    },

    /// A coordinate could not be scaled into a 4-byte field
    #[error(transparent)]
    Scale(#[from] ScaleError),

    /// A point-to-point exchange or reduction failed
    #[error("Communication failure during {operation} ({direction}): {reason}")]
    Communication {
        /// The operation that failed (e.g. "send-left")
        operation: String,
        /// Direction or peer description (e.g. "to rank 2")
        direction: String,
        /// The transport's error
        reason: String,
    },

    /// A rank received a message stamped for a different phase or round
    #[error("Lockstep violation: expected {expected}, received {found}")]
    LockstepViolation {
        /// The envelope this rank was waiting for
        expected: String,
        /// The envelope that arrived
        found: String,
    },

    /// Another rank failed a step that every rank must agree on
    #[error("{ranks} rank(s) failed during {step}")]
    RemoteFailure {
        /// The collective step that failed
        step: String,
        /// Number of ranks that reported a failure
        ranks: u64,
    },

    /// Too few records on some rank for a multi-rank sort
    #[error(
        "Rank {rank}: smallest local record count is {min_local}, a multi-rank sort needs at least {required}"
    )]
    InsufficientRecords {
        /// The rank reporting the error
        rank: usize,
        /// Minimum local record count across all ranks
        min_local: usize,
        /// Required minimum
        required: usize,
    },

    /// The sort did not converge within the configured number of rounds
    #[error("Sort did not converge within {rounds} rounds")]
    RoundLimitExceeded {
        /// The configured limit
        rounds: usize,
    },
}

impl SegsortError {
    /// Build a communication error from any displayable transport error.
    pub fn communication(
        operation: impl Into<String>,
        direction: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::Communication {
            operation: operation.into(),
            direction: direction.into(),
            reason: reason.to_string(),
        }
    }
}
