//! Error types for the festival ledger.
//!
//! Business rejections are values announced on the action stream; only the
//! facade turns them into `Err`.

use festledger_runtime::StoreError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Why a command was refused
///
/// A rejected command never changes the ledger.
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// A required field was empty
    #[error("missing required field: {field}")]
    MissingField {
        /// Field name
        field: String,
    },

    /// A field was present but unusable
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Field name
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// A referenced record does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind ("show", "ticket", ...)
        entity: String,
        /// Identifier looked up
        id: String,
    },

    /// Not enough seats left for the whole batch
    #[error("capacity exceeded for {show_id}: requested {requested}, remaining {remaining}")]
    CapacityExceeded {
        /// Show being sold
        show_id: String,
        /// Tickets requested
        requested: u32,
        /// Seats left
        remaining: u32,
    },

    /// Only sold, unredeemed tickets can be voided
    #[error("ticket {tid} is {status} and cannot be voided")]
    TicketNotVoidable {
        /// Ticket identifier
        tid: String,
        /// Current status
        status: String,
    },

    /// The person already holds an active assignment on this shift
    #[error("{pid} is already assigned to {shift_id}")]
    DuplicateAssignment {
        /// Person
        pid: String,
        /// Shift
        shift_id: String,
    },

    /// The import file could not be read at all
    #[error("import failed: {reason}")]
    ImportFailed {
        /// Parse failure
        reason: String,
    },

    /// A backup document could not be parsed
    #[error("corrupt snapshot: {reason}")]
    CorruptSnapshot {
        /// Parse failure
        reason: String,
    },
}

impl Rejection {
    pub(crate) fn missing(field: &str) -> Self {
        Self::MissingField {
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(entity: &str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.into(),
        }
    }
}

/// Failure reading or writing a snapshot
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Filesystem failure
    #[error("I/O error at {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Document could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Simulated or backend-specific write failure
    #[error("snapshot store unavailable: {0}")]
    Unavailable(String),
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Error returned by [`crate::FestivalLedger`] operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The ledger refused the command
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// The store is shutting down or did not answer in time
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Snapshot storage failed
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// The store answered with an event of the wrong kind
    #[error("unexpected outcome: {0}")]
    UnexpectedOutcome(String),
}

/// Result type for ledger facade operations
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_messages_name_the_problem() {
        let err = Rejection::CapacityExceeded {
            show_id: "IMP25-S01".into(),
            requested: 5,
            remaining: 3,
        };
        assert_eq!(
            err.to_string(),
            "capacity exceeded for IMP25-S01: requested 5, remaining 3"
        );
        assert_eq!(Rejection::missing("title").to_string(), "missing required field: title");
    }

    #[test]
    fn facade_error_is_transparent_for_rejections() {
        let err: LedgerError = Rejection::not_found("ticket", "T9").into();
        assert_eq!(err.to_string(), "ticket not found: T9");
    }
}
