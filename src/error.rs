//! Error types for treelock.
//!
//! Uses thiserror for derive macros. Contention, missing objects and failed
//! lock assertions are distinct variants so callers never confuse a busy
//! object with a bad request.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for treelock operations.
#[derive(Error, Debug)]
pub enum TreelockError {
    /// User provided invalid input (config, graph or script files).
    #[error("{0}")]
    UserError(String),

    /// A requested object (or tree root) does not exist in the graph.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// A lock request named no objects at all.
    #[error("Lock request does not name any object")]
    EmptyRequest,

    /// The caller expected to hold a lock it does not hold.
    #[error("{0}")]
    NotLocked(String),

    /// The lock could not be acquired before the retry budget ran out.
    #[error("Locking failed: {0}")]
    LockingFailed(String),

    /// The lock table would have been left in an inconsistent state.
    ///
    /// Never expected at runtime; indicates a bug in the acquisition engine.
    #[error("Lock table invariant violated: {0}")]
    InvariantViolation(String),
}

impl TreelockError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            TreelockError::UserError(_) => exit_codes::USER_ERROR,
            TreelockError::EmptyRequest => exit_codes::USER_ERROR,
            TreelockError::NotFound(_) => exit_codes::NOT_FOUND,
            TreelockError::NotLocked(_) => exit_codes::PRECONDITION_FAILURE,
            TreelockError::LockingFailed(_) => exit_codes::LOCK_FAILURE,
            TreelockError::InvariantViolation(_) => exit_codes::INTERNAL_ERROR,
        }
    }

    /// Whether retrying the same request later could succeed.
    pub fn is_contention(&self) -> bool {
        matches!(self, TreelockError::LockingFailed(_))
    }
}

/// Result type alias for treelock operations.
pub type Result<T> = std::result::Result<T, TreelockError>;
