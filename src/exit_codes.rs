//! Exit code constants for the treelock CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid files, empty request)
//! - 2: Object not found in the graph
//! - 3: Lock precondition failed (object not locked as expected)
//! - 4: Lock acquisition failure (contention after retries)
//! - 70: Internal error (lock table invariant violated)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, unreadable or invalid input files.
pub const USER_ERROR: i32 = 1;

/// A requested object id does not exist in the graph.
pub const NOT_FOUND: i32 = 2;

/// An `assert_*_locked` check failed.
pub const PRECONDITION_FAILURE: i32 = 3;

/// Lock acquisition failure: the retry budget was exhausted.
pub const LOCK_FAILURE: i32 = 4;

/// Internal software error.
pub const INTERNAL_ERROR: i32 = 70;
