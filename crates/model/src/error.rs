//! Model Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Only the persisted document codec can fail; the
//! in-memory model itself is infallible.

use derive_more::{Display, Error};

/// A model error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The persisted document could not be parsed into a fic.
    #[display("malformed fic document")]
    Deserialize,
    /// The fic could not be rendered into its persisted form.
    #[display("failed to serialize fic document")]
    Serialize,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A document is either well-formed or it isn't.
        false
    }
}
