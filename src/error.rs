//! Update Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Each kind names the pipeline step that failed; the
//! error raised by the underlying crate is kept as a child.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An update error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for update operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("failed to list fic documents")]
    Discover,
    #[display("failed to read fic document")]
    Read,
    #[display("failed to parse fic document")]
    Parse,
    #[display("failed to fetch the latest version of the fic")]
    Retrieve,
    #[display("failed to inflate the merged fic")]
    Inflate,
    #[display("failed to serialize the updated fic")]
    Serialize,
    #[display("failed to write fic document")]
    Write,
    /// Tags any of the above with the document it happened to.
    #[display("failed to update {}", _0.display())]
    Document(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Only the kind is known here; callers wanting the underlying cause's
    /// verdict should walk the error tree.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Discover | Self::Read | Self::Retrieve | Self::Inflate | Self::Write)
    }
}
