//! Retrieval Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Errors raised by the fetch, site and inflate
//! capabilities surface unchanged to the caller; nothing is retried here.

use derive_more::{Display, Error};

/// A retrieval error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A request failed, with the HTTP status when one was received.
    #[display("failed to fetch {url}{}", DisplayStatus(*status))]
    Fetch { url: String, status: Option<u16> },
    /// A site rejected or failed to interpret a fic.
    #[display("{site} could not read fic{}", DisplayStatus(*status))]
    Site { site: String, status: Option<u16> },
    /// No registered site handles the link.
    #[display("no site handles {_0}")]
    UnsupportedSite(#[error(not(source))] String),
    /// The fic has neither an `update_from` nor a `link` to refresh from.
    #[display("fic has no link to update from")]
    MissingLink,
    /// Resolving lazily fetched chapter content failed.
    #[display("failed to inflate fic")]
    Inflate,
}

impl ErrorKind {
    /// The HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Fetch { status, .. } | Self::Site { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        self.status().is_some_and(|status| status == 429 || (500..600).contains(&status))
    }
}

struct DisplayStatus(Option<u16>);

impl std::fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(status) => write!(f, " (HTTP {status})"),
            None => Ok(()),
        }
    }
}
