use std::path::PathBuf;
use time::OffsetDateTime;

/// Metadata about a stored document, returned by listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    /// Relative path from the store root
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified: OffsetDateTime,
}
impl DocumentInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: OffsetDateTime) -> Self {
        Self { path: path.into(), size, modified }
    }
}
