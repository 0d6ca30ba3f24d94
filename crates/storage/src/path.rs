//! Document path validation.
//!
//! Every path handed to a [`DocumentStore`](crate::DocumentStore) is relative
//! to the store root and must stay inside it.

use crate::error::{ErrorKind, Result};
use std::path::{Component, Path, PathBuf};

/// Extension of persisted fic documents.
pub const DOCUMENT_EXTENSION: &str = "toml";

/// Validates a document path, returning its normalized relative form.
///
/// `.` components and repeated separators are dropped and `..` is resolved
/// lexically. Paths that resolve to nothing, climb above the store root,
/// carry a platform prefix or contain a null byte are rejected with
/// [`InvalidPath`](crate::error::ErrorKind::InvalidPath).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use ficsync_storage::validate_path;
///
/// assert!(validate_path("Worm/worm.toml").is_ok());
/// assert!(validate_path("../outside.toml").is_err());
/// assert_eq!(validate_path("./a//b/../c.toml").unwrap(), Path::new("a/c.toml"));
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let invalid = || exn::Exn::from(ErrorKind::InvalidPath(original.to_path_buf()));
    let mut resolved: Vec<&std::ffi::OsStr> = Vec::new();
    for component in original.components() {
        match component {
            // Null bytes survive `components()` on Unix but truncate in syscalls.
            Component::Normal(name) if name.as_encoded_bytes().contains(&0) => return Err(invalid()),
            Component::Normal(name) => resolved.push(name),
            Component::CurDir | Component::RootDir => {},
            Component::ParentDir => {
                resolved.pop().ok_or_else(invalid)?;
            },
            Component::Prefix(_) => return Err(invalid()),
        }
    }
    if resolved.is_empty() {
        return Err(invalid());
    }
    Ok(resolved.into_iter().collect())
}

/// Returns `true` if `path` names a fic document.
pub fn is_document(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == DOCUMENT_EXTENSION)
}
