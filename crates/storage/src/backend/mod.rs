//! Document store trait and implementations.
//!
//! A [`DocumentStore`] is the persistence boundary of an update: documents
//! are read before retrieval and written back only once merge and
//! aggregation have both finished, so a failed update never leaves a
//! partially merged document behind.

mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::local::LocalStore;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockStore;
use crate::error::Result;
use crate::models::DocumentInfo;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;

pub(crate) type DocumentInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<DocumentInfo>> + Send + 'a>>;

/// Unified interface over wherever fic documents live.
///
/// All paths are relative to the store root and validated with
/// [`validate_path`](crate::validate_path) before use.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use ficsync_storage::{DocumentStore, error::Result};
///
/// async fn touch(store: &dyn DocumentStore) -> Result<()> {
///     let path = Path::new("Parahumans/worm.toml");
///     let data = store.read(path).await?;
///     store.write(path, &data).await
/// }
/// ```
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name of the store, for logging.
    fn name(&self) -> &str;

    /// List every document under an optional prefix.
    ///
    /// Collects [`list_stream()`](Self::list_stream) into a [`Vec`].
    async fn list(&self, prefix: Option<&Path>) -> Result<Vec<DocumentInfo>> {
        self.list_stream(prefix).try_collect().await
    }

    /// Stream metadata for every document (see
    /// [`is_document`](crate::is_document)) under an optional directory
    /// prefix.
    ///
    /// A prefix that doesn't exist yields an empty stream, not an error.
    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> DocumentInfoStream<'a>;

    /// Read a document's contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the
    /// document does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Replace a document's contents, creating it (and any parent
    /// directories) if needed.
    ///
    /// Readers never observe a partially written document.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;
}
