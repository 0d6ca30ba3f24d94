//! In-memory document store for testing.

use super::{DocumentInfoStream, DocumentStore};
use crate::error::{ErrorKind, Result};
use crate::models::DocumentInfo;
use crate::path::{is_document, validate as validate_path};
use async_stream::stream;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::sync::RwLock;

/// In-memory document store for testing.
///
/// Documents are kept in a `HashMap` behind a [`RwLock`], and every write is
/// recorded so tests can assert which documents were (or weren't) persisted.
///
/// # Examples
///
/// ```
/// use ficsync_storage::backend::MockStore;
/// use ficsync_storage::DocumentStore;
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MockStore::with_documents([("worm.toml", "title = \"Worm\"\n")]);
/// assert_eq!(store.list(None).await?.len(), 1);
/// store.write(Path::new("ward.toml"), b"").await?;
/// assert_eq!(store.writes().await, [Path::new("ward.toml")]);
/// # Ok(())
/// # }
/// ```
pub struct MockStore {
    name: String,
    documents: RwLock<HashMap<PathBuf, (OffsetDateTime, Vec<u8>)>>,
    writes: RwLock<Vec<PathBuf>>,
}

impl MockStore {
    /// Create a mock store pre-populated with documents.
    ///
    /// Panics if any path fails validation: broken test setup shouldn't pass.
    pub fn with_documents(documents: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let now = OffsetDateTime::now_utc();
        let mut map = HashMap::new();
        for (path, data) in documents {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                panic!("MockStore::with_documents: invalid path {}", path.display());
            };
            map.insert(validated, (now, data.into()));
        }
        Self {
            name: "mock".to_string(),
            documents: RwLock::new(map),
            writes: RwLock::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Every path written so far, in order.
    pub async fn writes(&self) -> Vec<PathBuf> {
        self.writes.read().await.clone()
    }

    /// A document's current contents as UTF-8, if present.
    pub async fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        let path = validate_path(path.as_ref()).ok()?;
        let guard = self.documents.read().await;
        let (_, data) = guard.get(&path)?;
        String::from_utf8(data.clone()).ok()
    }
}
impl Default for MockStore {
    fn default() -> Self {
        let documents: [(&str, &str); 0] = [];
        Self::with_documents(documents)
    }
}

#[async_trait]
impl DocumentStore for MockStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> DocumentInfoStream<'a> {
        let validated_prefix = match prefix.map(validate_path).transpose() {
            Ok(pfx) => pfx,
            Err(e) => return Box::pin(futures::stream::once(async { Err(e) })),
        };
        Box::pin(stream! {
            // Snapshot under the lock; don't hold it across yield points.
            let entries: Vec<DocumentInfo> = {
                let guard = self.documents.read().await;
                guard
                    .iter()
                    .filter(|(path, _)| is_document(path))
                    .filter(|(path, _)| validated_prefix.as_ref().is_none_or(|pfx| path.starts_with(pfx)))
                    .map(|(path, (modified, data))| DocumentInfo::new(path.clone(), data.len() as u64, *modified))
                    .collect()
            };
            for info in entries {
                yield Ok(info);
            }
        })
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        let guard = self.documents.read().await;
        let (_, data) = guard.get(&path).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path.clone())))?;
        Ok(data.clone())
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        self.documents.write().await.insert(path.clone(), (OffsetDateTime::now_utc(), data.to_vec()));
        self.writes.write().await.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_and_read() {
        let store = MockStore::default();
        store.write(Path::new("worm.toml"), b"hello").await.unwrap();
        assert_eq!(store.read(Path::new("worm.toml")).await.unwrap(), b"hello");
        assert_eq!(store.contents("worm.toml").await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_writes_are_recorded() {
        let store = MockStore::with_documents([("a.toml", "")]);
        assert!(store.writes().await.is_empty());
        store.write(Path::new("./b.toml"), b"").await.unwrap();
        store.write(Path::new("a.toml"), b"").await.unwrap();
        assert_eq!(store.writes().await, [PathBuf::from("b.toml"), PathBuf::from("a.toml")]);
    }

    #[tokio::test]
    async fn test_read_not_found() {
        let store = MockStore::default();
        let err = store.read(Path::new("missing.toml")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_with_prefix() {
        let store = MockStore::with_documents([
            ("Parahumans/worm.toml", "a"),
            ("Parahumans/ward.toml", "b"),
            ("Parahumans/notes.txt", "c"),
            ("Other/pact.toml", "d"),
        ]);
        assert_eq!(store.list(None).await.unwrap().len(), 3);
        assert_eq!(store.list(Some(Path::new("Parahumans"))).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let store = MockStore::default();
        assert!(store.read(Path::new("../etc/passwd")).await.is_err());
        assert!(store.write(Path::new("../escape.toml"), b"bad").await.is_err());
    }

    #[test]
    #[should_panic(expected = "invalid path")]
    fn test_with_documents_panics_on_bad_path() {
        MockStore::with_documents([("../escape.toml", "bad")]);
    }
}
