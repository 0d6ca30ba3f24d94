//! Local filesystem document store.
//!
//! Documents live under a root directory and are accessed through
//! `tokio::fs`. Writes go to a sibling temporary file which is then renamed
//! over the target.

use crate::backend::{DocumentInfoStream, DocumentStore};
use crate::error::{ErrorKind, Result};
use crate::models::DocumentInfo;
use crate::path::{is_document, validate as validate_path};
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use std::ffi::OsString;
use std::fs::{Metadata, create_dir_all as sync_create_dir};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem document store.
///
/// # Examples
///
/// ```no_run
/// use ficsync_storage::backend::LocalStore;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = LocalStore::new("fics", "/home/reader/fics")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalStore {
    name: String,
    root: PathBuf,
}
impl LocalStore {
    /// Create a store rooted at an absolute directory, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPath`](crate::error::ErrorKind::InvalidPath) if `root`
    /// is relative or names something other than a directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            // Only ever happens once, at start-up.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }
        Ok(Self { name: name.into(), root })
    }

    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    fn relative_path(&self, absolute: &Path) -> Result<PathBuf> {
        let relative = absolute.strip_prefix(&self.root).or_raise(|| {
            ErrorKind::BackendError(format!("path `{}` is not within root `{}`", absolute.display(), self.root.display()))
        })?;
        validate_path(relative)
    }

    /// `worm.toml` is staged as `.worm.toml.tmp` in the same directory, so the
    /// final rename never crosses a filesystem boundary.
    fn staging_path(target: &Path) -> Option<PathBuf> {
        let file_name = target.file_name()?;
        let mut staged = OsString::from(".");
        staged.push(file_name);
        staged.push(".tmp");
        Some(target.with_file_name(staged))
    }

    fn info(relative: PathBuf, metadata: &Metadata) -> Result<DocumentInfo> {
        let modified = metadata.modified().map_err(ErrorKind::Io)?.into();
        Ok(DocumentInfo::new(relative, metadata.len(), modified))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    /// Every entry of `dir` with its metadata. A directory that doesn't exist
    /// (or isn't a directory) has no entries.
    async fn entries(dir: &Path) -> Result<Vec<(PathBuf, Metadata)>> {
        let mut reader = match fs::read_dir(dir).await {
            Ok(reader) => reader,
            Err(e) if matches!(e.kind(), std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory) => {
                return Ok(Vec::new());
            },
            Err(e) => exn::bail!(Self::map_io_error(e, dir)),
        };
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(|e| Self::map_io_error(e, dir))? {
            let path = entry.path();
            let metadata = entry.metadata().await.map_err(|e| Self::map_io_error(e, &path))?;
            entries.push((path, metadata));
        }
        Ok(entries)
    }
}

#[async_trait]
impl DocumentStore for LocalStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> DocumentInfoStream<'a> {
        let start = match prefix.map(|pfx| self.absolute_path(pfx)).transpose() {
            Ok(start) => start.unwrap_or_else(|| self.root.clone()),
            Err(e) => return Box::pin(futures::stream::once(async { Result::Err(e) })),
        };

        Box::pin(stream! {
            let mut directories = vec![start];
            while let Some(directory) = directories.pop() {
                let entries = match Self::entries(&directory).await {
                    Ok(entries) => entries,
                    Err(e) => {
                        yield Err(e);
                        continue;
                    },
                };
                for (path, metadata) in entries {
                    if metadata.is_dir() {
                        directories.push(path);
                    } else if metadata.is_file() && is_document(&path) {
                        yield self.relative_path(&path).and_then(|relative| Self::info(relative, &metadata));
                    }
                }
            }
        })
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::read(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        let staged = Self::staging_path(&abs_path).ok_or_else(|| exn::Exn::from(ErrorKind::InvalidPath(path.to_path_buf())))?;
        if let Some(parent) = abs_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, path))?;
        }
        fs::write(&staged, data).await.map_err(|e| Self::map_io_error(e, path))?;
        if let Err(e) = fs::rename(&staged, &abs_path).await {
            if let Err(cleanup) = fs::remove_file(&staged).await {
                tracing::warn!(path = %staged.display(), error = %cleanup, "Failed to remove staged document");
            }
            exn::bail!(Self::map_io_error(e, path));
        }
        tracing::trace!(store = %self.name, path = %path.display(), bytes = data.len(), "Wrote document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, LocalStore) {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("fics", temp_dir.path()).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_new_requires_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalStore::new("fics", temp_dir.path()).is_ok());
        assert!(LocalStore::new("fics", "relative/path").is_err());
    }

    #[test]
    fn test_new_creates_missing_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("nested/root");
        LocalStore::new("fics", &root).unwrap();
        assert!(root.is_dir());
    }

    #[test]
    fn test_staging_path() {
        assert_eq!(
            LocalStore::staging_path(Path::new("/fics/a/worm.toml")).unwrap(),
            Path::new("/fics/a/.worm.toml.tmp")
        );
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let (_dir, store) = store();
        store.write(Path::new("worm.toml"), b"title = \"Worm\"\n").await.unwrap();
        assert_eq!(store.read(Path::new("worm.toml")).await.unwrap(), b"title = \"Worm\"\n");
    }

    #[tokio::test]
    async fn test_write_replaces_and_leaves_no_staging_file() {
        let (dir, store) = store();
        store.write(Path::new("a/worm.toml"), b"old").await.unwrap();
        store.write(Path::new("a/worm.toml"), b"new").await.unwrap();
        assert_eq!(store.read(Path::new("a/worm.toml")).await.unwrap(), b"new");
        let names: Vec<_> = std::fs::read_dir(dir.path().join("a")).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(names, [OsString::from("worm.toml")]);
    }

    #[tokio::test]
    async fn test_read_not_found() {
        let (_dir, store) = store();
        let err = store.read(Path::new("missing.toml")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_only_documents() {
        let (_dir, store) = store();
        store.write(Path::new("Parahumans/worm.toml"), b"a").await.unwrap();
        store.write(Path::new("Parahumans/ward.toml"), b"b").await.unwrap();
        store.write(Path::new("Other/pact.toml"), b"c").await.unwrap();
        store.write(Path::new("Parahumans/notes.txt"), b"d").await.unwrap();
        assert_eq!(store.list(None).await.unwrap().len(), 3);
        let mut paths: Vec<_> = store.list(Some(Path::new("Parahumans"))).await.unwrap().into_iter().map(|i| i.path).collect();
        paths.sort();
        assert_eq!(paths, [PathBuf::from("Parahumans/ward.toml"), PathBuf::from("Parahumans/worm.toml")]);
    }

    #[tokio::test]
    async fn test_list_nested_prefix() {
        let (_dir, store) = store();
        store.write(Path::new("a/b/c/deep.toml"), b"a").await.unwrap();
        store.write(Path::new("a/bc/shallow.toml"), b"b").await.unwrap();
        let files = store.list(Some(Path::new("a/b"))).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, Path::new("a/b/c/deep.toml"));
        assert!(store.list(Some(Path::new("nonexistent"))).await.unwrap().is_empty());
        // A document isn't a directory to list under.
        assert!(store.list(Some(Path::new("a/bc/shallow.toml"))).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_skips_staged_documents() {
        let (dir, store) = store();
        store.write(Path::new("worm.toml"), b"a").await.unwrap();
        std::fs::write(dir.path().join(".ward.toml.tmp"), b"partial").unwrap();
        let files = store.list(None).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, Path::new("worm.toml"));
        assert_eq!(files[0].size, 1);
    }

    #[tokio::test]
    async fn test_path_security() {
        let (_dir, store) = store();
        assert!(store.read(Path::new("../etc/passwd")).await.is_err());
        assert!(store.write(Path::new("../escape.toml"), b"data").await.is_err());
    }
}
