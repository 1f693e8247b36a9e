//! Filesystem blob storage.
//!
//! Blobs are addressed by a relative path such as `events/42/<token>.jpg`
//! and live under a single root directory. Writes go to a temporary file in
//! the destination directory and are renamed into place, so readers never
//! observe a partially written blob.

use std::io::{ErrorKind, Read, Write};
use std::path::{Component, Path, PathBuf};

use eventimg_common::{Error, Result};

/// Storage backend for encoded image bytes.
pub trait BlobStore: Send + Sync {
    /// Write `data` at `path`, replacing any existing blob.
    fn put(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Open the blob at `path` for reading.
    ///
    /// Fails with [`Error::NotFound`] if no blob exists there.
    fn get(&self, path: &str) -> Result<Box<dyn Read + Send>>;

    /// Remove the blob at `path`.
    ///
    /// Returns `false` if there was nothing to remove; absence is not an error.
    fn delete(&self, path: &str) -> Result<bool>;
}

/// [`BlobStore`] rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|e| Error::storage(root.display().to_string(), e))?;
        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative blob path to its location on disk.
    ///
    /// Rejects empty and absolute paths and any `..` component so a stored
    /// path can never address a file outside the root.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        if path.is_empty() {
            return Err(Error::validation("blob path cannot be empty"));
        }

        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(Error::validation(format!(
                        "blob path must be relative and stay inside the store: {path:?}"
                    )))
                }
            }
        }

        if resolved == self.root {
            return Err(Error::validation(format!("blob path has no file name: {path:?}")));
        }
        Ok(resolved)
    }
}

impl BlobStore for LocalBlobStore {
    fn put(&self, path: &str, data: &[u8]) -> Result<()> {
        let target = self.resolve(path)?;
        let parent = target
            .parent()
            .ok_or_else(|| Error::storage(path, "blob path has no parent directory"))?;

        std::fs::create_dir_all(parent).map_err(|e| Error::storage(path, e))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".upload-")
            .tempfile_in(parent)
            .map_err(|e| Error::storage(path, e))?;
        tmp.write_all(data).map_err(|e| Error::storage(path, e))?;
        tmp.as_file().sync_all().map_err(|e| Error::storage(path, e))?;
        tmp.persist(&target)
            .map_err(|e| Error::storage(path, e.error))?;

        tracing::trace!(path, bytes = data.len(), "blob written");
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        let target = self.resolve(path)?;
        let file = match std::fs::File::open(&target) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(Error::not_found("blob", path)),
            Err(e) => return Err(Error::storage(path, e)),
        };

        // Directories open fine on unix but are not blobs.
        let meta = file.metadata().map_err(|e| Error::storage(path, e))?;
        if !meta.is_file() {
            return Err(Error::not_found("blob", path));
        }
        Ok(Box::new(file))
    }

    fn delete(&self, path: &str) -> Result<bool> {
        let target = self.resolve(path)?;
        match std::fs::remove_file(&target) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::storage(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, LocalBlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().join("images")).unwrap();
        (dir, store)
    }

    fn read_all(store: &LocalBlobStore, path: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        store.get(path).unwrap().read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_put_creates_parent_and_get_reads_back() {
        let (_dir, store) = store();
        store.put("events/1/a.jpg", b"jpeg bytes").unwrap();

        assert!(store.root().join("events/1/a.jpg").is_file());
        assert_eq!(read_all(&store, "events/1/a.jpg"), b"jpeg bytes");
    }

    #[test]
    fn test_put_leaves_no_temp_files() {
        let (_dir, store) = store();
        store.put("events/1/a.jpg", b"x").unwrap();

        let names: Vec<_> = std::fs::read_dir(store.root().join("events/1"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("a.jpg")]);
    }

    #[test]
    fn test_put_overwrites() {
        let (_dir, store) = store();
        store.put("events/1/a.jpg", b"old").unwrap();
        store.put("events/1/a.jpg", b"new").unwrap();
        assert_eq!(read_all(&store, "events/1/a.jpg"), b"new");
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let (_dir, store) = store();
        assert!(matches!(
            store.get("events/1/missing.jpg"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_get_directory_is_not_found() {
        let (_dir, store) = store();
        store.put("events/1/a.jpg", b"x").unwrap();

        assert!(matches!(store.get("events/1"), Err(Error::NotFound { .. })));
        assert!(matches!(store.get("events"), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (_dir, store) = store();
        store.put("events/2/b.jpg", b"x").unwrap();

        assert!(store.delete("events/2/b.jpg").unwrap());
        assert!(!store.delete("events/2/b.jpg").unwrap());
        assert!(!store.root().join("events/2/b.jpg").exists());
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let (_dir, store) = store();
        for bad in ["", "../etc/passwd", "events/../../x", "/abs/path.jpg", "."] {
            assert!(
                matches!(store.resolve(bad), Err(Error::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
        assert_eq!(
            store.resolve("./events/3/c.jpg").unwrap(),
            store.root().join("events/3/c.jpg")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_put_into_read_only_dir_is_storage_error() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = store();
        let locked = store.root().join("events/9");
        std::fs::create_dir_all(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

        let result = store.put("events/9/x.jpg", b"x");

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        // Root ignores permission bits; only assert when the write was refused.
        if let Err(err) = result {
            assert!(matches!(err, Error::Storage { .. }));
        }
    }
}
