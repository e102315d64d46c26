//! Flat-directory file store.
//!
//! Every stored file lives directly under one storage root, keyed by its
//! validated name. There is no caching layer: each call re-reads the
//! filesystem, which is the only state shared across connections (and
//! across worker processes in process mode).

use crate::error::StorageError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Validates a stored-file name before any filesystem access.
///
/// Names are flat: no path separators, no `..`, non-empty, and no leading
/// dot (which also keeps in-progress temp files out of listings).
pub fn validate_name(name: &str) -> Result<(), StorageError> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\');

    if invalid {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// A flat directory of stored files.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens or creates a store rooted at the given directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Returns the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Enumerates stored file names in lexicographic order.
    ///
    /// Only entries that are regular files with valid store names are
    /// listed, so partially written temp files never appear.
    pub fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if validate_name(name).is_ok() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Reads the full content of a stored file.
    pub fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        validate_name(name)?;
        let path = self.root.join(name);
        match fs::read(&path) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Writes a file atomically; last writer wins.
    ///
    /// Content goes to a temp file in the same directory, is synced, then
    /// renamed over the target, so a concurrent read observes either the
    /// previous content or the new content, never a torn write.
    pub fn write(&self, name: &str, data: &[u8]) -> Result<(), StorageError> {
        validate_name(name)?;
        let path = self.root.join(name);

        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StorageError::Io(e.error))?;

        tracing::debug!("stored {} ({} bytes)", name, data.len());
        Ok(())
    }

    /// Removes a stored file.
    pub fn remove(&self, name: &str) -> Result<(), StorageError> {
        validate_name(name)?;
        let path = self.root.join(name);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("removed {}", name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_write_read_roundtrip() {
        let (_dir, store) = test_store();
        store.write("a.bin", b"\x00\x01\x02payload").unwrap();
        assert_eq!(store.read("a.bin").unwrap(), b"\x00\x01\x02payload");
    }

    #[test]
    fn test_last_write_wins() {
        let (_dir, store) = test_store();
        store.write("a.txt", b"first").unwrap();
        store.write("a.txt", b"second").unwrap();
        assert_eq!(store.read("a.txt").unwrap(), b"second");
    }

    #[test]
    fn test_list_sorted() {
        let (_dir, store) = test_store();
        store.write("b.txt", b"b").unwrap();
        store.write("a.txt", b"a").unwrap();
        store.write("c.txt", b"c").unwrap();
        assert_eq!(store.list().unwrap(), vec!["a.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn test_list_empty_store() {
        let (_dir, store) = test_store();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_list_skips_directories_and_hidden_files() {
        let (dir, store) = test_store();
        store.write("visible.txt", b"x").unwrap();
        std::fs::create_dir(dir.path().join("subdir")).unwrap();
        std::fs::write(dir.path().join(".tmp-leftover"), b"junk").unwrap();
        assert_eq!(store.list().unwrap(), vec!["visible.txt"]);
    }

    #[test]
    fn test_read_missing_file() {
        let (_dir, store) = test_store();
        assert!(matches!(
            store.read("missing.txt"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove() {
        let (_dir, store) = test_store();
        store.write("a.txt", b"a").unwrap();
        store.remove("a.txt").unwrap();
        assert!(matches!(
            store.remove("a.txt"),
            Err(StorageError::NotFound(_))
        ));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_names_rejected_without_touching_disk() {
        let (dir, store) = test_store();
        for name in ["", "../x", "a/b", "a\\b", "..", ".hidden"] {
            assert!(
                matches!(store.write(name, b"x"), Err(StorageError::InvalidName(_))),
                "name {:?} should be rejected",
                name
            );
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_validate_name_accepts_plain_names() {
        for name in ["a.txt", "f.bin", "report-2024.pdf", "x"] {
            assert!(validate_name(name).is_ok());
        }
    }
}
