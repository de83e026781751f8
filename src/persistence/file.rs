//! File-backed storage for native builds

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{Storage, StorageError};

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are fixed identifiers; keep them filesystem-safe anyway
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        // Same-directory rename: readers see the old or the new record, never a torn one
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("plinko-{}-{}", name, std::process::id()))
    }

    #[test]
    fn test_file_round_trip() {
        let dir = temp_dir("round-trip");
        let mut storage = FileStorage::open(&dir).unwrap();

        assert_eq!(storage.get("plinko_session").unwrap(), None);
        storage.set("plinko_session", r#"{"balance":5}"#).unwrap();
        assert_eq!(
            storage.get("plinko_session").unwrap().as_deref(),
            Some(r#"{"balance":5}"#)
        );
        assert!(!dir.join("plinko_session.json.tmp").exists());

        storage.remove("plinko_session").unwrap();
        storage.remove("plinko_session").unwrap();
        assert_eq!(storage.get("plinko_session").unwrap(), None);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_key_sanitized() {
        let dir = temp_dir("sanitize");
        let storage = FileStorage::open(&dir).unwrap();
        let path = storage.path_for("../escape");
        assert_eq!(path.parent(), Some(dir.as_path()));
        let _ = fs::remove_dir_all(&dir);
    }
}
