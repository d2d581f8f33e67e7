//! Local resource state.
//!
//! Each resource keeps one JSON record under the state directory
//! (`init.json`, `unseal.json`). Records are written to a temporary file and
//! renamed into place, so a failed write never leaves a half-written record.

use crate::error::{OperatorError, OperatorResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// JSON-file store for resource records.
#[derive(Clone, Debug)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Platform data directory, e.g. `~/.local/share/vaultop` on Linux.
    #[must_use]
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vaultop")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for `kind`.
    pub fn path(&self, kind: &str) -> PathBuf {
        self.dir.join(format!("{kind}.json"))
    }

    /// Writes the record for `kind`, replacing any previous one.
    pub fn save<T: Serialize>(&self, kind: &str, record: &T) -> OperatorResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| storage_error(&self.dir, e))?;

        let path = self.path(kind);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(record)?;

        fs::write(&tmp, json).map_err(|e| storage_error(&tmp, e))?;
        restrict_permissions(&tmp)?;
        fs::rename(&tmp, &path).map_err(|e| storage_error(&path, e))?;

        debug!(path = %path.display(), "saved resource state");
        Ok(())
    }

    /// Reads the record for `kind`, or `None` if there is none.
    pub fn load<T: DeserializeOwned>(&self, kind: &str) -> OperatorResult<Option<T>> {
        let path = self.path(kind);
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path).map_err(|e| storage_error(&path, e))?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    #[must_use]
    pub fn exists(&self, kind: &str) -> bool {
        self.path(kind).exists()
    }

    /// Removes the record for `kind`. Missing records are not an error.
    pub fn clear(&self, kind: &str) -> OperatorResult<()> {
        let path = self.path(kind);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| storage_error(&path, e))?;
            debug!(path = %path.display(), "cleared resource state");
        }
        Ok(())
    }
}

fn storage_error(path: &Path, source: io::Error) -> OperatorError {
    OperatorError::Storage {
        path: path.display().to_string(),
        source,
    }
}

// Records hold root tokens and key shares.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> OperatorResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| storage_error(path, e))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> OperatorResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        id: String,
        count: u32,
    }

    #[test]
    fn save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested"));
        let record = Record {
            id: "a".into(),
            count: 2,
        };

        assert!(store.load::<Record>("thing").unwrap().is_none());
        store.save("thing", &record).unwrap();
        assert!(store.exists("thing"));
        assert_eq!(store.load::<Record>("thing").unwrap(), Some(record));

        store.clear("thing").unwrap();
        assert!(!store.exists("thing"));
        store.clear("thing").unwrap();
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        store.save("thing", &Record { id: "a".into(), count: 1 }).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["thing.json".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn records_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        store.save("thing", &Record { id: "a".into(), count: 1 }).unwrap();

        let mode = fs::metadata(store.path("thing")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn corrupt_record_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        fs::write(store.path("thing"), "{not json").unwrap();

        let err = store.load::<Record>("thing").unwrap_err();
        assert!(matches!(err, OperatorError::Serialization(_)));
    }

    #[test]
    fn save_into_file_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let store = StateStore::new(&blocker);
        let err = store.save("thing", &Record { id: "a".into(), count: 1 }).unwrap_err();
        assert!(matches!(err, OperatorError::Storage { .. }));
    }
}
