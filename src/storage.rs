use serde::{de::DeserializeOwned, Serialize};
#[cfg(test)]
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub(crate) const MEDICINE_KEY: &str = "medicine_records";
pub(crate) const APPS_KEY: &str = "web-app-manager-data";
pub(crate) const THEME_KEY: &str = "theme";

/// Largest value, in bytes, that a store accepts for a single key.  This
/// mirrors the per-origin limit of browser storage.
pub(crate) const DEFAULT_QUOTA: usize = 5 * 1024 * 1024;

/// String key-value storage that state is loaded from and written through to
pub(crate) trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Error)]
pub(crate) enum StorageError {
    #[error("failed to read {key:?} from {}", .path.display())]
    Read {
        key: String,
        path: PathBuf,
        source: io::Error,
    },
    #[error("failed to write {key:?} to {}", .path.display())]
    Write {
        key: String,
        path: PathBuf,
        source: io::Error,
    },
    #[error("value for {key:?} is {size} bytes, over the {quota}-byte quota")]
    QuotaExceeded {
        key: String,
        size: usize,
        quota: usize,
    },
    #[error("not overwriting {key:?}, which could not be read")]
    Unread { key: String },
    #[error("failed to serialize {key:?}")]
    Serialize {
        key: String,
        source: serde_json::Error,
    },
}

fn check_quota(key: &str, value: &str, quota: usize) -> Result<(), StorageError> {
    if value.len() > quota {
        Err(StorageError::QuotaExceeded {
            key: key.to_owned(),
            size: value.len(),
            quota,
        })
    } else {
        Ok(())
    }
}

/// Stores each key in its own file inside a directory
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct FileStore {
    dir: PathBuf,
    quota: usize,
}

impl FileStore {
    pub(crate) fn new<P: Into<PathBuf>>(dir: P) -> FileStore {
        FileStore {
            dir: dir.into(),
            quota: DEFAULT_QUOTA,
        }
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                key: key.to_owned(),
                path,
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        check_quota(key, value, self.quota)?;
        let path = self.path_for(key);
        // Write to a sibling first so that a failed write never leaves a
        // truncated value behind
        let tmp = self.dir.join(format!("{key}.tmp"));
        fs::create_dir_all(&self.dir)
            .and_then(|()| fs::write(&tmp, value))
            .and_then(|()| fs::rename(&tmp, &path))
            .map_err(|source| StorageError::Write {
                key: key.to_owned(),
                path,
                source,
            })
    }
}

/// Keeps everything in memory; nothing survives the process
#[cfg(test)]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct MemoryStore {
    values: HashMap<String, String>,
    quota: Option<usize>,
    failing_reads: bool,
}

#[cfg(test)]
impl MemoryStore {
    pub(crate) fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub(crate) fn with_quota(mut self, quota: usize) -> MemoryStore {
        self.quota = Some(quota);
        self
    }

    /// The stored value for `key`, bypassing any simulated read failure
    pub(crate) fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Makes every `get` fail as if the backing storage were inaccessible
    pub(crate) fn with_failing_reads(mut self) -> MemoryStore {
        self.failing_reads = true;
        self
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.failing_reads {
            return Err(StorageError::Read {
                key: key.to_owned(),
                path: PathBuf::from(key),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read refused"),
            });
        }
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        check_quota(key, value, self.quota.unwrap_or(DEFAULT_QUOTA))?;
        self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// The outcome of reading a JSON value from a store
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Loaded<T> {
    /// Nothing has been stored under the key yet
    Absent,
    /// The stored value is not the expected JSON; the cause has already been
    /// logged
    Malformed,
    /// The store failed to read the key, so whatever it holds is unknown; the
    /// cause has already been logged
    Unavailable,
    Present(T),
}

pub(crate) fn load_json<T, K>(store: &K, key: &str) -> Loaded<T>
where
    T: DeserializeOwned,
    K: KeyValueStore + ?Sized,
{
    match store.get(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => Loaded::Present(value),
            Err(e) => {
                log::warn!("ignoring malformed {key:?} data: {e}");
                Loaded::Malformed
            }
        },
        Ok(None) => Loaded::Absent,
        Err(e) => {
            log::warn!("treating {key:?} as empty: {e}");
            Loaded::Unavailable
        }
    }
}

pub(crate) fn save_json<T, K>(store: &mut K, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
    K: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        key: key.to_owned(),
        source,
    })?;
    store.set(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_file_store_round_trip() {
        let tmpdir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(tmpdir.path().join("data"));
        assert_eq!(store.get(MEDICINE_KEY).unwrap(), None);
        store.set(MEDICINE_KEY, r#"{"2026-01-29":true}"#).unwrap();
        assert_eq!(
            store.get(MEDICINE_KEY).unwrap().as_deref(),
            Some(r#"{"2026-01-29":true}"#)
        );
        store.set(MEDICINE_KEY, "{}").unwrap();
        assert_eq!(store.get(MEDICINE_KEY).unwrap().as_deref(), Some("{}"));
        assert!(!store.dir().join("medicine_records.tmp").exists());
    }

    #[test]
    fn test_file_store_quota() {
        let tmpdir = tempfile::tempdir().unwrap();
        let mut store = FileStore {
            quota: 4,
            ..FileStore::new(tmpdir.path())
        };
        store.set(THEME_KEY, "dark").unwrap();
        let r = store.set(THEME_KEY, "light");
        assert!(matches!(
            r,
            Err(StorageError::QuotaExceeded {
                size: 5,
                quota: 4,
                ..
            })
        ));
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_file_store_unwritable_dir() {
        let tmpdir = tempfile::tempdir().unwrap();
        let blocker = tmpdir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let mut store = FileStore::new(blocker.join("data"));
        let r = store.set(THEME_KEY, "dark");
        assert!(matches!(r, Err(StorageError::Write { .. })));
    }

    #[test]
    fn test_load_json_absent_and_malformed() {
        let mut store = MemoryStore::new();
        assert_eq!(
            load_json::<BTreeMap<String, bool>, _>(&store, MEDICINE_KEY),
            Loaded::Absent
        );
        store.set(MEDICINE_KEY, "{not json").unwrap();
        assert_eq!(
            load_json::<BTreeMap<String, bool>, _>(&store, MEDICINE_KEY),
            Loaded::Malformed
        );
        store.set(MEDICINE_KEY, r#"{"a":true}"#).unwrap();
        assert_eq!(
            load_json::<BTreeMap<String, bool>, _>(&store, MEDICINE_KEY),
            Loaded::Present(BTreeMap::from([("a".to_owned(), true)]))
        );
    }

    #[test]
    fn test_load_json_read_failure() {
        let mut store = MemoryStore::new().with_failing_reads();
        store.set(MEDICINE_KEY, "{}").unwrap();
        assert_eq!(
            load_json::<BTreeMap<String, bool>, _>(&store, MEDICINE_KEY),
            Loaded::Unavailable
        );
    }

    #[test]
    fn test_save_json_respects_quota() {
        let mut store = MemoryStore::new().with_quota(8);
        save_json(&mut store, APPS_KEY, &["x"]).unwrap();
        assert_eq!(store.get(APPS_KEY).unwrap().as_deref(), Some(r#"["x"]"#));
        let r = save_json(&mut store, APPS_KEY, &["a long value"]);
        assert!(matches!(r, Err(StorageError::QuotaExceeded { .. })));
        assert_eq!(store.get(APPS_KEY).unwrap().as_deref(), Some(r#"["x"]"#));
    }
}
