//! Daily "did I take my medicine" log
mod screen;
pub(crate) use self::screen::MedicineApp;
use crate::calendar::DateMarks;
use crate::datekey::DateKey;
use crate::records::DateRecords;
use crate::storage::{load_json, save_json, KeyValueStore, Loaded, StorageError, MEDICINE_KEY};
use serde_json::Value;
use std::collections::BTreeMap;

/// The days on which the medicine was taken.  Stored as a JSON object mapping
/// each such day to `true`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct MedicineLog {
    records: DateRecords<bool>,
    /// Set when the store could not be read, in which case saving would
    /// replace records that were never seen
    unread: bool,
}

impl MedicineLog {
    /// Reads the log from `store`.  Missing or malformed data yields an empty
    /// log, and individual entries that are not `"YYYY-MM-DD": true` are
    /// skipped.  If the store fails to read, the log is empty and refuses to
    /// be saved.
    pub(crate) fn load<K: KeyValueStore + ?Sized>(store: &K) -> MedicineLog {
        let raw = match load_json::<BTreeMap<String, Value>, _>(store, MEDICINE_KEY) {
            Loaded::Present(raw) => raw,
            Loaded::Absent | Loaded::Malformed => BTreeMap::new(),
            Loaded::Unavailable => {
                return MedicineLog {
                    records: DateRecords::new(),
                    unread: true,
                };
            }
        };
        let mut records = DateRecords::new();
        for (k, v) in raw {
            match k.parse::<DateKey>() {
                Ok(key) if v == Value::Bool(true) => {
                    records.set(key, true);
                }
                Ok(_) => log::debug!("skipping {k:?}, which is not marked as taken"),
                Err(e) => log::warn!("skipping medicine record: {e}"),
            }
        }
        MedicineLog {
            records,
            unread: false,
        }
    }

    pub(crate) fn save<K: KeyValueStore + ?Sized>(
        &self,
        store: &mut K,
    ) -> Result<(), StorageError> {
        if self.unread {
            return Err(StorageError::Unread {
                key: MEDICINE_KEY.to_owned(),
            });
        }
        save_json(store, MEDICINE_KEY, &self.records)
    }

    /// Whether the stored log could not be read and so will not be saved over
    pub(crate) fn is_unread(&self) -> bool {
        self.unread
    }

    /// Forgets everything recorded before `cutoff`, returning how many days
    /// were forgotten
    pub(crate) fn purge_older_than(&mut self, cutoff: DateKey) -> usize {
        self.records.purge_older_than(cutoff)
    }

    pub(crate) fn is_taken(&self, day: DateKey) -> bool {
        self.records.is_present(day)
    }

    /// Records `day` as taken.  Returns `false` if it already was.
    pub(crate) fn take(&mut self, day: DateKey) -> bool {
        self.records.set(day, true).is_none()
    }

    /// Flips the record for `day`, returning whether it is now taken
    pub(crate) fn toggle(&mut self, day: DateKey) -> bool {
        self.records.toggle(day, true)
    }

    /// Recorded days, most recent first
    pub(crate) fn history(&self) -> impl Iterator<Item = DateKey> + '_ {
        self.records.newest_first().map(|(k, _)| k)
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl DateMarks for MedicineLog {
    fn has_record(&self, day: DateKey) -> bool {
        self.is_taken(day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_load_absent() {
        let store = MemoryStore::new();
        assert_eq!(MedicineLog::load(&store), MedicineLog::default());
    }

    #[test]
    fn test_load_malformed() {
        let mut store = MemoryStore::new();
        store.set(MEDICINE_KEY, "[1, 2").unwrap();
        assert_eq!(MedicineLog::load(&store).len(), 0);
        store.set(MEDICINE_KEY, "\"oops\"").unwrap();
        assert_eq!(MedicineLog::load(&store).len(), 0);
    }

    #[test]
    fn test_load_skips_bad_entries() {
        let mut store = MemoryStore::new();
        store
            .set(
                MEDICINE_KEY,
                r#"{"2026-01-29": true, "2026-01-30": false, "yesterday": true, "2026-02-01": 1}"#,
            )
            .unwrap();
        let log = MedicineLog::load(&store);
        assert_eq!(log.history().collect::<Vec<_>>(), vec![key("2026-01-29")]);
    }

    #[test]
    fn test_read_failure_blocks_save() {
        let mut store = MemoryStore::new();
        store.set(MEDICINE_KEY, r#"{"2026-01-29":true}"#).unwrap();
        let mut store = store.with_failing_reads();
        let mut log = MedicineLog::load(&store);
        assert!(log.is_unread());
        assert!(log.is_empty());
        log.take(key("2026-01-30"));
        assert!(matches!(
            log.save(&mut store),
            Err(StorageError::Unread { .. })
        ));
        assert_eq!(store.raw(MEDICINE_KEY), Some(r#"{"2026-01-29":true}"#));
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let mut log = MedicineLog::default();
        assert!(log.take(key("2026-01-29")));
        assert!(!log.take(key("2026-01-29")));
        assert!(log.toggle(key("2026-01-27")));
        log.save(&mut store).unwrap();
        assert_eq!(
            store.get(MEDICINE_KEY).unwrap().as_deref(),
            Some(r#"{"2026-01-27":true,"2026-01-29":true}"#)
        );
        assert_eq!(MedicineLog::load(&store), log);
    }

    #[test]
    fn test_toggle_twice() {
        let mut log = MedicineLog::default();
        log.take(key("2026-03-03"));
        let before = log.clone();
        assert!(!log.toggle(key("2026-03-03")));
        assert!(log.toggle(key("2026-03-03")));
        assert_eq!(log, before);
    }

    #[test]
    fn test_history_newest_first() {
        let mut log = MedicineLog::default();
        for d in ["2026-01-02", "2026-01-10", "2025-12-31"] {
            log.take(key(d));
        }
        assert_eq!(
            log.history().map(|k| k.to_string()).collect::<Vec<_>>(),
            ["2026-01-10", "2026-01-02", "2025-12-31"]
        );
    }
}
