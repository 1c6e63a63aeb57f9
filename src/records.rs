use crate::calendar::DateMarks;
use crate::datekey::DateKey;
use serde::Serialize;
use std::collections::BTreeMap;

/// An ordered mapping from calendar days to record values.
///
/// Nothing here touches storage: every mutation is expected to be followed by
/// an explicit save at the call site.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub(crate) struct DateRecords<V>(BTreeMap<DateKey, V>);

impl<V> DateRecords<V> {
    pub(crate) fn new() -> Self {
        DateRecords(BTreeMap::new())
    }

    pub(crate) fn set(&mut self, key: DateKey, value: V) -> Option<V> {
        self.0.insert(key, value)
    }

    pub(crate) fn unset(&mut self, key: DateKey) -> Option<V> {
        self.0.remove(&key)
    }

    /// Removes the record for `key` if there is one, otherwise stores
    /// `value` there.  Returns whether a record is present afterwards.
    pub(crate) fn toggle(&mut self, key: DateKey, value: V) -> bool {
        if self.unset(key).is_some() {
            false
        } else {
            self.set(key, value);
            true
        }
    }

    pub(crate) fn is_present(&self, key: DateKey) -> bool {
        self.0.contains_key(&key)
    }

    /// Drops every record dated strictly before `cutoff` and returns how many
    /// were dropped
    pub(crate) fn purge_older_than(&mut self, cutoff: DateKey) -> usize {
        let before = self.0.len();
        self.0 = self.0.split_off(&cutoff);
        before - self.0.len()
    }

    pub(crate) fn newest_first(&self) -> impl Iterator<Item = (DateKey, &V)> + '_ {
        self.0.iter().rev().map(|(&k, v)| (k, v))
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V> Default for DateRecords<V> {
    fn default() -> Self {
        DateRecords::new()
    }
}

impl<V> FromIterator<(DateKey, V)> for DateRecords<V> {
    fn from_iter<I: IntoIterator<Item = (DateKey, V)>>(iter: I) -> Self {
        DateRecords(iter.into_iter().collect())
    }
}

impl<V> DateMarks for DateRecords<V> {
    fn has_record(&self, day: DateKey) -> bool {
        self.is_present(day)
    }
}
