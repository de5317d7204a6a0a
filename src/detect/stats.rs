//! Per-field and per-(field, value) observation counters.
//!
//! The store only grows: there is no eviction, because dropping an entry
//! would make a value look never-seen again and change its score. Memory is
//! proportional to the number of distinct values observed, which for fields
//! such as sequence numbers is roughly the number of packets.

use std::collections::HashMap;

/// When a key was last observed and how many times in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeenStat {
    /// Ordinal of the most recent packet that carried the key.
    pub last_seen_index:  u64,
    pub total_seen_count: u64,
}

/// Statistics of a field name, whatever its value.
pub type FieldStat = SeenStat;

/// Statistics of one specific value of a field.
pub type ValueStat = SeenStat;

impl SeenStat {
    fn first(index: u64) -> Self {
        SeenStat { last_seen_index: index, total_seen_count: 1 }
    }

    fn bump(&mut self, index: u64) {
        self.last_seen_index = index;
        self.total_seen_count += 1;
    }
}

/// Returns `true` when `key` was not present yet.
fn bump_or_insert(map: &mut HashMap<String, SeenStat>, key: &str, index: u64) -> bool {
    match map.get_mut(key) {
        Some(stat) => {
            stat.bump(index);
            false
        }
        None => {
            map.insert(key.to_owned(), SeenStat::first(index));
            true
        }
    }
}

/// Recency and frequency tables for one packet stream.
///
/// Values are keyed by their string form under their field name, so equal
/// values of different fields never share an entry.
#[derive(Debug, Default)]
pub struct StatisticsStore {
    fields:          HashMap<String, FieldStat>,
    values:          HashMap<String, HashMap<String, ValueStat>>,
    distinct_values: usize,
}

impl StatisticsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one observation of `field` carrying `value` in packet `index`.
    ///
    /// Updates the field statistic and the value statistic together; this is
    /// the only way either table changes.
    pub fn observe(&mut self, field: &str, value: &str, index: u64) {
        bump_or_insert(&mut self.fields, field, index);

        let new_value = match self.values.get_mut(field) {
            Some(per_field) => bump_or_insert(per_field, value, index),
            None => {
                let mut per_field = HashMap::new();
                per_field.insert(value.to_owned(), SeenStat::first(index));
                self.values.insert(field.to_owned(), per_field);
                true
            }
        };
        if new_value {
            self.distinct_values += 1;
        }
    }

    pub fn lookup_field(&self, field: &str) -> Option<&FieldStat> {
        self.fields.get(field)
    }

    pub fn lookup_value(&self, field: &str, value: &str) -> Option<&ValueStat> {
        self.values.get(field)?.get(value)
    }

    /// Number of distinct field names seen.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Number of distinct (field, value) pairs seen.
    pub fn value_count(&self) -> usize {
        self.distinct_values
    }

    /// Inserts a value statistic without touching the field table. Only used
    /// to exercise the scorer's consistency check.
    #[cfg(test)]
    pub(crate) fn insert_orphan_value(&mut self, field: &str, value: &str, index: u64) {
        self.values
            .entry(field.to_owned())
            .or_default()
            .insert(value.to_owned(), SeenStat::first(index));
        self.distinct_values += 1;
    }
}
