//! Materialized ordered Key→Value mapping.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

use crate::value::{Key, Value};

/// Insertion-ordered mapping with unique keys.
///
/// Inserting an existing key overwrites its value and keeps its position, so draining a
/// cursor with duplicate keys keeps the last value seen for each key.
#[derive(Debug, Clone, Default)]
pub struct Entries {
    items: Vec<(Key, Value)>,
    index: HashMap<Key, usize>,
    next_int: i64,
}

impl Entries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            next_int: 0,
        }
    }

    /// Build a list-like mapping with keys `0..n`.
    pub fn from_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut entries = Entries::new();
        for value in values {
            entries.push(value);
        }
        entries
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert or overwrite. Returns the previous value for `key`, if any.
    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        if let Some(&pos) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.items[pos].1, value));
        }
        if let Key::Int(i) = key {
            self.next_int = self.next_int.max(i.saturating_add(1));
        }
        self.index.insert(key.clone(), self.items.len());
        self.items.push((key, value));
        None
    }

    /// Append at the next free integer key.
    pub fn push(&mut self, value: impl Into<Value>) {
        let key = Key::Int(self.next_int);
        self.insert(key, value);
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.index.get(key).map(|&pos| &self.items[pos].1)
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (Key, Value)> {
        self.items.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.items.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.items.iter().map(|(_, v)| v)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.items.into_iter().map(|(_, v)| v).collect()
    }

    pub fn into_pairs(self) -> Vec<(Key, Value)> {
        self.items
    }

    /// Discard keys and renumber from 0.
    pub fn packed(self) -> Entries {
        Entries::from_values(self.into_values())
    }

    pub fn truncate(&mut self, len: usize) {
        if len < self.items.len() {
            self.items.truncate(len);
            self.rebuild_index();
        }
    }

    /// Reorder entries in place; keys travel with their values.
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&(Key, Value), &(Key, Value)) -> std::cmp::Ordering,
    {
        self.items.sort_by(|a, b| compare(a, b));
        self.rebuild_index();
    }

    pub fn reverse(&mut self) {
        self.items.reverse();
        self.rebuild_index();
    }

    pub(crate) fn rebuild_index(&mut self) {
        self.index.clear();
        self.next_int = 0;
        for (pos, (key, _)) in self.items.iter().enumerate() {
            self.index.insert(key.clone(), pos);
            if let Key::Int(i) = key {
                self.next_int = self.next_int.max(i.saturating_add(1));
            }
        }
    }
}

impl PartialEq for Entries {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<K: Into<Key>, V: Into<Value>> FromIterator<(K, V)> for Entries {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut entries = Entries::new();
        for (k, v) in iter {
            entries.insert(k, v);
        }
        entries
    }
}

impl IntoIterator for Entries {
    type Item = (Key, Value);
    type IntoIter = std::vec::IntoIter<(Key, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Entries {
    type Item = &'a (Key, Value);
    type IntoIter = std::slice::Iter<'a, (Key, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Serialize for Entries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.items.len()))?;
        for (k, v) in &self.items {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct EntriesVisitor;

impl<'de> Visitor<'de> for EntriesVisitor {
    type Value = Entries;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Entries, A::Error> {
        let mut entries = Entries::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((k, v)) = access.next_entry::<String, Value>()? {
            entries.insert(Key::from(k), v);
        }
        Ok(entries)
    }
}

impl<'de> Deserialize<'de> for Entries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(EntriesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_keys_overwrite_in_place() {
        let mut entries = Entries::new();
        entries.insert("a", 1);
        entries.insert("b", 2);
        assert_eq!(entries.insert("a", 3), Some(Value::Int(1)));
        let pairs = entries.into_pairs();
        assert_eq!(
            pairs,
            vec![(Key::from("a"), Value::Int(3)), (Key::from("b"), Value::Int(2))]
        );
    }

    #[test]
    fn push_uses_next_integer_key() {
        let mut entries = Entries::new();
        entries.insert(5, "x");
        entries.insert("name", "y");
        entries.push("z");
        assert_eq!(entries.get(&Key::Int(6)), Some(&Value::from("z")));
    }

    #[test]
    fn truncate_drops_index_entries() {
        let mut entries = Entries::from_values(vec![1, 2, 3]);
        entries.truncate(1);
        assert_eq!(entries.len(), 1);
        assert!(!entries.contains_key(&Key::Int(2)));
    }
}
