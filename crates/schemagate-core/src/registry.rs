use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{Error, Result};

/// Ordered, write-once map whose keys compare case-insensitively.
///
/// Iteration follows insertion order and yields keys in the case they were
/// first set with. Entries cannot be replaced or removed.
#[derive(Debug, Clone)]
pub struct Registry<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> Default for Registry<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

fn fold(key: &str) -> String {
    key.to_lowercase()
}

impl<V> Registry<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key`, failing if the folded key is already present.
    pub fn set(&mut self, key: impl Into<String>, value: V) -> Result<()> {
        let key = key.into();
        let folded = fold(&key);
        if self.index.contains_key(&folded) {
            return Err(Error::DuplicateKey(key));
        }
        self.index.insert(folded, self.entries.len());
        self.entries.push((key, value));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.position(key).map(|idx| &self.entries[idx].1)
    }

    /// Look up an entry, returning the key in its stored case alongside the value.
    pub fn get_key_value(&self, key: &str) -> Option<(&str, &V)> {
        self.position(key).map(|idx| {
            let (k, v) = &self.entries[idx];
            (k.as_str(), v)
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(&fold(key))
    }

    /// Insertion index of `key`.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.index.get(&fold(key)).copied()
    }

    /// Keys in insertion order, original case.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Serialize> Serialize for Registry<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
