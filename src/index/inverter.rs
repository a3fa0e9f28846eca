//! Append-only multimap from keys to item lists

use std::collections::HashMap;
use std::hash::Hash;

/// Hash-backed multimap: each key owns the items appended to it, in
/// insertion order.
///
/// There is no removal; an inverter is filled once and then read. Key
/// iteration order is whatever the hash table yields and must not be
/// relied on.
#[derive(Clone, Debug)]
pub struct Inverter<K, V> {
    lists: HashMap<K, Vec<V>>,
}

impl<K: Hash + Eq, V> Inverter<K, V> {
    pub fn new() -> Self {
        Self {
            lists: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lists: HashMap::with_capacity(capacity),
        }
    }

    /// Append one item, returning the new list length
    pub fn add(&mut self, key: K, item: V) -> usize {
        let list = self.lists.entry(key).or_default();
        list.push(item);
        list.len()
    }

    /// Append a batch of items, returning the new list length
    pub fn add_all<I>(&mut self, key: K, items: I) -> usize
    where
        I: IntoIterator<Item = V>,
    {
        let list = self.lists.entry(key).or_default();
        list.extend(items);
        list.len()
    }

    /// All keys, in unspecified order
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.lists.keys()
    }

    /// Items accumulated for a key, empty when the key is absent
    pub fn items(&self, key: &K) -> &[V] {
        self.lists.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Key/list pairs, in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[V])> {
        self.lists.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.lists.contains_key(key)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Total number of items across all keys
    pub fn item_count(&self) -> usize {
        self.lists.values().map(Vec::len).sum()
    }
}

impl<K: Hash + Eq, V> Default for Inverter<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V> IntoIterator for Inverter<K, V> {
    type Item = (K, Vec<V>);
    type IntoIter = std::collections::hash_map::IntoIter<K, Vec<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.lists.into_iter()
    }
}
