//! Shared definitions indexed by identifier.

use std::{collections::HashMap, hash::Hash, sync::Arc};

/// Immutable definitions in declaration order with lookup by identifier.
#[derive(Debug)]
pub struct Catalog<K, V> {
    entries: Vec<Arc<V>>,
    index: HashMap<K, usize>,
}

impl<K, V> Catalog<K, V>
where
    K: Eq + Hash,
{
    pub(crate) fn new(definitions: Vec<V>, key: impl Fn(&V) -> K) -> Self {
        let mut index = HashMap::with_capacity(definitions.len());
        let mut entries = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let _ = index.entry(key(&definition)).or_insert(entries.len());
            entries.push(Arc::new(definition));
        }
        Self { entries, index }
    }

    /// Definition registered under `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&Arc<V>> {
        self.index.get(key).and_then(|position| self.entries.get(*position))
    }

    /// Definitions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|entry| &**entry)
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no definitions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
