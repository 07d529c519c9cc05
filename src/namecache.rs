//! Fixed-size chained hash table keyed on [`DomainName`] (§4.2).
//!
//! Used only by the host-facing consumer that assembles discovered-server
//! entries from answers the engine has already handed it via callback;
//! the engine core itself carries no dependence on this type.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::domain::DomainName;

/// Matches mdnsd's `LPRIME` bucket count.
const BUCKETS: usize = 1009;

pub struct NameCache<V> {
    buckets: Vec<Vec<(DomainName, V)>>,
}

impl<V> NameCache<V> {
    pub fn new() -> Self {
        let mut buckets = Vec::with_capacity(BUCKETS);
        for _ in 0..BUCKETS {
            buckets.push(Vec::new());
        }
        NameCache { buckets }
    }

    fn bucket_index(key: &DomainName) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % BUCKETS
    }

    /// Inserts without replacing: a duplicate key chains alongside any
    /// existing entries rather than overwriting them.
    pub fn insert(&mut self, key: DomainName, value: V) {
        let index = Self::bucket_index(&key);
        self.buckets[index].push((key, value));
    }

    pub fn get(&self, key: &DomainName) -> Option<&V> {
        let index = Self::bucket_index(key);
        self.buckets[index]
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn walk(&self, mut visitor: impl FnMut(&DomainName, &V)) {
        for bucket in &self.buckets {
            for (key, value) in bucket {
                visitor(key, value);
            }
        }
    }
}

impl<V> Default for NameCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
