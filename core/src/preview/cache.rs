use std::{collections::HashMap, sync::Arc};

/// Identifies one acquisition of a cache entry. Releasing it decrements the
/// reference count of exactly the entry generation it was acquired from.
#[derive(Debug, PartialEq, Eq, Hash)]
#[must_use = "a handle that is never released keeps its entry alive"]
pub struct CacheHandle {
    key: String,
    generation: u64,
}

impl CacheHandle {
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: Arc<V>,
    generation: u64,
    refs: usize,
}

/// Loaded models keyed by blob URL.
///
/// Values are handed out with explicit reference counts. A value is returned
/// for disposal exactly once: when it has been evicted or replaced and its
/// last handle is released, or right away if no handle was outstanding.
#[derive(Debug)]
pub struct ModelCache<V> {
    live: HashMap<String, Entry<V>>,
    /// Evicted or replaced entries that still have handles
    retired: Vec<(String, Entry<V>)>,
    next_generation: u64,
}

impl<V> Default for ModelCache<V> {
    fn default() -> Self {
        ModelCache {
            live: HashMap::new(),
            retired: Vec::new(),
            next_generation: 0,
        }
    }
}

impl<V> ModelCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        self.live.get(key).map(|entry| entry.value.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.live.contains_key(key)
    }

    /// Stores `value` under `key`. Returns the value it replaced if that one
    /// can be disposed now.
    pub fn put(&mut self, key: &str, value: V) -> Option<Arc<V>> {
        let generation = self.next_generation;
        self.next_generation += 1;
        let previous = self.live.insert(
            key.to_owned(),
            Entry {
                value: Arc::new(value),
                generation,
                refs: 0,
            },
        );
        previous.and_then(|entry| self.retire(key, entry))
    }

    /// Like [`ModelCache::get`], but counts a reference until the handle is
    /// passed to [`ModelCache::release`].
    pub fn acquire(&mut self, key: &str) -> Option<(CacheHandle, Arc<V>)> {
        let entry = self.live.get_mut(key)?;
        entry.refs += 1;
        Some((
            CacheHandle {
                key: key.to_owned(),
                generation: entry.generation,
            },
            entry.value.clone(),
        ))
    }

    /// Returns the value if this was the last reference to an evicted or
    /// replaced entry.
    pub fn release(&mut self, handle: CacheHandle) -> Option<Arc<V>> {
        if let Some(entry) = self.live.get_mut(&handle.key) {
            if entry.generation == handle.generation {
                entry.refs = entry.refs.saturating_sub(1);
                return None;
            }
        }
        let idx = self.retired.iter().position(|(key, entry)| {
            *key == handle.key && entry.generation == handle.generation
        })?;
        let entry = &mut self.retired[idx].1;
        entry.refs = entry.refs.saturating_sub(1);
        if entry.refs > 0 {
            return None;
        }
        let (_, entry) = self.retired.swap_remove(idx);
        Some(entry.value)
    }

    /// Removes `key` from the cache. Returns the value if no handle to it is
    /// outstanding, otherwise it is returned by the last `release`.
    pub fn evict(&mut self, key: &str) -> Option<Arc<V>> {
        let entry = self.live.remove(key)?;
        self.retire(key, entry)
    }

    /// Number of entries waiting for handles to be released
    pub fn pending_disposal(&self) -> usize {
        self.retired.len()
    }

    fn retire(&mut self, key: &str, entry: Entry<V>) -> Option<Arc<V>> {
        match entry.refs {
            0 => Some(entry.value),
            _ => {
                self.retired.push((key.to_owned(), entry));
                None
            }
        }
    }
}
