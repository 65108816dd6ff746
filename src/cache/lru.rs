//! LRU Store Module
//!
//! Fixed-capacity key/value container with O(1) recency tracking and
//! least-recently-used eviction.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use generational_arena::{Arena, Index};
use tracing::trace;

use crate::error::{CacheError, Result};

// Large capacities grow on demand instead of reserving everything upfront.
const PREALLOCATE_LIMIT: usize = 1024;

/// Callback invoked with the key and value of a capacity eviction.
pub type EvictionCallback<K, V> = Box<dyn FnMut(K, V) + Send + Sync>;

// == Bounded Store ==
/// Capability interface of a bounded, recency-ordered store.
///
/// The expiring cache only talks to its storage through this trait, so the
/// backing structure can be swapped without touching the layers above it.
pub trait BoundedStore<K, V> {
    /// Inserts or updates `key` and makes it the most recently used.
    ///
    /// When the store grows past its capacity the least recently used entry
    /// is evicted and handed to the eviction callback before this returns.
    /// Returns true if an entry was evicted.
    fn add(&mut self, key: K, value: V) -> bool;

    /// Looks up `key` and promotes it to most recently used.
    fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized;

    /// Looks up `key` without touching the recency order.
    fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized;

    /// Removes `key`. Never fires the eviction callback.
    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized;

    /// Drops every entry. Like `remove`, never fires the eviction callback.
    fn clear(&mut self);

    /// Number of stored entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    fn capacity(&self) -> usize;

    /// Visits every entry from most to least recently used.
    fn for_each<F>(&self, visit: F)
    where
        F: FnMut(&K, &V);

    /// Sets the callback fired on capacity evictions.
    fn set_eviction_callback(&mut self, callback: EvictionCallback<K, V>);
}

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<Index>,
    next: Option<Index>,
}

// == LRU Store ==
/// Default [`BoundedStore`]: an arena-backed doubly-linked list plus a
/// key→node map.
///
/// - `head` = most recently used
/// - `tail` = least recently used
pub struct LruStore<K, V> {
    nodes: Arena<Node<K, V>>,
    lookup: HashMap<K, Index>,
    head: Option<Index>,
    tail: Option<Index>,
    capacity: usize,
    on_evicted: Option<EvictionCallback<K, V>>,
}

impl<K, V> LruStore<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates an empty store holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidParameters(
                "capacity must be greater than 0".to_string(),
            ));
        }
        let initial = capacity.min(PREALLOCATE_LIMIT);
        Ok(Self {
            nodes: Arena::with_capacity(initial),
            lookup: HashMap::with_capacity(initial),
            head: None,
            tail: None,
            capacity,
            on_evicted: None,
        })
    }

    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            cursor: self.head,
        }
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<K> {
        self.iter().map(|(key, _)| key.clone()).collect()
    }

    #[cfg(test)]
    fn peek_oldest(&self) -> Option<&K> {
        self.tail.map(|index| &self.nodes[index].key)
    }

    // Detaches a node from the list; arena and map are left alone.
    fn unlink(&mut self, index: Index) {
        let (prev, next) = {
            let node = &self.nodes[index];
            (node.prev, node.next)
        };

        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = prev,
        }
    }

    fn push_front(&mut self, index: Index) {
        let old_head = self.head;
        {
            let node = &mut self.nodes[index];
            node.prev = None;
            node.next = old_head;
        }
        if let Some(old_head) = old_head {
            self.nodes[old_head].prev = Some(index);
        }
        self.head = Some(index);
        if self.tail.is_none() {
            self.tail = Some(index);
        }
    }

    fn promote(&mut self, index: Index) {
        if self.head != Some(index) {
            self.unlink(index);
            self.push_front(index);
        }
    }

    fn evict_oldest(&mut self) -> bool {
        let Some(tail) = self.tail else {
            return false;
        };
        self.unlink(tail);
        let Some(node) = self.nodes.remove(tail) else {
            return false;
        };
        self.lookup.remove(&node.key);
        trace!("LRU store evicted oldest entry");

        if let Some(callback) = self.on_evicted.as_mut() {
            callback(node.key, node.value);
        }
        true
    }
}

impl<K, V> BoundedStore<K, V> for LruStore<K, V>
where
    K: Hash + Eq + Clone,
{
    fn add(&mut self, key: K, value: V) -> bool {
        if let Some(&index) = self.lookup.get(&key) {
            self.nodes[index].value = value;
            self.promote(index);
            return false;
        }

        let index = self.nodes.insert(Node {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        });
        self.lookup.insert(key, index);
        self.push_front(index);

        if self.lookup.len() > self.capacity {
            return self.evict_oldest();
        }
        false
    }

    fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = *self.lookup.get(key)?;
        self.promote(index);
        Some(&self.nodes[index].value)
    }

    fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = *self.lookup.get(key)?;
        Some(&self.nodes[index].value)
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.lookup.remove(key)?;
        self.unlink(index);
        self.nodes.remove(index).map(|node| node.value)
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.lookup.clear();
        self.head = None;
        self.tail = None;
    }

    fn len(&self) -> usize {
        self.lookup.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&K, &V),
    {
        for (key, value) in self.iter() {
            visit(key, value);
        }
    }

    fn set_eviction_callback(&mut self, callback: EvictionCallback<K, V>) {
        self.on_evicted = Some(callback);
    }
}

impl<K, V> fmt::Debug for LruStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruStore")
            .field("len", &self.lookup.len())
            .field("capacity", &self.capacity)
            .field("has_eviction_callback", &self.on_evicted.is_some())
            .finish()
    }
}

/// Iterator over an [`LruStore`], most recently used first.
pub struct Iter<'a, K, V> {
    nodes: &'a Arena<Node<K, V>>,
    cursor: Option<Index>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.nodes.get(self.cursor?)?;
        self.cursor = node.next;
        Some((&node.key, &node.value))
    }
}
