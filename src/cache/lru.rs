//! LRU Tracker Module
//!
//! Implements Least Recently Used ordering for byte-budget eviction.

use lru::LruCache;

// == LRU Tracker ==
/// Tracks access order for the LRU eviction strategy.
///
/// Backed by an unbounded linked hash map, so `touch`, `remove` and
/// `evict_oldest` are O(1). A new key always enters at the most recently
/// used end; among keys never touched since insertion the earliest inserted
/// is therefore evicted first.
#[derive(Debug)]
pub struct LruTracker {
    order: LruCache<String, ()>,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self {
            order: LruCache::unbounded(),
        }
    }

    // == Touch ==
    /// Marks a key as most recently used, inserting it if unknown.
    pub fn touch(&mut self, key: &str) {
        if self.order.contains(key) {
            self.order.promote(key);
        } else {
            self.order.push(key.to_string(), ());
        }
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) -> bool {
        self.order.pop(key).is_some()
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        self.order.pop_lru().map(|(key, _)| key)
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.peek_lru().map(|(key, _)| key)
    }

    /// Keys from least to most recently used.
    pub fn oldest_first(&self) -> impl Iterator<Item = &String> {
        self.order.iter().rev().map(|(key, _)| key)
    }

    /// Keys from most to least recently used.
    pub fn newest_first(&self) -> impl Iterator<Item = &String> {
        self.order.iter().map(|(key, _)| key)
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.order.contains(key)
    }
}

impl Default for LruTracker {
    fn default() -> Self {
        Self::new()
    }
}
