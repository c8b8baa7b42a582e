//! Recency List Module
//!
//! Implements the LRU bookkeeping: a key index paired with a doubly-linked
//! recency list, giving O(1) lookup, promotion and eviction.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use crate::cache::CacheEntry;

/// Slot in the arena-backed doubly-linked list.
#[derive(Debug)]
struct Node<K, V> {
    entry: CacheEntry<K, V>,
    prev: Option<usize>,
    next: Option<usize>,
}

// == Recency List ==
/// Capacity-bounded map ordered by recency of use.
///
/// Nodes are stored in a `Vec` arena and linked by index:
/// - `head` = most recently used
/// - `tail` = least recently used (next eviction candidate)
///
/// Freed slots are recycled through `free`, so the arena never grows past
/// `capacity` slots. This type is not synchronized; see [`LruCache`] for the
/// thread-safe wrapper.
///
/// [`LruCache`]: crate::cache::LruCache
#[derive(Debug)]
pub struct RecencyList<K, V> {
    /// Key -> arena slot
    index: HashMap<K, usize>,
    /// Arena of list nodes, `None` for free slots
    slots: Vec<Option<Node<K, V>>>,
    /// Recycled slot indices
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    capacity: usize,
}

impl<K, V> RecencyList<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates an empty list holding at most `capacity` entries.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");

        Self {
            index: HashMap::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            capacity,
        }
    }

    // == Get ==
    /// Looks up a key and, on a hit, promotes it to most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.index.get(key)?;
        self.move_to_front(idx);
        self.slots[idx].as_ref().map(|node| &node.entry.value)
    }

    // == Put ==
    /// Inserts or updates an entry and marks it most recently used.
    ///
    /// Returns the entry evicted to make room, if any. Updating an existing
    /// key never evicts.
    pub fn put(&mut self, key: K, value: V) -> Option<CacheEntry<K, V>> {
        if let Some(&idx) = self.index.get(&key) {
            if let Some(node) = self.slots[idx].as_mut() {
                node.entry.replace_value(value);
            }
            self.move_to_front(idx);
            return None;
        }

        let evicted = if self.index.len() >= self.capacity {
            self.evict_lru()
        } else {
            None
        };

        let node = Node {
            entry: CacheEntry::new(key.clone(), value),
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        self.index.insert(key, idx);
        self.push_front(idx);
        evicted
    }

    // == Remove ==
    /// Removes a key, returning its value. No-op if the key is absent.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.index.remove(key)?;
        self.release(idx).map(|entry| entry.value)
    }

    // == Evict LRU ==
    /// Removes and returns the least recently used entry.
    pub fn evict_lru(&mut self) -> Option<CacheEntry<K, V>> {
        let idx = self.tail?;
        let entry = self.release(idx)?;
        self.index.remove(&entry.key);
        Some(entry)
    }

    // == Peek LRU ==
    /// Returns the least recently used key without touching it.
    pub fn peek_lru(&self) -> Option<&K> {
        self.tail
            .and_then(|idx| self.slots[idx].as_ref())
            .map(|node| &node.entry.key)
    }

    /// Checks membership without affecting recency.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        std::iter::successors(self.head, move |&idx| {
            self.slots[idx].as_ref().and_then(|node| node.next)
        })
        .filter_map(move |idx| self.slots[idx].as_ref())
        .map(|node| (&node.entry.key, &node.entry.value))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every entry; capacity is unchanged.
    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    // == Consistency Check ==
    /// Walks the list and verifies the index/list invariants:
    /// every linked node is indexed at its slot, back links match,
    /// the walk ends at `tail`, and sizes agree and respect capacity.
    pub fn is_consistent(&self) -> bool {
        let mut count = 0;
        let mut prev: Option<usize> = None;
        let mut cursor = self.head;

        while let Some(idx) = cursor {
            count += 1;
            if count > self.slots.len() {
                // cycle
                return false;
            }
            let Some(node) = self.slots.get(idx).and_then(|slot| slot.as_ref()) else {
                return false;
            };
            if node.prev != prev || self.index.get(&node.entry.key) != Some(&idx) {
                return false;
            }
            prev = Some(idx);
            cursor = node.next;
        }

        prev == self.tail && count == self.index.len() && count <= self.capacity
    }

    // == Internal Helpers ==

    /// Unlinks a slot and returns it to the free list.
    fn release(&mut self, idx: usize) -> Option<CacheEntry<K, V>> {
        self.unlink(idx);
        let node = self.slots[idx].take()?;
        self.free.push(idx);
        Some(node.entry)
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = None;
            node.next = old_head;
        }
        if let Some(head_idx) = old_head {
            if let Some(head) = self.slots[head_idx].as_mut() {
                head.prev = Some(idx);
            }
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.slots[idx].as_ref() {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = self.slots[prev_idx].as_mut() {
                    prev_node.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = self.slots[next_idx].as_mut() {
                    next_node.prev = prev;
                }
            }
            None => self.tail = prev,
        }

        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = None;
            node.next = None;
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &RecencyList<String, i32>) -> Vec<&str> {
        list.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn test_new_list_is_empty() {
        let list: RecencyList<String, i32> = RecencyList::new(3);
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.capacity(), 3);
        assert!(list.peek_lru().is_none());
        assert!(list.is_consistent());
    }

    #[test]
    #[should_panic(expected = "Capacity must be greater than 0")]
    fn test_zero_capacity_panics() {
        let _list: RecencyList<String, i32> = RecencyList::new(0);
    }

    #[test]
    fn test_put_orders_most_recent_first() {
        let mut list = RecencyList::new(3);
        list.put("a".to_string(), 1);
        list.put("b".to_string(), 2);
        list.put("c".to_string(), 3);

        assert_eq!(keys(&list), vec!["c", "b", "a"]);
        assert_eq!(list.peek_lru(), Some(&"a".to_string()));
        assert!(list.is_consistent());
    }

    #[test]
    fn test_get_promotes_entry() {
        let mut list = RecencyList::new(3);
        list.put("a".to_string(), 1);
        list.put("b".to_string(), 2);
        list.put("c".to_string(), 3);

        assert_eq!(list.get("a"), Some(&1));

        assert_eq!(keys(&list), vec!["a", "c", "b"]);
        assert!(list.is_consistent());
    }

    #[test]
    fn test_get_miss_leaves_order_untouched() {
        let mut list = RecencyList::new(2);
        list.put("a".to_string(), 1);
        list.put("b".to_string(), 2);

        assert_eq!(list.get("zzz"), None);

        assert_eq!(keys(&list), vec!["b", "a"]);
    }

    #[test]
    fn test_put_evicts_tail_when_full() {
        let mut list = RecencyList::new(2);
        list.put("a".to_string(), 1);
        list.put("b".to_string(), 2);

        let evicted = list.put("c".to_string(), 3);

        assert_eq!(evicted, Some(CacheEntry::new("a".to_string(), 1)));
        assert_eq!(list.len(), 2);
        assert!(!list.contains("a"));
        assert!(list.is_consistent());
    }

    #[test]
    fn test_update_in_place_does_not_evict() {
        let mut list = RecencyList::new(2);
        list.put("a".to_string(), 1);
        list.put("b".to_string(), 2);

        let evicted = list.put("a".to_string(), 10);

        assert!(evicted.is_none());
        assert_eq!(list.len(), 2);
        assert_eq!(keys(&list), vec!["a", "b"]);
        assert_eq!(list.get("a"), Some(&10));
    }

    #[test]
    fn test_remove_middle_entry() {
        let mut list = RecencyList::new(3);
        list.put("a".to_string(), 1);
        list.put("b".to_string(), 2);
        list.put("c".to_string(), 3);

        assert_eq!(list.remove("b"), Some(2));

        assert_eq!(keys(&list), vec!["c", "a"]);
        assert!(list.is_consistent());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut list = RecencyList::new(3);
        list.put("a".to_string(), 1);

        assert_eq!(list.remove("missing"), None);

        assert_eq!(list.len(), 1);
        assert!(list.is_consistent());
    }

    #[test]
    fn test_remove_only_entry_resets_ends() {
        let mut list = RecencyList::new(1);
        list.put("a".to_string(), 1);

        list.remove("a");

        assert!(list.is_empty());
        assert!(list.peek_lru().is_none());
        assert!(list.is_consistent());
    }

    #[test]
    fn test_slots_are_recycled() {
        let mut list = RecencyList::new(2);
        for i in 0..100 {
            list.put(format!("key{}", i), i);
        }

        assert_eq!(list.len(), 2);
        assert!(list.slots.len() <= 2);
        assert_eq!(keys(&list), vec!["key99", "key98"]);
        assert!(list.is_consistent());
    }

    #[test]
    fn test_order_after_multiple_touches() {
        let mut list = RecencyList::new(3);
        list.put("a".to_string(), 1);
        list.put("b".to_string(), 2);
        list.put("c".to_string(), 3);

        list.get("a");
        list.get("c");
        list.get("b");

        // front=[b, c, a]=back
        assert_eq!(list.evict_lru().map(|e| e.key), Some("a".to_string()));
        assert_eq!(list.evict_lru().map(|e| e.key), Some("c".to_string()));
        assert_eq!(list.evict_lru().map(|e| e.key), Some("b".to_string()));
        assert_eq!(list.evict_lru(), None);
    }

    #[test]
    fn test_clear() {
        let mut list = RecencyList::new(3);
        list.put("a".to_string(), 1);
        list.put("b".to_string(), 2);

        list.clear();

        assert!(list.is_empty());
        assert!(list.is_consistent());
        list.put("c".to_string(), 3);
        assert_eq!(keys(&list), vec!["c"]);
    }
}
