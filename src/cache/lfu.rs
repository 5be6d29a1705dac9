//! LFU Store Module
//!
//! Evicts the entry with the lowest access weight, using a binary min-heap
//! with per-entry heap positions so weights can be bumped in place.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::cache::{over_budget, replaced_usage, OnEvicted, SizePolicy, Store, Value};
use crate::error::{CacheError, Result};

/// Bytes charged per entry for the weight and heap index fields.
pub const ENTRY_OVERHEAD: i64 = 4 + 4;

// == Entry ==
#[derive(Debug)]
struct LfuEntry {
    key: String,
    value: Value,
    /// Accounted size including `ENTRY_OVERHEAD`
    size: i64,
    weight: u64,
    /// Current position in the heap
    index: usize,
}

// == Weight Queue ==
/// Min-heap of entry handles ordered by weight.
///
/// Entries live in a slab; the heap stores slab handles and every entry
/// records its own heap position. Sift rules follow the textbook array heap:
/// push sifts up, pop swaps the root with the last element and sifts down,
/// fix sifts down and falls back to sifting up. Ties are therefore resolved
/// the same way on every run.
#[derive(Debug, Default)]
struct WeightQueue {
    slots: Vec<Option<LfuEntry>>,
    free: Vec<usize>,
    heap: Vec<usize>,
}

impl WeightQueue {
    fn len(&self) -> usize {
        self.heap.len()
    }

    fn entry(&self, slot: usize) -> &LfuEntry {
        self.slots[slot].as_ref().expect("live heap handle")
    }

    fn entry_mut(&mut self, slot: usize) -> &mut LfuEntry {
        self.slots[slot].as_mut().expect("live heap handle")
    }

    // == Push ==
    /// Adds an entry and returns its slab handle.
    fn push(&mut self, mut entry: LfuEntry) -> usize {
        entry.index = self.heap.len();
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(entry);
                slot
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };
        self.heap.push(slot);
        self.up(self.heap.len() - 1);
        slot
    }

    // == Pop ==
    /// Removes the minimum-weight entry.
    fn pop(&mut self) -> Option<LfuEntry> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.swap(0, last);
        self.down(0, last);
        self.take_last()
    }

    // == Remove ==
    /// Removes the entry at heap position `i`.
    fn remove(&mut self, i: usize) -> LfuEntry {
        let last = self.heap.len() - 1;
        if i != last {
            self.swap(i, last);
            if !self.down(i, last) {
                self.up(i);
            }
        }
        self.take_last().expect("non-empty heap")
    }

    // == Fix ==
    /// Restores heap order after the entry at position `i` changed weight.
    fn fix(&mut self, i: usize) {
        if !self.down(i, self.heap.len()) {
            self.up(i);
        }
    }

    /// Key of the entry at heap position `i`.
    #[cfg(test)]
    fn peek_key(&self, i: usize) -> &str {
        &self.entry(self.heap[i]).key
    }

    fn take_last(&mut self) -> Option<LfuEntry> {
        let slot = self.heap.pop()?;
        self.free.push(slot);
        self.slots[slot].take()
    }

    fn less(&self, i: usize, j: usize) -> bool {
        self.entry(self.heap[i]).weight < self.entry(self.heap[j]).weight
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.heap.swap(i, j);
        let (a, b) = (self.heap[i], self.heap[j]);
        self.entry_mut(a).index = i;
        self.entry_mut(b).index = j;
    }

    fn up(&mut self, mut j: usize) {
        while j > 0 {
            let parent = (j - 1) / 2;
            if !self.less(j, parent) {
                break;
            }
            self.swap(parent, j);
            j = parent;
        }
    }

    /// Sifts down within the first `n` positions; returns whether it moved.
    fn down(&mut self, i0: usize, n: usize) -> bool {
        let mut i = i0;
        loop {
            let left = 2 * i + 1;
            if left >= n {
                break;
            }
            let mut child = left;
            let right = left + 1;
            if right < n && self.less(right, left) {
                child = right;
            }
            if !self.less(child, i) {
                break;
            }
            self.swap(i, child);
            i = child;
        }
        i > i0
    }
}

// == LFU Store ==
/// Frequency-ordered store.
///
/// New entries start at weight 0. Every hit and every overwrite adds 1.
/// The victim is always the current heap minimum.
pub struct LfuStore {
    max_bytes: i64,
    used_bytes: i64,
    size_policy: SizePolicy,
    on_evicted: Option<OnEvicted>,
    queue: WeightQueue,
    index: HashMap<String, usize>,
}

impl LfuStore {
    // == Constructor ==
    /// Creates an LFU store with the default 64-bit size accounting.
    pub fn new(max_bytes: i64, on_evicted: Option<OnEvicted>) -> Self {
        Self::with_size_policy(max_bytes, on_evicted, SizePolicy::default())
    }

    pub fn with_size_policy(
        max_bytes: i64,
        on_evicted: Option<OnEvicted>,
        size_policy: SizePolicy,
    ) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            size_policy,
            on_evicted,
            queue: WeightQueue::default(),
            index: HashMap::new(),
        }
    }

    /// Current access weight of `key`, without touching it.
    pub fn weight(&self, key: &str) -> Option<u64> {
        self.index
            .get(key)
            .map(|&slot| self.queue.entry(slot).weight)
    }

    fn entry_size(&self, key: &str, value: &Value) -> Result<i64> {
        self.size_policy
            .size_of(value)?
            .checked_add(ENTRY_OVERHEAD)
            .ok_or_else(|| CacheError::SizeOverflow(key.to_string()))
    }

    fn evicted(&mut self, entry: LfuEntry) {
        self.index.remove(&entry.key);
        self.used_bytes -= entry.size;
        if let Some(on_evicted) = self.on_evicted.as_mut() {
            on_evicted(&entry.key, &entry.value);
        }
    }
}

impl Store for LfuStore {
    fn set(&mut self, key: String, value: Value) -> Result<()> {
        let size = self.entry_size(&key, &value)?;

        if let Some(&slot) = self.index.get(&key) {
            let used = replaced_usage(self.used_bytes, self.queue.entry(slot).size, size, &key)?;
            self.used_bytes = used;
            let entry = self.queue.entry_mut(slot);
            entry.value = value;
            entry.size = size;
            entry.weight += 1;
            let pos = entry.index;
            self.queue.fix(pos);
        } else {
            let used = replaced_usage(self.used_bytes, 0, size, &key)?;
            let slot = self.queue.push(LfuEntry {
                key: key.clone(),
                value,
                size,
                weight: 0,
                index: 0,
            });
            self.index.insert(key, slot);
            self.used_bytes = used;
        }

        while over_budget(self.max_bytes, self.used_bytes) && self.queue.len() > 1 {
            if let Some(entry) = self.queue.pop() {
                debug!(
                    key = %entry.key,
                    kind = entry.value.kind(),
                    weight = entry.weight,
                    used_bytes = self.used_bytes,
                    max_bytes = self.max_bytes,
                    "evicting entry over budget"
                );
                self.evicted(entry);
            }
        }
        Ok(())
    }

    fn get(&mut self, key: &str) -> Option<Value> {
        let slot = *self.index.get(key)?;
        let entry = self.queue.entry_mut(slot);
        entry.weight += 1;
        let value = entry.value.clone();
        let pos = entry.index;
        self.queue.fix(pos);
        Some(value)
    }

    fn peek(&self, key: &str) -> Option<Value> {
        let slot = *self.index.get(key)?;
        Some(self.queue.entry(slot).value.clone())
    }

    fn delete(&mut self, key: &str) {
        if let Some(&slot) = self.index.get(key) {
            trace!(key, "deleting entry");
            let pos = self.queue.entry(slot).index;
            let entry = self.queue.remove(pos);
            self.evicted(entry);
        }
    }

    fn delete_oldest(&mut self) {
        if let Some(entry) = self.queue.pop() {
            self.evicted(entry);
        }
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn used_bytes(&self) -> i64 {
        self.used_bytes
    }

    fn max_bytes(&self) -> i64 {
        self.max_bytes
    }
}
