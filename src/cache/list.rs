//! Ordered List Module
//!
//! Slab-backed doubly linked list shared by the FIFO and LRU stores.
//!
//! Nodes live in a `Vec` and link to each other by index, so there are no
//! raw pointers and no reference cycles. Freed slots are recycled.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::cache::{over_budget, replaced_usage, OnEvicted, SizePolicy, Value};
use crate::error::Result;

const NIL: usize = usize::MAX;

// == Node ==
#[derive(Debug)]
pub(crate) struct Node {
    pub key: String,
    pub value: Value,
    /// Accounted size, cached when the value was written
    pub size: i64,
    prev: usize,
    next: usize,
}

// == Order List ==
/// Doubly linked sequence of entries.
///
/// - Front = oldest (next eviction victim)
/// - Back = newest
#[derive(Debug)]
pub(crate) struct OrderList {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
    len: usize,
}

impl OrderList {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Handle of the oldest node.
    pub fn front(&self) -> Option<usize> {
        (self.head != NIL).then_some(self.head)
    }

    pub fn node(&self, idx: usize) -> &Node {
        self.slots[idx].as_ref().expect("live list handle")
    }

    pub fn node_mut(&mut self, idx: usize) -> &mut Node {
        self.slots[idx].as_mut().expect("live list handle")
    }

    // == Push Back ==
    /// Appends a node at the newest end and returns its handle.
    pub fn push_back(&mut self, key: String, value: Value, size: i64) -> usize {
        let node = Node {
            key,
            value,
            size,
            prev: NIL,
            next: NIL,
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
        self.link_back(idx);
        self.len += 1;
        idx
    }

    // == Move To Back ==
    /// Marks a node as newest.
    pub fn move_to_back(&mut self, idx: usize) {
        if self.tail == idx {
            return;
        }
        self.unlink(idx);
        self.link_back(idx);
    }

    // == Remove ==
    /// Detaches a node and frees its slot.
    pub fn remove(&mut self, idx: usize) -> Node {
        self.unlink(idx);
        self.len -= 1;
        self.free.push(idx);
        self.slots[idx].take().expect("live list handle")
    }

    /// Keys from oldest to newest.
    #[cfg(test)]
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.len);
        let mut cur = self.head;
        while cur != NIL {
            let node = self.node(cur);
            keys.push(node.key.clone());
            cur = node.next;
        }
        keys
    }

    fn link_back(&mut self, idx: usize) {
        let old_tail = self.tail;
        {
            let node = self.node_mut(idx);
            node.prev = old_tail;
            node.next = NIL;
        }
        if old_tail == NIL {
            self.head = idx;
        } else {
            self.node_mut(old_tail).next = idx;
        }
        self.tail = idx;
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.node(idx);
            (node.prev, node.next)
        };
        if prev == NIL {
            self.head = next;
        } else {
            self.node_mut(prev).next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.node_mut(next).prev = prev;
        }
        let node = self.node_mut(idx);
        node.prev = NIL;
        node.next = NIL;
    }
}

// == List Store ==
/// Key index plus ordered list, with byte budget enforcement.
///
/// Both list-ordered policies delegate here; they differ only in whether a
/// read touches the entry.
pub(crate) struct ListStore {
    max_bytes: i64,
    used_bytes: i64,
    size_policy: SizePolicy,
    on_evicted: Option<OnEvicted>,
    order: OrderList,
    index: HashMap<String, usize>,
}

impl ListStore {
    pub fn new(max_bytes: i64, on_evicted: Option<OnEvicted>, size_policy: SizePolicy) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            size_policy,
            on_evicted,
            order: OrderList::new(),
            index: HashMap::new(),
        }
    }

    // == Set ==
    /// Inserts or updates an entry. Updates move the entry to the newest end.
    ///
    /// Nothing is modified when the value cannot be sized or its size would
    /// overflow the byte accounting.
    pub fn set(&mut self, key: String, value: Value) -> Result<()> {
        let size = self.size_policy.size_of(&value)?;

        if let Some(&idx) = self.index.get(&key) {
            let used = replaced_usage(self.used_bytes, self.order.node(idx).size, size, &key)?;
            self.order.move_to_back(idx);
            let node = self.order.node_mut(idx);
            node.value = value;
            node.size = size;
            self.used_bytes = used;
        } else {
            let used = replaced_usage(self.used_bytes, 0, size, &key)?;
            let idx = self.order.push_back(key.clone(), value, size);
            self.index.insert(key, idx);
            self.used_bytes = used;
        }

        self.enforce_budget();
        Ok(())
    }

    // == Get ==
    pub fn get(&mut self, key: &str, touch: bool) -> Option<Value> {
        let idx = *self.index.get(key)?;
        if touch {
            self.order.move_to_back(idx);
        }
        Some(self.order.node(idx).value.clone())
    }

    /// Reads without touching the order.
    pub fn peek(&self, key: &str) -> Option<Value> {
        let idx = *self.index.get(key)?;
        Some(self.order.node(idx).value.clone())
    }

    // == Delete ==
    pub fn delete(&mut self, key: &str) {
        if let Some(&idx) = self.index.get(key) {
            trace!(key, "deleting entry");
            self.remove(idx);
        }
    }

    // == Delete Oldest ==
    pub fn delete_oldest(&mut self) {
        if let Some(idx) = self.order.front() {
            self.remove(idx);
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn used_bytes(&self) -> i64 {
        self.used_bytes
    }

    pub fn max_bytes(&self) -> i64 {
        self.max_bytes
    }

    #[cfg(test)]
    pub fn keys(&self) -> Vec<String> {
        self.order.keys()
    }

    /// Evicts from the front until the budget holds or one entry is left.
    fn enforce_budget(&mut self) {
        while over_budget(self.max_bytes, self.used_bytes) && self.order.len() > 1 {
            if let Some(idx) = self.order.front() {
                let node = self.order.node(idx);
                debug!(
                    key = %node.key,
                    kind = node.value.kind(),
                    used_bytes = self.used_bytes,
                    max_bytes = self.max_bytes,
                    "evicting entry over budget"
                );
                self.remove(idx);
            }
        }
    }

    fn remove(&mut self, idx: usize) {
        let node = self.order.remove(idx);
        self.index.remove(&node.key);
        self.used_bytes -= node.size;
        if let Some(on_evicted) = self.on_evicted.as_mut() {
            on_evicted(&node.key, &node.value);
        }
    }
}
