use std::cmp::Ordering;

use crate::{Cost, Error, Node, NodeMap, Result};

#[derive(Debug, Clone, Copy)]
struct Entry {
    node: Node,
    f: Cost,
    seq: u64,
}

impl Entry {
    // Smaller f first, then earlier insertion.
    fn precedes(&self, o: &Entry) -> bool {
        match self.f.total_cmp(&o.f) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => self.seq < o.seq,
        }
    }
}

/// The open set: a binary min-heap on `f` with a node -> slot index so
/// entries can be located and removed by identity.
#[derive(Debug, Default)]
pub struct Frontier {
    heap: Vec<Entry>,
    slots: NodeMap<usize>,
    next_seq: u64,
}

impl Frontier {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            heap: Vec::with_capacity(cap),
            slots: NodeMap::with_capacity(cap),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, n: Node) -> bool {
        self.slots.has(n)
    }

    /// The key `n` is currently queued with.
    pub fn key(&self, n: Node) -> Option<Cost> {
        self.slots.get(n).map(|&slot| self.heap[slot].f)
    }

    pub fn peek(&self) -> Option<(Node, Cost)> {
        self.heap.first().map(|e| (e.node, e.f))
    }

    /// Queue `n` with priority `f`. A node that is already queued is moved
    /// to the new key instead of being duplicated.
    pub fn insert(&mut self, n: Node, f: Cost) {
        self.requeue(n, f);
    }

    /// Remove and return the node with the smallest `f`.
    pub fn extract_min(&mut self) -> Result<Node> {
        if self.heap.is_empty() {
            return Err(Error::FrontierEmpty);
        }
        let e = self.remove_at(0);
        Ok(e.node)
    }

    /// Remove the entry for `n` and queue it again with `f`.
    pub fn decrease_key(&mut self, n: Node, f: Cost) {
        debug_assert!(
            self.key(n).map_or(true, |old| f <= old),
            "decrease_key raised the key of {n}"
        );
        self.requeue(n, f);
    }

    fn requeue(&mut self, n: Node, f: Cost) {
        if let Some(&slot) = self.slots.get(n) {
            self.remove_at(slot);
        }
        self.push(n, f);
    }

    fn push(&mut self, node: Node, f: Cost) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let slot = self.heap.len();
        self.heap.push(Entry { node, f, seq });
        self.slots.insert(node, slot);
        self.sift_up(slot);
    }

    fn remove_at(&mut self, slot: usize) -> Entry {
        let e = self.heap.swap_remove(slot);
        self.slots.remove(e.node);
        if slot < self.heap.len() {
            self.slots.insert(self.heap[slot].node, slot);
            self.sift_down(slot);
            self.sift_up(slot);
        }
        e
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.heap.swap(a, b);
        self.slots.insert(self.heap[a].node, a);
        self.slots.insert(self.heap[b].node, b);
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if !self.heap[slot].precedes(&self.heap[parent]) {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        let len = self.heap.len();
        loop {
            let (l, r) = (2 * slot + 1, 2 * slot + 2);
            let mut min = slot;
            if l < len && self.heap[l].precedes(&self.heap[min]) {
                min = l;
            }
            if r < len && self.heap[r].precedes(&self.heap[min]) {
                min = r;
            }
            if min == slot {
                break;
            }
            self.swap(slot, min);
            slot = min;
        }
    }
}
