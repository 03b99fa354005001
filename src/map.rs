use crate::Node;

/// Sparse per-node storage backed by a vector indexed by node.
#[derive(Default, Debug, Clone)]
pub struct NodeMap<T> {
    v: Vec<Option<T>>,
}

impl<T> NodeMap<T> {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            v: Vec::with_capacity(cap),
        }
    }

    /// Insert `t` for `n`, returning the previous value.
    pub fn insert(&mut self, n: Node, t: T) -> Option<T> {
        let i = n.index();
        if i >= self.v.len() {
            self.v.resize_with(i + 1, || None);
        }
        self.v[i].replace(t)
    }

    pub fn has(&self, n: Node) -> bool {
        self.get(n).is_some()
    }

    pub fn get(&self, n: Node) -> Option<&T> {
        self.v.get(n.index()).and_then(Option::as_ref)
    }

    pub fn remove(&mut self, n: Node) -> Option<T> {
        self.v.get_mut(n.index()).and_then(Option::take)
    }
}
