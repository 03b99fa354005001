use std::collections::HashMap;

use crate::error::corrupt;
use crate::{Coord, Error, Node, Result};

/// Location of a node's successors inside the shared arena.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub id: u64,
    pub name: String,
    pub coord: Coord,
    pub adjacency: Span,
}

/// Immutable road network: id-sorted nodes plus one flat successor arena.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<NodeRecord>,
    successors: Vec<Node>,
}

impl Graph {
    /// Assemble a graph from flat parts, checking that ids are strictly
    /// ascending, coordinates are valid and the adjacency spans exactly tile
    /// the arena.
    pub fn from_parts(nodes: Vec<NodeRecord>, successors: Vec<Node>) -> Result<Self> {
        let mut expected_offset = 0;
        for (i, n) in nodes.iter().enumerate() {
            if i > 0 && nodes[i - 1].id >= n.id {
                return Err(corrupt(format!(
                    "node ids are not strictly ascending at index {i} ({} then {})",
                    nodes[i - 1].id,
                    n.id
                )));
            }
            if !n.coord.is_valid() {
                return Err(corrupt(format!(
                    "node {} has invalid coordinate ({}, {})",
                    n.id, n.coord.lat, n.coord.lon
                )));
            }
            if n.adjacency.offset != expected_offset {
                return Err(corrupt(format!(
                    "adjacency of node {} starts at {}, expected {}",
                    n.id, n.adjacency.offset, expected_offset
                )));
            }
            expected_offset += n.adjacency.len;
        }

        if expected_offset != successors.len() {
            return Err(corrupt(format!(
                "nodes reference {} successors but the arena holds {}",
                expected_offset,
                successors.len()
            )));
        }

        if let Some(bad) = successors.iter().find(|s| s.index() >= nodes.len()) {
            return Err(corrupt(format!(
                "successor index {} is out of range for {} nodes",
                bad.index(),
                nodes.len()
            )));
        }

        Ok(Self { nodes, successors })
    }

    /// Find the index of the node with the given id.
    pub fn lookup(&self, id: u64) -> Result<Node> {
        self.nodes
            .binary_search_by_key(&id, |n| n.id)
            .map(Node)
            .map_err(|_| Error::NodeNotFound(id))
    }

    pub fn contains(&self, n: Node) -> bool {
        n.index() < self.nodes.len()
    }

    /// Return the direct successors of n
    pub fn successors(&self, n: Node) -> impl Iterator<Item = Node> + '_ {
        let Span { offset, len } = self.nodes[n.index()].adjacency;
        self.successors[offset..offset + len].iter().copied()
    }

    pub fn node(&self, n: Node) -> &NodeRecord {
        &self.nodes[n.index()]
    }

    pub fn id(&self, n: Node) -> u64 {
        self.nodes[n.index()].id
    }

    pub fn coord(&self, n: Node) -> Coord {
        self.nodes[n.index()].coord
    }

    pub fn records(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn arena(&self) -> &[Node] {
        &self.successors
    }

    pub fn nodes(&self) -> impl Iterator<Item = Node> {
        (0..self.nodes.len()).map(Node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.successors.len()
    }
}

/// Collects nodes and edges keyed by id, then locks them into a [`Graph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<(u64, String, Coord)>,
    by_id: HashMap<u64, usize>,
    edges: Vec<(u64, u64)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: u64, name: impl Into<String>, coord: Coord) -> Result<()> {
        if self.by_id.insert(id, self.nodes.len()).is_some() {
            return Err(Error::DuplicateNodeId(id));
        }
        self.nodes.push((id, name.into(), coord));
        Ok(())
    }

    pub fn contains(&self, id: u64) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Add the directed edge `from -> to`. Endpoints are resolved in [`build`](Self::build).
    pub fn add_edge(&mut self, from: u64, to: u64) {
        self.edges.push((from, to));
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn build(self) -> Result<Graph> {
        let GraphBuilder {
            mut nodes, edges, ..
        } = self;
        nodes.sort_unstable_by_key(|(id, ..)| *id);

        let index: HashMap<u64, Node> = nodes
            .iter()
            .enumerate()
            .map(|(i, (id, ..))| (*id, Node(i)))
            .collect();
        let resolve = |id: u64| index.get(&id).copied().ok_or(Error::NodeNotFound(id));

        let mut adjacency: Vec<Vec<Node>> = vec![Vec::new(); nodes.len()];
        for (from, to) in edges {
            let (a, b) = (resolve(from)?, resolve(to)?);
            let out = &mut adjacency[a.index()];
            if !out.contains(&b) {
                out.push(b);
            }
        }

        let total = adjacency.iter().map(Vec::len).sum();
        let mut successors = Vec::with_capacity(total);
        let mut records = Vec::with_capacity(nodes.len());
        for ((id, name, coord), out) in nodes.into_iter().zip(adjacency) {
            let offset = successors.len();
            successors.extend_from_slice(&out);
            records.push(NodeRecord {
                id,
                name,
                coord,
                adjacency: Span {
                    offset,
                    len: out.len(),
                },
            });
        }

        Graph::from_parts(records, successors)
    }
}
