//! The binary graph file.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! header   node_count: u64, successor_count: u64, name_bytes: u64
//! nodes    node_count records of RECORD_SIZE bytes
//! arena    successor_count u64 node indices, in node order
//! names    name_bytes bytes, node names back to back
//! ```
//!
//! Each record carries two reference slots that are written as zeros and
//! never read back. Names and adjacency are rebuilt from the separate
//! sections using the per-node lengths.

use std::io::{self, Read, Write};

use tracing::debug;

use crate::error::corrupt;
use crate::graph::{NodeRecord, Span};
use crate::{Coord, Error, Graph, Node, Result};

pub const HEADER_SIZE: usize = 24;
pub const RECORD_SIZE: usize = 56;

const ID: usize = 0;
const NAME_LEN: usize = 8;
const LAT: usize = 24;
const LON: usize = 32;
const SUCC_COUNT: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub node_count: u64,
    pub successor_count: u64,
    pub name_bytes: u64,
}

fn truncated(section: &'static str) -> impl FnOnce(io::Error) -> Error {
    move |e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            corrupt(format!("file ends inside the {section}"))
        } else {
            Error::Io(e)
        }
    }
}

fn alloc<T>(what: &'static str, count: u64) -> Result<Vec<T>> {
    let count = usize::try_from(count)
        .map_err(|_| corrupt(format!("{what} count {count} does not fit in memory")))?;
    let mut v = Vec::new();
    v.try_reserve_exact(count)
        .map_err(|source| Error::AllocationFailure { what, source })?;
    Ok(v)
}

fn u16_at(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

fn u64_at(buf: &[u8], at: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(b)
}

fn f64_at(buf: &[u8], at: usize) -> f64 {
    f64::from_bits(u64_at(buf, at))
}

pub fn read_header(r: &mut impl Read) -> Result<Header> {
    let mut buf = [0u8; HEADER_SIZE];
    r.read_exact(&mut buf).map_err(truncated("header"))?;
    Ok(Header {
        node_count: u64_at(&buf, 0),
        successor_count: u64_at(&buf, 8),
        name_bytes: u64_at(&buf, 16),
    })
}

/// Load a graph, validating every count and index against the header.
pub fn read_graph(mut r: impl Read) -> Result<Graph> {
    let header = read_header(&mut r)?;
    debug!(?header, "reading graph");

    let mut raw: Vec<(u64, usize, Coord, usize)> = alloc("node records", header.node_count)?;
    let mut record = [0u8; RECORD_SIZE];
    for _ in 0..header.node_count {
        r.read_exact(&mut record).map_err(truncated("node records"))?;
        raw.push((
            u64_at(&record, ID),
            u16_at(&record, NAME_LEN) as usize,
            Coord::new(f64_at(&record, LAT), f64_at(&record, LON)),
            u16_at(&record, SUCC_COUNT) as usize,
        ));
    }

    let listed: u64 = raw.iter().map(|n| n.3 as u64).sum();
    if listed != header.successor_count {
        return Err(corrupt(format!(
            "records list {listed} successors, header says {}",
            header.successor_count
        )));
    }

    let mut successors: Vec<Node> = alloc("successor arena", header.successor_count)?;
    let mut word = [0u8; 8];
    for _ in 0..header.successor_count {
        r.read_exact(&mut word).map_err(truncated("successor arena"))?;
        let i = u64::from_le_bytes(word);
        if i >= header.node_count {
            return Err(corrupt(format!(
                "successor index {i} is out of range for {} nodes",
                header.node_count
            )));
        }
        successors.push(Node(i as usize));
    }

    let name_total: u64 = raw.iter().map(|n| n.1 as u64).sum();
    if name_total > header.name_bytes {
        return Err(corrupt(format!(
            "records need {name_total} name bytes, header says {}",
            header.name_bytes
        )));
    }
    let mut names: Vec<u8> = alloc("names", header.name_bytes)?;
    r.by_ref()
        .take(header.name_bytes)
        .read_to_end(&mut names)?;
    if (names.len() as u64) < header.name_bytes {
        return Err(corrupt("file ends inside the names"));
    }

    let mut nodes: Vec<NodeRecord> = alloc("nodes", header.node_count)?;
    let (mut name_at, mut offset) = (0, 0);
    for (id, name_len, coord, succ_len) in raw {
        let name = String::from_utf8(names[name_at..name_at + name_len].to_vec())
            .map_err(|e| corrupt(format!("name of node {id} is not UTF-8: {e}")))?;
        name_at += name_len;
        nodes.push(NodeRecord {
            id,
            name,
            coord,
            adjacency: Span {
                offset,
                len: succ_len,
            },
        });
        offset += succ_len;
    }

    let graph = Graph::from_parts(nodes, successors)?;
    debug!(
        nodes = graph.len(),
        edges = graph.edge_count(),
        "graph loaded"
    );
    Ok(graph)
}

/// Write `graph` in the format [`read_graph`] consumes.
pub fn write_graph(graph: &Graph, mut w: impl Write) -> Result<()> {
    let records = graph.records();
    let mut name_bytes = 0u64;
    for n in records {
        for (field, value) in [("name", n.name.len()), ("successor count", n.adjacency.len)] {
            if value > u16::MAX as usize {
                return Err(Error::FieldOverflow {
                    id: n.id,
                    field,
                    value,
                });
            }
        }
        name_bytes += n.name.len() as u64;
    }

    w.write_all(&(records.len() as u64).to_le_bytes())?;
    w.write_all(&(graph.edge_count() as u64).to_le_bytes())?;
    w.write_all(&name_bytes.to_le_bytes())?;

    for n in records {
        let mut record = [0u8; RECORD_SIZE];
        record[ID..ID + 8].copy_from_slice(&n.id.to_le_bytes());
        record[NAME_LEN..NAME_LEN + 2].copy_from_slice(&(n.name.len() as u16).to_le_bytes());
        record[LAT..LAT + 8].copy_from_slice(&n.coord.lat.to_le_bytes());
        record[LON..LON + 8].copy_from_slice(&n.coord.lon.to_le_bytes());
        record[SUCC_COUNT..SUCC_COUNT + 2]
            .copy_from_slice(&(n.adjacency.len as u16).to_le_bytes());
        w.write_all(&record)?;
    }

    for s in graph.arena() {
        w.write_all(&(s.index() as u64).to_le_bytes())?;
    }

    for n in records {
        w.write_all(n.name.as_bytes())?;
    }
    w.flush()?;
    Ok(())
}
