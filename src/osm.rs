//! Parser for the `|`-separated map export the road graphs are built from.
//!
//! ```text
//! # comment
//! node|id|name|place|highway|route|ref|oneway|maxspeed|lat|lon
//! way|id|name|place|highway|route|ref|oneway|maxspeed|node|node|...
//! relation|...
//! ```
//!
//! Consecutive way members are linked in both directions unless the
//! `oneway` field says otherwise. Members that are not nodes of the map are
//! skipped and the chain continues from the previous known member. Parsing
//! stops at the first relation. Any oneway value starting with `o` marks a
//! oneway way.
//!
//! Coordinates must be finite decimal degrees, latitude within [-90, 90] and
//! longitude within [-180, 180].

use std::io::BufRead;

use tracing::{debug, trace};

use crate::{Coord, Error, Graph, GraphBuilder, Result};

const NODE_NAME: usize = 2;
const NODE_LAT: usize = 9;
const NODE_LON: usize = 10;
const WAY_ONEWAY: usize = 7;
const WAY_MEMBERS: usize = 9;

struct Way {
    line: usize,
    oneway: bool,
    members: Vec<u64>,
}

fn syntax(line: usize, reason: impl Into<String>) -> Error {
    Error::MapSyntax {
        line,
        reason: reason.into(),
    }
}

fn field<'a>(fields: &[&'a str], i: usize, line: usize, what: &str) -> Result<&'a str> {
    fields
        .get(i)
        .copied()
        .ok_or_else(|| syntax(line, format!("missing {what} (field {i})")))
}

fn parse_id(s: &str, line: usize) -> Result<u64> {
    s.trim()
        .parse()
        .map_err(|e| syntax(line, format!("bad node id {s:?}: {e}")))
}

fn parse_coord(s: &str, line: usize) -> Result<f64> {
    let v: f64 = s
        .trim()
        .parse()
        .map_err(|e| syntax(line, format!("bad coordinate {s:?}: {e}")))?;
    if !v.is_finite() {
        return Err(syntax(line, format!("non-finite coordinate {s:?}")));
    }
    Ok(v)
}

/// Parse a map export into a graph.
pub fn parse_map(r: impl BufRead) -> Result<Graph> {
    let mut builder = GraphBuilder::new();
    let mut ways = Vec::new();

    for (i, line) in r.lines().enumerate() {
        let line = line?;
        let lineno = i + 1;
        let fields: Vec<&str> = line.split('|').collect();
        match fields[0] {
            "node" => {
                let id = parse_id(field(&fields, 1, lineno, "node id")?, lineno)?;
                let name = field(&fields, NODE_NAME, lineno, "name")?;
                let lat = parse_coord(field(&fields, NODE_LAT, lineno, "latitude")?, lineno)?;
                let lon = parse_coord(field(&fields, NODE_LON, lineno, "longitude")?, lineno)?;
                let coord = Coord::new(lat, lon);
                if !coord.is_valid() {
                    return Err(syntax(lineno, format!("coordinate ({lat}, {lon}) out of range")));
                }
                builder.add_node(id, name, coord)?;
            }
            "way" => {
                let oneway = field(&fields, WAY_ONEWAY, lineno, "oneway flag")?
                    .trim_start()
                    .starts_with('o');
                let members = fields
                    .get(WAY_MEMBERS..)
                    .unwrap_or_default()
                    .iter()
                    .filter(|m| !m.trim().is_empty())
                    .map(|m| parse_id(m, lineno))
                    .collect::<Result<Vec<_>>>()?;
                ways.push(Way {
                    line: lineno,
                    oneway,
                    members,
                });
            }
            "relation" => break,
            _ => trace!(line = lineno, "skipping line"),
        }
    }

    let mut links = 0usize;
    for way in &ways {
        let known: Vec<u64> = way
            .members
            .iter()
            .copied()
            .filter(|&id| builder.contains(id))
            .collect();
        let Some((&first, rest)) = known.split_first() else {
            trace!(line = way.line, "way has no known members");
            continue;
        };
        let mut prev = first;
        for &next in rest {
            builder.add_edge(prev, next);
            if !way.oneway {
                builder.add_edge(next, prev);
            }
            links += 1;
            prev = next;
        }
    }

    debug!(
        nodes = builder.node_count(),
        ways = ways.len(),
        links,
        "map parsed"
    );
    builder.build()
}
