use crate::astar::{Membership, SearchState};
use crate::{Cost, Error, Node, Result};

/// One node of a [`Route`] together with its cumulative cost from the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub node: Node,
    pub cost: Cost,
}

/// A complete path from source to destination, both inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    waypoints: Vec<Waypoint>,
}

impl Route {
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.waypoints.iter().map(|w| w.node)
    }

    pub fn source(&self) -> Node {
        self.waypoints[0].node
    }

    pub fn destination(&self) -> Node {
        self.waypoints[self.waypoints.len() - 1].node
    }

    /// Total cost in kilometres.
    pub fn cost(&self) -> Cost {
        self.waypoints[self.waypoints.len() - 1].cost
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

/// Walk the parent links from `dest` back to `source`.
pub fn reconstruct(state: &SearchState, source: Node, dest: Node) -> Result<Route> {
    if state.get(dest).map(|s| s.membership) != Some(Membership::Closed) {
        return Err(Error::Unreachable(dest));
    }

    let mut waypoints = Vec::new();
    let mut child = dest;
    loop {
        let s = state.get(child).ok_or(Error::Unreachable(dest))?;
        waypoints.push(Waypoint {
            node: child,
            cost: s.g,
        });
        if child == source {
            waypoints.reverse();
            return Ok(Route { waypoints });
        }
        // A parent chain longer than the graph means the links are broken.
        if waypoints.len() > state.len() {
            return Err(Error::Unreachable(dest));
        }
        child = s.parent.ok_or(Error::Unreachable(dest))?;
    }
}
