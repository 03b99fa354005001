pub mod astar;
pub mod codec;
mod error;
mod fmt;
mod frontier;
mod geo;
pub mod graph;
pub mod logging;
mod map;
pub mod osm;
pub mod path;
pub mod report;

pub use astar::{a_star, a_star_with, Outcome, Search, SearchState, SearchStats, Status};
pub use codec::{read_graph, write_graph};
pub use error::{Error, Result};
pub use fmt::{network_length, to_dot};
pub use frontier::Frontier;
pub use geo::{haversine, Coord, CostModel, GreatCircle, EARTH_RADIUS_KM};
pub use graph::{Graph, GraphBuilder};
pub(crate) use map::NodeMap;
pub use path::{Route, Waypoint};

/// Distance in kilometres.
pub type Cost = f64;

/// Index of a node inside a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Node(usize);

impl Node {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("N{}", self.0))
    }
}
