use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use crate::path::{reconstruct, Route};
use crate::{Cost, CostModel, Error, Frontier, Graph, GreatCircle, Node, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Unseen,
    Open,
    Closed,
}

/// Per-query bookkeeping for a single node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeState {
    /// Best known cost from the source.
    pub g: Cost,
    /// Estimated cost to the destination, set when the node is first discovered.
    pub h: Cost,
    pub parent: Option<Node>,
    pub membership: Membership,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            g: Cost::INFINITY,
            h: 0.0,
            parent: None,
            membership: Membership::Unseen,
        }
    }
}

/// Cost/parent table of one query, one entry per graph node.
#[derive(Debug, Clone)]
pub struct SearchState {
    nodes: Vec<NodeState>,
}

impl SearchState {
    pub fn new(len: usize) -> Result<Self> {
        let mut nodes = Vec::new();
        nodes
            .try_reserve_exact(len)
            .map_err(|source| Error::AllocationFailure {
                what: "search state",
                source,
            })?;
        nodes.resize(len, NodeState::default());
        Ok(Self { nodes })
    }

    pub fn get(&self, n: Node) -> Option<&NodeState> {
        self.nodes.get(n.index())
    }

    pub fn get_mut(&mut self, n: Node) -> Option<&mut NodeState> {
        self.nodes.get_mut(n.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Node, &NodeState)> {
        self.nodes.iter().enumerate().map(|(i, s)| (Node(i), s))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl std::ops::Index<Node> for SearchState {
    type Output = NodeState;
    fn index(&self, n: Node) -> &NodeState {
        &self.nodes[n.index()]
    }
}

impl std::ops::IndexMut<Node> for SearchState {
    fn index_mut(&mut self, n: Node) -> &mut NodeState {
        &mut self.nodes[n.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Succeeded,
    FailedNoPath,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    pub expanded: usize,
    pub elapsed: Duration,
}

/// A single A* query over a borrowed graph.
///
/// The graph is only read, so any number of searches may share it. The
/// state and frontier belong to this search alone and are dropped with it.
pub struct Search<'g, M = GreatCircle> {
    graph: &'g Graph,
    model: M,
    source: Node,
    dest: Node,
    state: SearchState,
    frontier: Frontier,
    status: Status,
    stats: SearchStats,
}

impl<'g> Search<'g, GreatCircle> {
    pub fn new(graph: &'g Graph, source: Node, dest: Node) -> Result<Self> {
        Self::with_model(graph, source, dest, GreatCircle)
    }
}

impl<'g, M: CostModel> Search<'g, M> {
    pub fn with_model(graph: &'g Graph, source: Node, dest: Node, model: M) -> Result<Self> {
        for n in [source, dest] {
            if !graph.contains(n) {
                return Err(Error::InvalidNode(n));
            }
        }

        let mut state = SearchState::new(graph.len())?;
        let mut frontier = Frontier::with_capacity(graph.len());

        let h = model.estimate(graph.coord(source), graph.coord(dest));
        state[source] = NodeState {
            g: 0.0,
            h,
            parent: None,
            membership: Membership::Open,
        };
        frontier.insert(source, h);

        Ok(Self {
            graph,
            model,
            source,
            dest,
            state,
            frontier,
            status: Status::Running,
            stats: SearchStats::default(),
        })
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Expand one node. Does nothing once the search has finished.
    pub fn step(&mut self) -> Result<Status> {
        if self.status != Status::Running {
            return Ok(self.status);
        }

        if self.frontier.is_empty() {
            self.status = Status::FailedNoPath;
            return Ok(self.status);
        }

        let cur = self.frontier.extract_min()?;
        self.stats.expanded += 1;

        if cur == self.dest {
            self.state[cur].membership = Membership::Closed;
            self.status = Status::Succeeded;
            return Ok(self.status);
        }

        let g = self.graph;
        let cur_pos = g.coord(cur);
        let dest_pos = g.coord(self.dest);
        let cur_cost = self.state[cur].g;

        for child in g.successors(cur) {
            let child_pos = g.coord(child);
            let tentative = cur_cost + self.model.edge_cost(cur_pos, child_pos);
            let s = &mut self.state[child];
            match s.membership {
                Membership::Closed => continue,
                // Also skips a NaN tentative cost.
                Membership::Open if !(tentative < s.g) => continue,
                Membership::Open => {
                    s.g = tentative;
                    s.parent = Some(cur);
                    self.frontier.decrease_key(child, tentative + s.h);
                }
                Membership::Unseen => {
                    s.h = self.model.estimate(child_pos, dest_pos);
                    s.g = tentative;
                    s.parent = Some(cur);
                    s.membership = Membership::Open;
                    self.frontier.insert(child, tentative + s.h);
                }
            }
        }

        self.state[cur].membership = Membership::Closed;
        Ok(self.status)
    }

    /// Run the search to completion.
    pub fn run(&mut self) -> Result<Status> {
        self.run_until(|| false)
    }

    /// Run the search to completion, checking `cancelled` between iterations.
    pub fn run_until(&mut self, mut cancelled: impl FnMut() -> bool) -> Result<Status> {
        let start = Instant::now();
        let result = loop {
            if self.status != Status::Running {
                break Ok(self.status);
            }
            if cancelled() {
                break Err(Error::Cancelled);
            }
            if let Err(e) = self.step() {
                break Err(e);
            }
        };
        self.stats.elapsed += start.elapsed();
        result
    }

    /// The path found by a successful search.
    pub fn route(&self) -> Result<Route> {
        reconstruct(&self.state, self.source, self.dest)
    }
}

/// Result of a completed query.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Found(Route),
    NoPath,
}

impl Outcome {
    pub fn route(&self) -> Option<&Route> {
        match self {
            Outcome::Found(r) => Some(r),
            Outcome::NoPath => None,
        }
    }
}

/// Find the shortest path between the nodes with ids `source` and `dest`.
pub fn a_star(graph: &Graph, source: u64, dest: u64) -> Result<Outcome> {
    a_star_with(graph, source, dest, GreatCircle)
}

#[instrument(level = "debug", skip(graph, model))]
pub fn a_star_with(
    graph: &Graph,
    source: u64,
    dest: u64,
    model: impl CostModel,
) -> Result<Outcome> {
    let from = graph.lookup(source)?;
    let to = graph.lookup(dest)?;
    debug!(%from, %to, nodes = graph.len(), "starting search");

    let mut search = Search::with_model(graph, from, to, model)?;
    let status = search.run()?;
    let stats = search.stats();

    match status {
        Status::Succeeded => {
            let route = search.route()?;
            info!(
                expanded = stats.expanded,
                elapsed_ms = stats.elapsed.as_secs_f64() * 1000.0,
                cost_km = route.cost(),
                hops = route.len() - 1,
                "destination reached"
            );
            Ok(Outcome::Found(route))
        }
        _ => {
            info!(
                expanded = stats.expanded,
                elapsed_ms = stats.elapsed.as_secs_f64() * 1000.0,
                "open set exhausted before reaching destination"
            );
            Ok(Outcome::NoPath)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{haversine, Coord, GraphBuilder};
    use quickcheck::{quickcheck, Arbitrary, Gen, TestResult};
    use rand::Rng;

    fn build(coords: &[(f64, f64)], edges: &[(usize, usize)]) -> Graph {
        let mut b = GraphBuilder::new();
        for (i, &c) in coords.iter().enumerate() {
            b.add_node(id(i), format!("n{i}"), c.into()).unwrap();
        }
        for &(a, c) in edges {
            b.add_edge(id(a), id(c));
        }
        b.build().unwrap()
    }

    fn id(i: usize) -> u64 {
        100 + 7 * i as u64
    }

    fn ids(g: &Graph, route: &Route) -> Vec<u64> {
        route.nodes().map(|n| g.id(n)).collect()
    }

    fn path_cost(g: &Graph, route: &Route, model: &impl CostModel) -> Cost {
        route
            .waypoints()
            .windows(2)
            .fold(0.0, |acc, w| {
                acc + model.edge_cost(g.coord(w[0].node), g.coord(w[1].node))
            })
    }

    /// Exhaustive relaxation until nothing improves, with no heuristic.
    fn reference_cost(g: &Graph, source: Node, dest: Node) -> Option<Cost> {
        let mut cost = vec![Cost::INFINITY; g.len()];
        cost[source.index()] = 0.0;
        loop {
            let mut changed = false;
            for u in g.nodes() {
                if cost[u.index()].is_infinite() {
                    continue;
                }
                for v in g.successors(u) {
                    let c = cost[u.index()] + haversine(g.coord(u), g.coord(v));
                    if c < cost[v.index()] {
                        cost[v.index()] = c;
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
        Some(cost[dest.index()]).filter(|c| c.is_finite())
    }

    #[test]
    fn line_graph() {
        let g = build(&[(0.0, 0.0), (0.0, 1.0), (0.0, 2.0)], &[(0, 1), (1, 2)]);
        let route = match a_star(&g, id(0), id(2)).unwrap() {
            Outcome::Found(r) => r,
            Outcome::NoPath => panic!("expected a path"),
        };
        assert_eq!(ids(&g, &route), vec![id(0), id(1), id(2)]);
        let expected = haversine(Coord::new(0.0, 0.0), Coord::new(0.0, 1.0))
            + haversine(Coord::new(0.0, 1.0), Coord::new(0.0, 2.0));
        assert!((route.cost() - expected).abs() < 1e-9);
        assert_eq!(route.cost(), path_cost(&g, &route, &GreatCircle));
    }

    #[test]
    fn same_source_and_destination() {
        let g = build(&[(0.0, 0.0), (0.0, 1.0)], &[(0, 1), (1, 0)]);
        let outcome = a_star(&g, id(1), id(1)).unwrap();
        let route = outcome.route().unwrap();
        assert_eq!(ids(&g, route), vec![id(1)]);
        assert_eq!(route.cost(), 0.0);
    }

    #[test]
    fn unreachable_destination() {
        let g = build(
            &[(0.0, 0.0), (0.0, 1.0), (0.0, 2.0), (5.0, 5.0)],
            &[(0, 1), (1, 2), (2, 0), (3, 0)],
        );
        assert_eq!(a_star(&g, id(0), id(3)).unwrap(), Outcome::NoPath);

        let mut search = Search::new(&g, Node(0), Node(3)).unwrap();
        assert_eq!(search.run().unwrap(), Status::FailedNoPath);
        assert_eq!(search.stats().expanded, 3);
        assert!(matches!(search.route(), Err(Error::Unreachable(_))));
    }

    #[test]
    fn unknown_ids() {
        let g = build(&[(0.0, 0.0)], &[]);
        assert!(matches!(a_star(&g, 1, id(0)), Err(Error::NodeNotFound(1))));
        assert!(matches!(a_star(&g, id(0), 2), Err(Error::NodeNotFound(2))));
        assert!(matches!(
            Search::new(&g, Node(0), Node(4)),
            Err(Error::InvalidNode(_))
        ));
    }

    #[test]
    fn avoids_detour() {
        // 0 -> 1 -> 2 runs along the equator, 0 -> 3 -> 2 bends north.
        let g = build(
            &[(0.0, 0.0), (0.0, 1.0), (0.0, 2.0), (1.0, 1.0)],
            &[(0, 3), (3, 2), (0, 1), (1, 2)],
        );
        let outcome = a_star(&g, id(0), id(2)).unwrap();
        assert_eq!(ids(&g, outcome.route().unwrap()), vec![id(0), id(1), id(2)]);
    }

    /// Roads longer than 150 km cost three times their straight-line length.
    struct WindingRoads;

    impl CostModel for WindingRoads {
        fn edge_cost(&self, from: Coord, to: Coord) -> Cost {
            let d = haversine(from, to);
            if d > 150.0 {
                3.0 * d
            } else {
                d
            }
        }

        fn estimate(&self, from: Coord, goal: Coord) -> Cost {
            haversine(from, goal)
        }
    }

    #[test]
    fn prefers_two_hops_over_costly_direct_edge() {
        let g = build(
            &[(0.0, 0.0), (0.0, 1.0), (0.0, 2.0)],
            &[(0, 2), (0, 1), (1, 2)],
        );
        let direct = WindingRoads.edge_cost(g.coord(Node(0)), g.coord(Node(2)));
        let outcome = a_star_with(&g, id(0), id(2), WindingRoads).unwrap();
        let route = outcome.route().unwrap();
        assert_eq!(ids(&g, route), vec![id(0), id(1), id(2)]);
        assert!(route.cost() < direct);
        assert_eq!(route.cost(), path_cost(&g, route, &WindingRoads));
    }

    #[test]
    fn decrease_key_updates_parent() {
        // 1 is discovered first through the expensive road 0 -> 1 and later
        // improved through 0 -> 2 -> 1.
        let g = build(
            &[(0.0, 0.0), (0.0, 2.0), (0.0, 1.0), (0.0, 3.0)],
            &[(0, 1), (0, 2), (2, 1), (1, 3)],
        );
        let outcome = a_star_with(&g, id(0), id(3), WindingRoads).unwrap();
        assert_eq!(
            ids(&g, outcome.route().unwrap()),
            vec![id(0), id(2), id(1), id(3)]
        );
    }

    /// Roads leaving `(0, 0.5)` have no usable cost.
    struct BrokenJunction;

    impl CostModel for BrokenJunction {
        fn edge_cost(&self, from: Coord, to: Coord) -> Cost {
            if from == Coord::new(0.0, 0.5) {
                Cost::NAN
            } else {
                haversine(from, to)
            }
        }

        fn estimate(&self, from: Coord, goal: Coord) -> Cost {
            haversine(from, goal)
        }
    }

    #[test]
    fn nan_edge_cost_never_relaxes_open_node() {
        // 2 is expanded before 1 and offers it a NaN cost.
        let g = build(
            &[(0.0, 0.0), (0.2, 1.0), (0.0, 0.5), (0.0, 1.1)],
            &[(0, 2), (0, 1), (2, 1), (1, 3)],
        );
        let outcome = a_star_with(&g, id(0), id(3), BrokenJunction).unwrap();
        let route = outcome.route().unwrap();
        assert_eq!(ids(&g, route), vec![id(0), id(1), id(3)]);
        assert!(route.cost().is_finite());
    }

    #[test]
    fn idempotent() {
        let g = grid(6);
        let a = a_star(&g, g.id(Node(0)), g.id(Node(35))).unwrap();
        let b = a_star(&g, g.id(Node(0)), g.id(Node(35))).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn cancellation() {
        let g = grid(6);
        let mut search = Search::new(&g, Node(0), Node(35)).unwrap();
        let mut budget = 3;
        let result = search.run_until(|| {
            if budget == 0 {
                return true;
            }
            budget -= 1;
            false
        });
        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(search.stats().expanded, 3);
        assert_eq!(search.status(), Status::Running);

        assert_eq!(search.run().unwrap(), Status::Succeeded);
    }

    #[test]
    fn step_after_finish_is_noop() {
        let g = build(&[(0.0, 0.0)], &[]);
        let mut search = Search::new(&g, Node(0), Node(0)).unwrap();
        assert_eq!(search.step().unwrap(), Status::Succeeded);
        assert_eq!(search.step().unwrap(), Status::Succeeded);
        assert_eq!(search.stats().expanded, 1);
    }

    /// Bidirectional n x n grid with 0.01 degree spacing.
    fn grid(n: usize) -> Graph {
        let mut coords = Vec::new();
        let mut edges = Vec::new();
        for y in 0..n {
            for x in 0..n {
                let i = y * n + x;
                coords.push((y as f64 * 0.01, x as f64 * 0.01));
                if x + 1 < n {
                    edges.extend([(i, i + 1), (i + 1, i)]);
                }
                if y + 1 < n {
                    edges.extend([(i, i + n), (i + n, i)]);
                }
            }
        }
        build(&coords, &edges)
    }

    #[test]
    fn closed_costs_are_final() {
        let g = grid(8);
        let mut search = Search::new(&g, Node(3), Node(60)).unwrap();
        let mut closed: Vec<Option<Cost>> = vec![None; g.len()];
        while search.step().unwrap() == Status::Running {
            for (n, s) in search.state().iter() {
                if let Some(g_closed) = closed[n.index()] {
                    assert_eq!(s.membership, Membership::Closed);
                    assert_eq!(s.g, g_closed);
                } else if s.membership == Membership::Closed {
                    closed[n.index()] = Some(s.g);
                }
            }
            for (n, s) in search.state().iter() {
                assert_eq!(search.frontier().contains(n), s.membership == Membership::Open);
            }
        }
        assert_eq!(search.status(), Status::Succeeded);
    }

    #[derive(Debug, Clone)]
    struct Network {
        coords: Vec<(f64, f64)>,
        edges: Vec<(usize, usize)>,
        source: usize,
        dest: usize,
    }

    impl Arbitrary for Network {
        fn arbitrary<G: Gen>(g: &mut G) -> Network {
            let n = g.gen_range(1, 14);
            let coords = (0..n)
                .map(|_| (g.gen_range(-0.5, 0.5), g.gen_range(-0.5, 0.5)))
                .collect();
            let edges = (0..g.gen_range(0, 4 * n))
                .map(|_| (g.gen_range(0, n), g.gen_range(0, n)))
                .collect();
            Network {
                coords,
                edges,
                source: g.gen_range(0, n),
                dest: g.gen_range(0, n),
            }
        }
    }

    #[test]
    fn prop_optimal_against_exhaustive_search() {
        fn prop(net: Network) -> TestResult {
            let g = build(&net.coords, &net.edges);
            let (s, d) = (Node(net.source), Node(net.dest));
            let expected = reference_cost(&g, s, d);
            let outcome = a_star(&g, g.id(s), g.id(d)).unwrap();
            match (outcome, expected) {
                (Outcome::NoPath, None) => TestResult::passed(),
                (Outcome::Found(route), Some(best)) => {
                    let along = path_cost(&g, &route, &GreatCircle);
                    TestResult::from_bool(
                        route.source() == s
                            && route.destination() == d
                            && route.cost() == along
                            && route.cost() <= best + 1e-9,
                    )
                }
                _ => TestResult::failed(),
            }
        }
        quickcheck(prop as fn(Network) -> TestResult);
    }

    #[test]
    fn prop_route_follows_edges() {
        fn prop(net: Network) -> bool {
            let g = build(&net.coords, &net.edges);
            let outcome = a_star(&g, id(net.source), id(net.dest)).unwrap();
            let Some(route) = outcome.route() else {
                return true;
            };
            route
                .waypoints()
                .windows(2)
                .all(|w| g.successors(w[0].node).any(|n| n == w[1].node) && w[0].cost <= w[1].cost)
        }
        quickcheck(prop as fn(Network) -> bool);
    }
}
