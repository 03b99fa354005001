use crate::{haversine, Graph, Route};

mod dot {
    use crate::{haversine, Graph, Node};

    fn write_header(name: &str, out: &mut String) {
        out.push_str("digraph ");
        out.push_str(name);
        out.push_str(" {\n");
    }

    fn write_footer(out: &mut String) {
        out.push_str("}\n");
    }

    pub fn write(g: &Graph, on_route: impl Fn(Node, Node) -> bool, out: &mut String) {
        write_header("G", out);

        for n in g.nodes() {
            let rec = g.node(n);
            let label = if rec.name.is_empty() {
                rec.id.to_string()
            } else {
                format!("{} {}", rec.id, rec.name.replace('"', "\\\""))
            };
            out.push_str(&format!("{} [label = \"{}\"];\n", n, label));
        }

        for n in g.nodes() {
            for s in g.successors(n) {
                let km = haversine(g.coord(n), g.coord(s));
                let style = if on_route(n, s) { ", color = red" } else { "" };
                out.push_str(&format!(
                    "{} -> {} [label = \"{:.3}\"{}];\n",
                    n, s, km, style
                ));
            }
        }

        write_footer(out);
    }
}

/// Graphviz rendering of `g`, with the edges of `route` highlighted.
pub fn to_dot(g: &Graph, route: Option<&Route>) -> String {
    let hops: Vec<_> = route
        .map(|r| r.waypoints().windows(2).map(|w| (w[0].node, w[1].node)).collect())
        .unwrap_or_default();
    let mut out = String::new();
    dot::write(g, |a, b| hops.contains(&(a, b)), &mut out);
    out
}

/// Total straight-line length of the graph's edges in kilometres.
pub fn network_length(g: &Graph) -> f64 {
    g.nodes()
        .flat_map(|n| g.successors(n).map(move |s| (n, s)))
        .map(|(a, b)| haversine(g.coord(a), g.coord(b)))
        .sum()
}
