use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{Graph, Route};

pub const METERS_PER_KM: f64 = 1000.0;

/// Write the textual route report. Every distance is in metres.
pub fn write_report(mut w: impl Write, graph: &Graph, route: &Route) -> std::io::Result<()> {
    writeln!(
        w,
        "# Distance from {} to {}: {:.6} meters.",
        graph.id(route.source()),
        graph.id(route.destination()),
        route.cost() * METERS_PER_KM
    )?;
    writeln!(w, "# Optimal path:")?;
    for wp in route.waypoints() {
        let n = graph.node(wp.node);
        writeln!(
            w,
            "Id = {} | {:.6} | {:.6} | Dist = {:.6}",
            n.id,
            n.coord.lat,
            n.coord.lon,
            wp.cost * METERS_PER_KM
        )?;
    }
    w.flush()
}

/// `dir/map.bin` -> `dir/map_SROutput.txt`
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}_SROutput.txt"))
}
