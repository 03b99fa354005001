use roadstar::report::{default_output_path, write_report, METERS_PER_KM};
use roadstar::{Graph, Outcome};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(author, version, about = "Shortest route between two nodes of a road graph")]
struct Cli {
    /// Binary graph file produced by build-graph
    graph: PathBuf,
    /// Id of the source node
    #[arg(long)]
    from: u64,
    /// Id of the destination node
    #[arg(long)]
    to: u64,
    /// Report file, defaults to <graph stem>_SROutput.txt next to the graph
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Also write the graph with the route highlighted as Graphviz
    #[arg(long)]
    dot: Option<PathBuf>,
    /// Logging verbosity level (`trace`, `debug`, `info`, `warn`, `error`)
    #[arg(short, long, default_value = "warn")]
    verbosity: String,
}

fn load(path: &Path) -> Result<Graph> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let len = file.metadata()?.len();
    let pb = ProgressBar::new(len).with_style(ProgressStyle::with_template(
        "loading {bar:40} {bytes}/{total_bytes}",
    )?);
    let graph = roadstar::read_graph(BufReader::new(pb.wrap_read(file)))
        .with_context(|| format!("reading graph from {}", path.display()))?;
    pb.finish_and_clear();
    Ok(graph)
}

/// Print the stdout summary of one query. An unreachable destination is a
/// normal answer, not an error.
fn print_summary(
    mut w: impl Write,
    from: u64,
    to: u64,
    outcome: &Outcome,
    search_time: Duration,
) -> io::Result<()> {
    match outcome {
        Outcome::Found(route) => writeln!(
            w,
            "Optimal distance: {:.6} meters.",
            route.cost() * METERS_PER_KM
        )?,
        Outcome::NoPath => writeln!(w, "No route from {from} to {to}.")?,
    }
    writeln!(w, "A* time elapsed: {:.6} seconds.", search_time.as_secs_f64())
}

fn run(cli: Cli) -> Result<()> {
    let start = std::time::Instant::now();
    let graph = load(&cli.graph)?;
    info!(
        nodes = graph.len(),
        edges = graph.edge_count(),
        secs = start.elapsed().as_secs_f32(),
        "graph ready"
    );

    let search_start = std::time::Instant::now();
    let outcome = roadstar::a_star(&graph, cli.from, cli.to)?;
    let search_time = search_start.elapsed();

    print_summary(io::stdout().lock(), cli.from, cli.to, &outcome, search_time)?;
    let Outcome::Found(route) = outcome else {
        return Ok(());
    };

    let output = cli
        .output
        .unwrap_or_else(|| default_output_path(&cli.graph));
    let file = File::create(&output).with_context(|| format!("creating {}", output.display()))?;
    write_report(BufWriter::new(file), &graph, &route)
        .with_context(|| format!("writing {}", output.display()))?;
    println!("Route written to {}", output.display());

    if let Some(dot) = cli.dot {
        std::fs::write(&dot, roadstar::to_dot(&graph, Some(&route)))
            .with_context(|| format!("writing {}", dot.display()))?;
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    roadstar::logging::setup(&cli.verbosity);
    run(cli)
}
