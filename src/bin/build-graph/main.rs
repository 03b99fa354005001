use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(author, version, about = "Convert a map export into a binary road graph")]
struct Cli {
    /// The `|`-separated map export
    map: PathBuf,
    /// Output graph, defaults to the map path with a .bin extension
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Logging verbosity level (`trace`, `debug`, `info`, `warn`, `error`)
    #[arg(short, long, default_value = "info")]
    verbosity: String,
}

fn run(cli: Cli) -> Result<()> {
    let start = std::time::Instant::now();

    let file = File::open(&cli.map).with_context(|| format!("opening {}", cli.map.display()))?;
    let pb = ProgressBar::new(file.metadata()?.len()).with_style(ProgressStyle::with_template(
        "parsing {bar:40} {bytes}/{total_bytes} ({eta})",
    )?);
    let graph = roadstar::osm::parse_map(BufReader::new(pb.wrap_read(file)))
        .with_context(|| format!("parsing {}", cli.map.display()))?;
    pb.finish_and_clear();

    let output = cli.output.unwrap_or_else(|| cli.map.with_extension("bin"));
    let out = File::create(&output).with_context(|| format!("creating {}", output.display()))?;
    roadstar::write_graph(&graph, BufWriter::new(out))
        .with_context(|| format!("writing {}", output.display()))?;

    info!(
        nodes = graph.len(),
        edges = graph.edge_count(),
        km = roadstar::network_length(&graph),
        "graph written to {}",
        output.display()
    );
    println!("Took {} s to run", start.elapsed().as_secs_f32());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    roadstar::logging::setup(&cli.verbosity);
    run(cli)
}
