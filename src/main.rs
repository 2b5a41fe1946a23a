mod app;
mod headless;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use eframe::egui::vec2;
use orbit_graph::graph::{BuiltGraph, DatasetGraph};
use orbit_graph::{GraphBuilder, NodeId, OrbitConfig, Session};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Record file with one `id/title[/childIdCsv[/unused[/typeTag]]]` per line.
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Size of each star in the synthetic dataset (3N nodes in total).
    #[arg(long, default_value_t = 5)]
    synthetic: usize,

    /// Use a fully connected dataset of this many nodes instead.
    #[arg(long)]
    complete: Option<usize>,

    /// Churn steps applied to the synthetic dataset after building it.
    #[arg(long, default_value_t = 0)]
    churn: usize,

    /// Initial center: exact id or fuzzy title match.
    #[arg(long)]
    center: Option<String>,

    #[arg(long)]
    seed: Option<u64>,

    /// Run this many ticks without a window and print the final snapshot as JSON.
    #[arg(long, value_name = "TICKS")]
    headless: Option<u64>,

    /// Run one churn step on the live graph before every tick.
    #[arg(long)]
    churn_per_tick: bool,

    /// JSON file overriding engine and churn constants.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => OrbitConfig::load(path)?,
        None => OrbitConfig::default(),
    };
    let mut engine = config.engine;
    if let Some(seed) = args.seed {
        engine.seed = seed;
    }

    let builder = GraphBuilder::new(config.churn, engine.seed);
    let built = build_graph(&args, &builder)?;
    tracing::info!(
        nodes = built.dataset.node_count(),
        edges = built.dataset.edge_count(),
        "dataset ready"
    );

    let center = pick_center(&built.dataset, args.center.as_deref())?;
    let mut session = Session::new(built, engine, vec2(1440.0, 880.0));
    session
        .recenter(&center)
        .with_context(|| format!("failed to center on {center}"))?;

    match args.headless {
        Some(ticks) => headless::run(session, ticks, args.churn_per_tick),
        None => app::run(session, args.churn_per_tick),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("orbit_graph=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_graph(args: &Args, builder: &GraphBuilder) -> Result<BuiltGraph> {
    if args.churn > 0 && (args.dataset.is_some() || args.complete.is_some()) {
        tracing::warn!(steps = args.churn, "--churn only applies to the synthetic dataset");
    }

    if let Some(path) = &args.dataset {
        return builder.load(path);
    }
    if let Some(n) = args.complete {
        return Ok(builder.complete(n));
    }
    builder
        .synthetic(args.synthetic, args.churn)
        .context("failed to build the synthetic dataset")
}

fn pick_center(dataset: &DatasetGraph, query: Option<&str>) -> Result<NodeId> {
    let Some(query) = query else {
        return match dataset.ids().next() {
            Some(id) => Ok(id.clone()),
            None => bail!("dataset has no nodes to center on"),
        };
    };

    match dataset.search(query, 1).into_iter().next() {
        Some(id) => Ok(id),
        None => bail!("no node matches {query:?}"),
    }
}
