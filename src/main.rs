use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use waygraph::{OpenMode, OsmWayId, Ways};

#[derive(Parser)]
#[command(name = "waygraph")]
#[command(about = "Inspect persistent way-graph stores", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print way, node, component and restriction counts
    Stats {
        /// Store directory
        dir: PathBuf,
    },
    /// Look up a way's conditional access restriction
    Access {
        /// Store directory
        dir: PathBuf,
        /// External way id
        #[arg(long)]
        way: u64,
    },
    /// Verify the routing blob framing and checksum
    Verify {
        /// Store directory
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Stats { dir } => {
            let ways = Ways::open(&dir, OpenMode::Read)
                .with_context(|| format!("opening store at {}", dir.display()))?;
            let r = &ways.routing;
            let components: BTreeSet<_> = r.way_component.iter().flatten().collect();
            let restrictions: usize = r.node_restrictions.values().map(Vec::len).sum();
            let big_streets = r
                .way_properties
                .iter()
                .filter(|p| p.is_big_street)
                .count();
            println!("ways:            {}", ways.n_ways());
            println!("graph nodes:     {}", ways.n_nodes());
            println!("components:      {}", components.len());
            println!("restrictions:    {restrictions}");
            println!("big streets:     {big_streets}");
        }
        Commands::Access { dir, way } => {
            let ways = Ways::open(&dir, OpenMode::Read)
                .with_context(|| format!("opening store at {}", dir.display()))?;
            let way_idx = ways
                .find_way(OsmWayId(way))
                .with_context(|| format!("way {way} not in store"))?;
            match ways.get_access_restriction(way_idx)? {
                Some(s) => println!("{s}"),
                None => println!("no conditional access restriction"),
            }
        }
        Commands::Verify { dir } => {
            // Read-mode open reads the routing blob wholesale and verifies
            // magic, version and CRC.
            Ways::open(&dir, OpenMode::Read)
                .with_context(|| format!("opening store at {}", dir.display()))?;
            println!("✓ routing blob verified");
        }
    }
    Ok(())
}
