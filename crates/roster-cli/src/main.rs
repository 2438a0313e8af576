//! CLI entry point for roster.
//!
//! Upserts a handful of Person nodes, then prints every name starting
//! with a prefix to stdout, one per line. Logs go to stderr.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use roster_core::RosterConfig;
use roster_graph::{add_person, print_people, GraphClient, GraphConfig};

#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(about = "Upsert people into a Neo4j graph and list them by name prefix")]
struct Cli {
    /// Name to upsert as a Person node (repeatable).
    #[arg(
        long = "name",
        value_name = "NAME",
        default_values = ["Billy Bob Thornton", "Ada Lovelace", "Alan Turing"]
    )]
    names: Vec<String>,

    /// List people whose name starts with this prefix.
    #[arg(short, long, default_value = "A")]
    prefix: String,

    /// Only write; skip listing.
    #[arg(long)]
    no_read: bool,

    /// Config file prefix (default: roster).
    #[arg(short, long, default_value = "roster")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    // Missing credentials stop the run here, before any connection attempt.
    let config = RosterConfig::load(&cli.config)?;
    tracing::info!(
        user = %config.credentials.user,
        uri = %config.connection.uri,
        "Proceeding with configured user"
    );

    let graph = GraphClient::connect(&GraphConfig::from(&config)).await?;

    for name in &cli.names {
        add_person(&graph, name).await?;
    }

    if !cli.no_read {
        let mut out = std::io::stdout().lock();
        let printed = print_people(&graph, &cli.prefix, &mut out).await?;
        tracing::info!(prefix = %cli.prefix, printed, "Listed people");
    }

    graph.close();
    Ok(())
}
