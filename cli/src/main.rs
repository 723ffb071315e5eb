use anyhow::{bail, Result};
use artsearch_core::catalog::load_catalog;
use artsearch_core::{EngineConfig, ItemId, SearchEngine, SearchOptions, SearchType, Strategy};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeSet;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "artsearch")]
#[command(about = "Search an artwork catalog offline", long_about = None)]
struct Cli {
    /// Catalog file (.json / .jsonl) or directory
    #[arg(long, global = true, default_value = "./catalog")]
    catalog: String,
    /// Engine configuration (JSON)
    #[arg(long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Vector,
    Semantic,
    Fuzzy,
    Image,
    Hybrid,
}

impl From<Mode> for SearchType {
    fn from(m: Mode) -> Self {
        match m {
            Mode::Vector => SearchType::Vector,
            Mode::Semantic => SearchType::Semantic,
            Mode::Fuzzy => SearchType::Fuzzy,
            Mode::Image => SearchType::Image,
            Mode::Hybrid => SearchType::Hybrid,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query and print ranked results
    Search {
        #[arg(long, short)]
        query: String,
        #[arg(long = "type", value_enum, default_value = "hybrid")]
        mode: Mode,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Fail instead of skipping a strategy that errors
        #[arg(long, default_value_t = false)]
        strict: bool,
        /// Add image similarity to hybrid fusion (needs like: or colors: in the query)
        #[arg(long, default_value_t = false)]
        with_image: bool,
    },
    /// List items similar to an existing one
    Similar {
        #[arg(long)]
        item: ItemId,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Print index statistics for the catalog
    Stats,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    let engine = SearchEngine::new(config)?;
    engine.index_corpus(&load_catalog(&cli.catalog)?);

    let output = match cli.command {
        Commands::Search { query, mode, limit, strict, with_image } => {
            let mut options = SearchOptions { strict, ..SearchOptions::of(mode.into(), limit) };
            if with_image {
                options.strategies = BTreeSet::from(Strategy::ALL);
            }
            let outcome = engine.search(query.as_str(), &options)?;
            for w in &outcome.warnings {
                tracing::warn!("{w}");
            }
            serde_json::to_string_pretty(&outcome)?
        }
        Commands::Similar { item, limit } => match engine.similar_to(item, limit) {
            Some(results) => serde_json::to_string_pretty(&results)?,
            None => bail!("item {item} is not in the catalog"),
        },
        Commands::Stats => serde_json::to_string_pretty(&engine.stats())?,
    };
    println!("{output}");
    Ok(())
}
