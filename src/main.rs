use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quarry::{
    Config, ConfigIndexResolver, HttpClient, IndexOrchestrator, IndexResolver, SearchClient,
    SearchContext,
};
use serde_json::json;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::prelude::*;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Args {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the index each declared type resolves to
    Indices {},
    /// Drop and recreate the indices of the declared types
    Index {
        /// Only delete the existing indices
        #[arg(long)]
        drop_only: bool,
    },
    /// Run a raw search against a type's index
    Search {
        /// Searchable type name
        #[arg(long = "type")]
        type_name: String,
        /// Request body as JSON (defaults to match_all)
        body: Option<String>,
    },
}

fn load_config(path: &str) -> Result<Config> {
    Config::load(path).with_context(|| format!("Failed to load config: '{path}'"))
}

/// Declared types with their resolved index, in declaration order.
fn resolve_declared(config: &Config) -> Result<Vec<(String, String)>> {
    let resolver = ConfigIndexResolver::from_config(config);
    config
        .types
        .iter()
        .map(|type_name| {
            let index = resolver.resolve_index_for_type(type_name, None)?;
            Ok((type_name.clone(), index))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    // let trace max level configurable (default to info)
    let trace_max_level = std::env::var("TRACE_MAX_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .parse()
        .unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(trace_max_level)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive("quarry=info".parse::<Directive>()?)
                .from_env_lossy(),
        )
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish()
        .init();

    // Load the configuration file.
    let config_path = std::env::var("QUARRY_CONFIG").unwrap_or_else(|_| "quarry.toml".to_string());
    let config = load_config(&config_path)?;
    tracing::debug!("Loaded config: {:?}", config);

    let client = HttpClient::from_config(&config).context("Failed to build HTTP client")?;

    // Parse the command line arguments.
    let args = Args::parse();
    match args.command {
        Commands::Indices {} => {
            for (type_name, index) in resolve_declared(&config)? {
                let exists = client.index_exists(&index).await?;
                println!("{type_name}\t{index}\t{}", if exists { "present" } else { "missing" });
            }
        }
        Commands::Index { drop_only } => {
            let declared = config.types.clone();
            let orchestrator = IndexOrchestrator::new(SearchContext::from_config(config)?);
            let definitions = orchestrator.declared_definitions(&declared)?;
            let (deleted, created) = orchestrator.rebuild(&definitions, drop_only).await?;
            tracing::info!("{} deleted, {} created", deleted, created);
        }
        Commands::Search { type_name, body } => {
            let resolver = ConfigIndexResolver::from_config(&config);
            let index = resolver.resolve_index_for_type(&type_name, None)?;
            let body: serde_json::Value = match body {
                Some(raw) => serde_json::from_str(&raw).context("Request body is not valid JSON")?,
                None => json!({"query": {"match_all": {}}}),
            };

            let params = json!({"index": index, "type": type_name, "body": body});
            let result = client.search(&params).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
