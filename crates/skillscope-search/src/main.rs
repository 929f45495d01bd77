//! SkillScope command-line interface

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use skillscope_core::{Competency, FilterSpec, SearchMode, SearchRequest};
use skillscope_config::{ConfigLoader, ConfigOverrides};
use skillscope_search::AppContext;

#[derive(Parser)]
#[command(name = "skillscope", version, about = "Hybrid competency retrieval engine")]
struct Cli {
    /// Qdrant server URL
    #[arg(long, global = true, env = "SKILLSCOPE_QDRANT_URL")]
    qdrant_url: Option<String>,

    /// Collection name
    #[arg(long, global = true, env = "SKILLSCOPE_COLLECTION")]
    collection: Option<String>,

    /// Embedding server URL
    #[arg(long, global = true, env = "SKILLSCOPE_ENCODING_URL")]
    encoding_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "SKILLSCOPE_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the collection and payload indexes if absent
    Init,

    /// Index competencies from a JSON file
    Index {
        /// File holding one competency object or an array of them
        file: PathBuf,

        /// Reuse an existing identifier instead of minting one
        /// (single-record files only)
        #[arg(long)]
        id: Option<Uuid>,
    },

    /// Fetch one indexed competency by identifier
    Get {
        id: Uuid,
    },

    /// Delete one indexed competency by identifier
    Delete {
        id: Uuid,
    },

    /// Search the index
    Search {
        /// Query text
        text: String,

        /// Retrieval mode: semantic, sparse or hybrid
        #[arg(long, default_value = "semantic")]
        mode: String,

        /// Maximum number of results
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Filter clause as JSON
        /// (e.g. '{"field":"lang","operator":"eq","value":"en"}'), repeatable
        #[arg(long = "filter")]
        filters: Vec<String>,
    },
}

fn parse_mode(mode: &str) -> anyhow::Result<SearchMode> {
    match mode {
        "semantic" => Ok(SearchMode::Semantic),
        "sparse" => Ok(SearchMode::Sparse),
        "hybrid" => Ok(SearchMode::Hybrid),
        other => bail!("unknown search mode '{other}' (expected semantic, sparse or hybrid)"),
    }
}

fn read_competencies(file: &PathBuf) -> anyhow::Result<Vec<Competency>> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let value: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    let competencies = match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Competency>, _>>()?,
        object => vec![serde_json::from_value(object)?],
    };
    Ok(competencies)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        qdrant_url: cli.qdrant_url.clone(),
        collection: cli.collection.clone(),
        encoding_url: cli.encoding_url.clone(),
        log_level: cli.log_level.clone(),
    };

    let working_dir = std::env::current_dir().context("cannot resolve working directory")?;
    let config = ConfigLoader::new().load(&working_dir, Some(&overrides))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .with_writer(std::io::stderr)
        .init();

    let context = AppContext::connect(config).await?;

    match cli.command {
        Commands::Init => {
            context.init_store().await?;
            println!("collection ready");
        }

        Commands::Index { file, id } => {
            let competencies = read_competencies(&file)?;
            if id.is_some() && competencies.len() > 1 {
                bail!("--id can only be used with a single-record file");
            }

            for competency in competencies {
                let entity = context.index.index(competency, id).await?;
                println!("{}", serde_json::to_string_pretty(&entity)?);
            }
        }

        Commands::Get { id } => {
            let entity = context.index.get(id).await?;
            println!("{}", serde_json::to_string_pretty(&entity)?);
        }

        Commands::Delete { id } => {
            context.index.delete(id).await?;
            println!("deleted {id}");
        }

        Commands::Search {
            text,
            mode,
            top,
            filters,
        } => {
            let filters = filters
                .iter()
                .map(|raw| serde_json::from_str::<FilterSpec>(raw))
                .collect::<Result<Vec<_>, _>>()
                .context("invalid --filter clause")?;

            let request = SearchRequest::new(text, parse_mode(&mode)?)
                .with_top(top)
                .with_filters(filters);

            let results = context.search.search(&request).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}
