use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use api_dataset_prep::config::{DEFAULT_DATASETS_DIR, DEFAULT_MARKER, DEFAULT_MAX_SNIPPET_SIZE};
use api_dataset_prep::models::{ApiCollection, ApiItem, ParsedCollection};
use api_dataset_prep::parser::{PostmanParser, collection_variables, load_collection};
use api_dataset_prep::render::{ApiDetailRender, SimpleApiRender};
use api_dataset_prep::snippet::store::write_json;
use api_dataset_prep::snippet::{
    KotlinParser, run_analysis, run_arrow_export, run_sqlite_export, run_type_resolution,
};
use api_dataset_prep::DatasetConfig;

#[derive(Parser)]
#[command(name = "api-dataset-prep")]
#[command(about = "Prepare API documentation and source snippet datasets")]
struct Cli {
    /// Root directory of the snippet datasets
    #[arg(long, global = true, env = "PREP_DATASETS", default_value = DEFAULT_DATASETS_DIR)]
    datasets: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a Postman collection into API collections (JSON)
    Parse {
        collection: PathBuf,
        /// Postman environment file used to resolve {{variables}}
        #[arg(short, long)]
        env: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render a Postman collection as one line per operation
    Render {
        collection: PathBuf,
        #[arg(short, long)]
        env: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Filter raw dumps by annotated methods and split them into snippets
    Analysis {
        #[arg(long, default_value = DEFAULT_MARKER)]
        marker: String,
        #[arg(long, default_value_t = DEFAULT_MAX_SNIPPET_SIZE)]
        max_size: usize,
    },
    /// Resolve the types required by the split snippets
    Type,
    /// Export the raw dumps into a SQLite database
    Sqlite,
    /// Export the raw dumps into an Arrow IPC (Feather) file
    Arrow,
}

fn normalize(collection: &Path, env: Option<&Path>) -> Result<Vec<ApiCollection>> {
    let source = load_collection(collection)
        .with_context(|| format!("Failed to load collection {}", collection.display()))?;
    let variables = collection_variables(&source, env).context("Failed to load variables")?;
    Ok(PostmanParser::new(variables).parse(&source))
}

/// `RUST_LOG` directives when given and valid, `info` otherwise.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

fn main() -> Result<()> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .init();

    let cli = Cli::parse();
    let config = DatasetConfig::new(&cli.datasets);

    match cli.command {
        Commands::Parse { collection, env, output } => {
            let parsed = ParsedCollection {
                source: collection.display().to_string(),
                collections: normalize(&collection, env.as_deref())?,
                parsed_at: chrono::Utc::now(),
            };

            let output_path = output.unwrap_or_else(|| config.api_output_file(&collection));
            write_json(&output_path, &parsed)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            info!(
                "Parsed {} collections ({} items) into {}",
                parsed.collections.len(),
                parsed.items().count(),
                output_path.display()
            );
        }
        Commands::Render { collection, env, output } => {
            let collections = normalize(&collection, env.as_deref())?;
            let items: Vec<ApiItem> = collections.into_iter().flat_map(|c| c.items).collect();
            let text = SimpleApiRender.render_collection(&items);

            match output {
                Some(path) => {
                    write_text(&path, &text)?;
                    info!("Rendered {} items into {}", items.len(), path.display());
                }
                None => println!("{text}"),
            }
        }
        Commands::Analysis { marker, max_size } => {
            let config = config.with_marker(marker).with_max_snippet_size(max_size);
            let summary = run_analysis(&config, &KotlinParser).context("Analysis failed")?;
            info!("{} filtered dumps, {} snippets", summary.filtered, summary.snippets);
        }
        Commands::Type => {
            run_type_resolution(&config).context("Type resolution failed")?;
        }
        Commands::Sqlite => {
            let rows = run_sqlite_export(&config).context("SQLite export failed")?;
            info!("Exported {} rows", rows);
        }
        Commands::Arrow => {
            let rows = run_arrow_export(&config).context("Arrow export failed")?;
            info!("Exported {} rows to {}", rows, config.arrow_file().display());
        }
    }

    Ok(())
}
