//! folio: administrative tool for folio metadata stores.
//!
//! Loads documents, runs filter requests, lists queryable fields, and
//! migrates documents between the document and relational backends. Store
//! locations come from `FOLIO_*` environment variables (a `.env` file is
//! honored).

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_core::{
    BackendKind, FieldRegistry, FilterConfig, FilterExecutor, FilterResult, MetadataDocument,
    MetadataStore, StoreConfig,
};
use folio_db::{migrate, open_backend, verify_migration, MigrationReport, MigrationVerification};

#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about = "Query and migrate folio metadata stores")]
#[command(propagate_version = true)]
struct Cli {
    /// Backend to use instead of FOLIO_BACKEND
    #[arg(short, long, global = true, value_parser = parse_backend)]
    backend: Option<BackendKind>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List queryable fields with their types and operators
    Fields {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Bulk-load a JSON array of documents into the store
    Load {
        /// JSON file holding an array of documents (`-` for stdin)
        input: PathBuf,
    },

    /// Run a filter request and print the result as JSON
    Query {
        /// JSON file holding a filter request (`-` for stdin)
        input: PathBuf,

        /// Override the request's limit
        #[arg(short, long)]
        limit: Option<i64>,
    },

    /// Copy every document from one backend to the other
    Migrate {
        /// Source backend (document or relational)
        #[arg(long, value_parser = parse_backend)]
        from: BackendKind,

        /// Destination backend (document or relational)
        #[arg(long, value_parser = parse_backend)]
        to: BackendKind,

        /// Compare source and destination after copying
        #[arg(long)]
        verify: bool,
    },
}

fn parse_backend(s: &str) -> Result<BackendKind, String> {
    s.parse().map_err(|e: folio_core::Error| e.to_string())
}

fn init_tracing() {
    // Logging configuration via environment:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   RUST_LOG    - standard env filter (default: "folio=info,folio_db=info,folio_core=info")
    // Logs go to stderr so stdout stays machine-readable.
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "folio=info,folio_db=info,folio_core=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = StoreConfig::from_env().context("loading store configuration")?;
    if let Some(backend) = cli.backend {
        config = config.with_backend(backend);
    }

    match cli.command {
        Commands::Fields { json } => {
            println!("{}", cmd_fields(json)?);
        }
        Commands::Load { input } => {
            let store = open_backend(&config, config.backend).await?;
            let count = cmd_load(store, &input).await?;
            println!("Loaded {} documents into the {} backend", count, config.backend);
        }
        Commands::Query { input, limit } => {
            let store = open_backend(&config, config.backend).await?;
            let result = cmd_query(store, &input, limit).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Migrate { from, to, verify } => {
            let (report, verification) = cmd_migrate(&config, from, to, verify).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if let Some(verification) = verification {
                println!("{}", serde_json::to_string_pretty(&verification)?);
                if !verification.is_complete() {
                    bail!(
                        "verification failed: {} missing, {} differing, {} extra",
                        verification.missing.len(),
                        verification.differing.len(),
                        verification.extra.len()
                    );
                }
            }
        }
    }
    Ok(())
}

fn read_input(input: &Path) -> anyhow::Result<String> {
    if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))
}

fn cmd_fields(json: bool) -> anyhow::Result<String> {
    let registry = FieldRegistry::standard();
    if json {
        let fields: Vec<_> = registry
            .descriptors()
            .map(|d| {
                serde_json::json!({
                    "name": d.name,
                    "type": d.value_type,
                    "operators": d.operators(),
                })
            })
            .collect();
        return Ok(serde_json::to_string_pretty(&fields)?);
    }

    let lines: Vec<String> = registry
        .descriptors()
        .map(|d| {
            let operators: Vec<&str> = d.operators().iter().map(|op| op.as_str()).collect();
            format!(
                "{:<12} {:<7} {}",
                d.name,
                d.value_type.as_str(),
                operators.join(", ")
            )
        })
        .collect();
    Ok(lines.join("\n"))
}

async fn cmd_load(store: Arc<dyn MetadataStore>, input: &Path) -> anyhow::Result<usize> {
    let raw = read_input(input)?;
    let documents: Vec<MetadataDocument> =
        serde_json::from_str(&raw).context("parsing documents")?;
    let count = documents.len();
    store.bulk_set(documents).await?;
    info!(
        subsystem = "cli",
        op = "load",
        backend = %store.kind(),
        document_count = count,
        "Documents loaded"
    );
    Ok(count)
}

async fn cmd_query(
    store: Arc<dyn MetadataStore>,
    input: &Path,
    limit: Option<i64>,
) -> anyhow::Result<FilterResult> {
    let raw = read_input(input)?;
    let mut config: FilterConfig = serde_json::from_str(&raw).context("parsing filter request")?;
    if let Some(limit) = limit {
        config.limit = limit;
    }
    Ok(FilterExecutor::new(store).execute(&config).await?)
}

async fn cmd_migrate(
    config: &StoreConfig,
    from: BackendKind,
    to: BackendKind,
    verify: bool,
) -> anyhow::Result<(MigrationReport, Option<MigrationVerification>)> {
    if from == to {
        bail!("source and destination are both the {} backend", from);
    }
    let source = open_backend(config, from).await?;
    let destination = open_backend(config, to).await?;

    let report = migrate(source.as_ref(), destination.as_ref()).await?;
    let verification = if verify {
        Some(verify_migration(source.as_ref(), destination.as_ref()).await?)
    } else {
        None
    };
    Ok((report, verification))
}
