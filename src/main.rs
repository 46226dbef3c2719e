use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use momo_analytics::comparator::{synthetic_records, LookupComparator};
use momo_analytics::config::AppConfig;
use momo_analytics::db::Database;
use momo_analytics::file_writer;
use momo_analytics::logging::{init_logging, OperationTimer};
use momo_analytics::models::{OutputFormat, TransactionRecord};
use momo_analytics::parser::BatchParser;
use momo_analytics::repository::{SqliteTransactionRepository, TransactionRepository};
use momo_analytics::server::{self, AppState, Credentials};
use momo_analytics::store::TransactionStore;
use momo_analytics::validation::InputValidator;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an SMS export into a records file
    Parse {
        /// Source XML document
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (defaults to the configured records path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (json or csv)
        #[arg(short, long)]
        format: Option<String>,
    },
    /// Parse an SMS export, store it in SQLite and export the dashboard
    Load {
        /// Source XML document
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Database URL (sqlite:path)
        #[arg(short, long)]
        database: Option<String>,

        /// Dashboard JSON output
        #[arg(long)]
        dashboard: Option<PathBuf>,
    },
    /// Export the dashboard JSON from an existing database
    Export {
        /// Database URL (sqlite:path)
        #[arg(short, long)]
        database: Option<String>,

        /// Dashboard JSON output
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of recent transactions to include
        #[arg(short, long)]
        recent: Option<usize>,
    },
    /// Compare linear scan and keyed lookup over a parsed batch
    Benchmark {
        /// Source XML document
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Number of random lookups
        #[arg(short, long)]
        lookups: Option<usize>,

        /// Seed for reproducible runs
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Serve the HTTP API
    Serve {
        /// Source XML document loaded into the in-memory store
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Bind port
        #[arg(short, long)]
        port: Option<u16>,

        /// Disable the analytics routes
        #[arg(long)]
        no_analytics: bool,
    },
    /// Print the effective configuration as YAML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging; the guard must live until exit
    let log_file = config.logging.file_path.as_deref().map(Path::new);
    let _log_guard = init_logging(
        Some(&config.get_log_level()),
        log_file,
        config.logging.format == "json",
    )?;

    info!("Starting momo-analytics");

    // Parse command line arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { input, output, format } => parse_command(&config, input, output, format)?,
        Commands::Load {
            input,
            database,
            dashboard,
        } => load_command(&config, input, database, dashboard).await?,
        Commands::Export {
            database,
            output,
            recent,
        } => export_command(&config, database, output, recent)?,
        Commands::Benchmark { input, lookups, seed } => benchmark_command(&config, input, lookups, seed)?,
        Commands::Serve {
            input,
            host,
            port,
            no_analytics,
        } => serve_command(&config, input, host, port, no_analytics).await?,
        Commands::Config => {
            let yaml = serde_yaml::to_string(&config).context("Failed to render configuration")?;
            std::io::stdout().lock().write_all(yaml.as_bytes())?;
        },
    }

    Ok(())
}

/// Parse the source document and write the records file
fn parse_command(
    config: &AppConfig, input: Option<PathBuf>, output: Option<PathBuf>, format: Option<String>,
) -> Result<()> {
    let timer = OperationTimer::new("parse");
    let input = source_path(config, input)?;

    let format_name = format.unwrap_or_else(|| config.export.default_format.clone());
    let format = OutputFormat::from_str(&format_name).map_err(|e| anyhow::anyhow!(e))?;

    let output = output.unwrap_or_else(|| {
        PathBuf::from(&config.export.records_path).with_extension(format.extension())
    });
    InputValidator::validate_file_path(&output)?;

    let records = BatchParser::from_config(&config.source)?
        .parse_file(&input)
        .with_context(|| format!("Failed to parse {}", input.display()))?;

    file_writer::write_records(&records, format, &output)?;
    info!("Wrote {} records to {}", records.len(), output.display());

    timer.finish();
    Ok(())
}

/// Parse the source document into the database and export the dashboard
async fn load_command(
    config: &AppConfig, input: Option<PathBuf>, database: Option<String>, dashboard: Option<PathBuf>,
) -> Result<()> {
    let timer = OperationTimer::new("load");
    let input = source_path(config, input)?;
    let records = BatchParser::from_config(&config.source)?.load(&input);
    if records.is_empty() {
        warn!("No records parsed from {}", input.display());
    }

    let repository = SqliteTransactionRepository::new(open_database(config, database)?);
    let inserted = repository.save_batch(&records).await?;
    info!("Inserted {} transactions", inserted);

    let dashboard_path = dashboard.unwrap_or_else(|| PathBuf::from(&config.export.dashboard_path));
    InputValidator::validate_file_path(&dashboard_path)?;
    repository
        .database()
        .export_dashboard(&dashboard_path, config.export.recent_limit)?;
    info!("Dashboard written to {}", dashboard_path.display());

    timer.finish();
    Ok(())
}

/// Export the dashboard from an existing database
fn export_command(
    config: &AppConfig, database: Option<String>, output: Option<PathBuf>, recent: Option<usize>,
) -> Result<()> {
    let recent = recent.unwrap_or(config.export.recent_limit);
    InputValidator::validate_limit(recent)?;

    let output = output.unwrap_or_else(|| PathBuf::from(&config.export.dashboard_path));
    InputValidator::validate_file_path(&output)?;

    let db = open_database(config, database)?;
    let dashboard = db.export_dashboard(&output, recent)?;
    info!(
        "Exported dashboard for {} transactions to {}",
        dashboard.kpis.total_count,
        output.display()
    );

    Ok(())
}

/// Run the lookup comparison and print the report
fn benchmark_command(config: &AppConfig, input: Option<PathBuf>, lookups: Option<usize>, seed: Option<u64>) -> Result<()> {
    let lookups = lookups.unwrap_or(config.benchmark.lookups);
    InputValidator::validate_lookups(lookups)?;

    let input = source_path(config, input)?;
    let mut records: Vec<TransactionRecord> = BatchParser::from_config(&config.source)?.load(&input);
    if records.is_empty() {
        warn!(
            "No records parsed from {}, using {} synthetic records",
            input.display(),
            config.benchmark.synthetic_records
        );
        records = synthetic_records(config.benchmark.synthetic_records);
    }

    let comparator = LookupComparator::new(&records);
    let report = match seed {
        Some(seed) => comparator.run(lookups, &mut StdRng::seed_from_u64(seed)),
        None => comparator.run(lookups, &mut rand::thread_rng()),
    };

    let mut out = std::io::stdout().lock();
    writeln!(out, "Records: {}", report.record_count)?;
    writeln!(out, "{report}")?;

    if report.mismatches > 0 {
        return Err(anyhow::anyhow!("{} lookups disagreed between strategies", report.mismatches));
    }

    Ok(())
}

/// Load the source document into the store and serve the HTTP API
async fn serve_command(
    config: &AppConfig, input: Option<PathBuf>, host: Option<String>, port: Option<u16>, no_analytics: bool,
) -> Result<()> {
    let input = source_path(config, input)?;
    let records = BatchParser::from_config(&config.source)?.load(&input);
    info!("Loaded {} transactions from {}", records.len(), input.display());

    let store = TransactionStore::from_records(records).into_shared();
    let (username, password) = config.get_credentials();
    let mut state =
        AppState::new(store, Credentials::new(username.clone(), password)).with_recent_limit(config.export.recent_limit);

    if config.server.enable_analytics && !no_analytics {
        match open_database(config, None) {
            Ok(db) => state = state.with_repository(Arc::new(SqliteTransactionRepository::new(db))),
            Err(e) => warn!("Analytics disabled, database unavailable: {:#}", e),
        }
    }

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr = tokio::net::lookup_host((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to resolve {host}:{port}"))?
        .next()
        .with_context(|| format!("No address found for {host}:{port}"))?;

    info!("Basic auth user: {}", username);
    server::serve(addr, state).await?;
    Ok(())
}

fn source_path(config: &AppConfig, input: Option<PathBuf>) -> Result<PathBuf> {
    let path = input.unwrap_or_else(|| PathBuf::from(config.get_xml_path()));
    InputValidator::validate_file_path(&path)?;
    Ok(path)
}

fn open_database(config: &AppConfig, database: Option<String>) -> Result<Database> {
    let url = database.unwrap_or_else(|| config.get_database_url());
    InputValidator::validate_database_url(&url)?;
    Database::from_config(&url, &config.database).with_context(|| format!("Failed to open database {url}"))
}
