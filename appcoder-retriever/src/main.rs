use anyhow::Context;
use appcoder_retriever::{
    config::{AppConfig, AppContext},
    partition::Partition,
    status::StatusReport,
    storage::DocumentChunk,
};
use clap::{Parser, Subcommand};
use half::f16;
use serde::Deserialize;
use std::io::BufRead;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Rows written per transaction by `import`.
const IMPORT_BATCH: usize = 500;

/// A CLI tool to query and maintain the appcoder documentation store.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults to ./appcoder.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database file, overriding the configuration
    #[arg(short, long)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the partition tables
    Init,
    /// Import ingestion records (JSON lines) into one partition
    Import {
        /// File with one JSON record per line
        file: PathBuf,
        /// Target platform: web, desktop, server, mobile or a framework name
        #[arg(short, long, value_parser = parse_partition)]
        platform: Partition,
    },
    /// Retrieve documentation for a query
    Search {
        /// Natural language query
        query: String,
        /// Platform to search; all platforms when omitted or unknown
        #[arg(short, long)]
        platform: Option<String>,
    },
    /// List stored documentation pages
    Pages {
        /// Platform to list; all platforms when omitted or unknown
        #[arg(short, long)]
        platform: Option<String>,
    },
    /// Print a whole documentation page
    Page {
        /// Page URL
        url: String,
    },
    /// Show comprehensive status information
    Status {
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum OutputFormat {
    Summary,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputFormat::Summary),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format: {s}")),
        }
    }
}

fn parse_partition(s: &str) -> Result<Partition, String> {
    Partition::parse(s).ok_or_else(|| format!("Unknown platform: {s}"))
}

/// One line of an ingestion export.
#[derive(Debug, Deserialize)]
struct IngestRecord {
    url: String,
    #[serde(alias = "chunk_index")]
    chunk_number: u32,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    content: String,
    #[serde(default)]
    metadata: serde_json::Value,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
}

impl From<IngestRecord> for DocumentChunk {
    fn from(record: IngestRecord) -> Self {
        DocumentChunk {
            url: record.url,
            chunk_index: record.chunk_number,
            title: record.title,
            summary: record.summary,
            content: record.content,
            metadata: record.metadata,
            embedding: record
                .embedding
                .map(|v| v.into_iter().map(f16::from_f32).collect()),
        }
    }
}

/// Parse every record of an ingestion export, failing on the first bad line.
fn read_records<R: BufRead>(reader: R) -> anyhow::Result<Vec<DocumentChunk>> {
    let mut chunks = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: IngestRecord = serde_json::from_str(&line)
            .with_context(|| format!("Invalid record on line {}", n + 1))?;
        chunks.push(DocumentChunk::from(record));
    }
    Ok(chunks)
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(database) = args.database {
        config = config.with_database_path(database);
    }
    let context = AppContext::build(config).await?;
    let engine = &context.engine;

    match args.command {
        Commands::Init => {
            println!(
                "Initialized documentation store at {}",
                context.config.database_path.display()
            );
            for (partition, spec) in engine.partitions().iter() {
                println!("  {partition}: table {} ({})", spec.table, spec.label);
            }
        }
        Commands::Import { file, platform } => {
            let reader = std::io::BufReader::new(
                std::fs::File::open(&file)
                    .with_context(|| format!("Failed to open {}", file.display()))?,
            );

            // nothing is written unless every line parses
            let chunks = read_records(reader)?;
            let mut imported = 0;
            for batch in chunks.chunks(IMPORT_BATCH) {
                let written = context
                    .store
                    .upsert_chunks(platform, batch)
                    .await
                    .with_context(|| {
                        format!(
                            "Import stopped after {imported} of {} chunks were committed",
                            chunks.len()
                        )
                    })?;
                imported += written;
            }

            println!(
                "Imported {imported} chunks into {} ({})",
                engine.partitions().table(platform),
                platform
            );
        }
        Commands::Search { query, platform } => {
            println!(
                "{}",
                engine
                    .retrieve_documentation(&query, platform.as_deref())
                    .await
            );
        }
        Commands::Pages { platform } => {
            let pages = engine.list_documentation_pages(platform.as_deref()).await;
            for page in &pages {
                println!("{page}");
            }
            eprintln!("{} pages", pages.len());
        }
        Commands::Page { url } => {
            println!("{}", engine.get_page_content(&url).await);
        }
        Commands::Status { format } => {
            let report = StatusReport::collect(engine).await;
            match format {
                OutputFormat::Json => println!("{}", report.to_json()?),
                OutputFormat::Summary => print!("{report}"),
            }
        }
    }

    Ok(())
}
