use anyhow::Result;
use appcoder_mcp::{ServerConfig, run_server};
use clap::{Arg, Command};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // stdout carries the MCP transport, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    // Parse command line arguments
    let matches = Command::new("appcoder-mcp")
        .version(env!("CARGO_PKG_VERSION"))
        .about("AppCoder documentation Model Context Protocol server")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (defaults to ./appcoder.toml when present)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("database")
                .short('d')
                .long("database")
                .value_name("FILE")
                .help("Documentation database, overriding the configuration")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .get_matches();

    let mut config = ServerConfig::new(matches.get_one::<PathBuf>("config").cloned());
    if let Some(database) = matches.get_one::<PathBuf>("database") {
        config = config.with_database(database.clone());
    }

    run_server(config).await
}
