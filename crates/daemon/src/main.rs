use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use stash_core::logging::{self, LoggingConfig};
use stash_core::{Config, StoreConfig};
use stash_store::{MemoryServer, api};
use std::path::PathBuf;

/// stashd - host process for the stash content memory store
#[derive(Parser, Debug)]
#[command(name = "stashd")]
#[command(about = "Runs the content memory store and its expiration sweep", long_about = None)]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to stash.toml (default: ./stash.toml, defaults when absent)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the store and sweep expired items until Ctrl-C
    Serve,
    /// Run a single expiration sweep and exit
    Sweep,
    /// Show configuration and store statistics
    Status {
        /// Limit statistics to one client
        #[arg(long, value_name = "CLIENT_ID")]
        client: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(|| PathBuf::from("stash.toml"));
    let config = Config::load(Some(&config_path)).context("Failed to load config")?;

    let mut logging_config = LoggingConfig::from(config.logging.clone());
    if cli.verbose {
        logging_config = logging_config.with_level("debug");
    }
    let _log_guard = logging::init_logging(Some(logging_config)).context("Failed to initialize logging")?;

    if cli.verbose {
        println!("{} Using config: {}", "Info:".blue().bold(), config_path.display());
        println!("{} Database: {}", "Info:".blue().bold(), config.store.db_path().display());
    }

    match cli.command {
        Commands::Serve => cmd_serve(&config.store).await,
        Commands::Sweep => cmd_sweep(&config.store).await,
        Commands::Status { client } => cmd_status(&config.store, client.as_deref()).await,
    }
}

/// Keep the store open with its sweeper until interrupted
async fn cmd_serve(store: &StoreConfig) -> Result<()> {
    let server = MemoryServer::start(store).await.context("Failed to start memory store")?;
    println!(
        "{} Serving {} (sweep every {}s)",
        "Info:".blue().bold(),
        store.db_path().display().cyan(),
        store.sweep_interval_secs
    );

    tokio::signal::ctrl_c().await.context("Failed to listen for shutdown signal")?;

    tracing::info!("Shutdown requested");
    server.shutdown().await;
    println!("{} Sweeper stopped", "Success:".green().bold());
    Ok(())
}

/// One-shot expiration sweep
async fn cmd_sweep(store: &StoreConfig) -> Result<()> {
    let server = MemoryServer::open_without_sweeper(&store.db_path(), store)
        .await
        .context("Failed to open memory store")?;
    let removed = server.sweep_now().await;
    println!("{} Removed {} expired items", "Success:".green().bold(), removed);
    Ok(())
}

/// Print configuration and aggregate statistics
async fn cmd_status(store: &StoreConfig, client: Option<&str>) -> Result<()> {
    let server = MemoryServer::open_without_sweeper(&store.db_path(), store)
        .await
        .context("Failed to open memory store")?;
    let stats = api::get_memory_stats(&server, client).await;

    println!("{}", "Stash Status".green().bold().underline());
    println!();
    println!("  Database: {}", store.db_path().display().cyan());
    println!("  Sweep interval: {}s", store.sweep_interval_secs);
    if let Some(client) = client {
        println!("  Client: {}", client.cyan());
    }

    if let Some(error) = stats.error {
        anyhow::bail!("Failed to read statistics: {}", error);
    }

    println!("  Items: {}", stats.total_items.to_string().cyan());
    println!("  Size: {} bytes ({} MB)", stats.total_size_bytes, stats.total_size_mb);

    let mut types: Vec<_> = stats.type_counts.into_iter().collect();
    types.sort();
    for (content_type, count) in types {
        println!("    - {}: {}", content_type.cyan(), count);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use stash_store::NewContent;
    use tempfile::TempDir;

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["stashd", "serve"]).unwrap();
        assert!(cli.config.is_none());
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Serve));
    }

    #[test]
    fn test_cli_with_config() {
        let cli = Cli::try_parse_from(["stashd", "--config", "/etc/stash.toml", "sweep"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/stash.toml")));
        assert!(matches!(cli.command, Commands::Sweep));
    }

    #[test]
    fn test_cli_status_with_client() {
        let cli = Cli::try_parse_from(["stashd", "status", "--client", "acme"]).unwrap();
        if let Commands::Status { client } = cli.command {
            assert_eq!(client.as_deref(), Some("acme"));
        } else {
            panic!("Expected Status command");
        }
    }

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["stashd"]).is_err());
    }

    #[tokio::test]
    async fn test_cmd_sweep_removes_expired() {
        let temp = TempDir::new().unwrap();
        let store = StoreConfig::default().with_data_dir(temp.path());

        let server = MemoryServer::open_without_sweeper(&store.db_path(), &store).await.unwrap();
        api::store_content(&server, NewContent::new("plan", "Old", "body").with_ttl_days(-1))
            .await
            .unwrap();
        drop(server);

        cmd_sweep(&store).await.unwrap();

        let server = MemoryServer::open_without_sweeper(&store.db_path(), &store).await.unwrap();
        assert_eq!(server.database().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cmd_status_on_fresh_store() {
        let temp = TempDir::new().unwrap();
        let store = StoreConfig::default().with_data_dir(temp.path().join("fresh"));
        assert!(cmd_status(&store, None).await.is_ok());
        assert!(store.db_path().exists());
    }
}
