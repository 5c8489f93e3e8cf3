use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use favicon_resolver::{
    config::Config,
    favicon::{CacheLookup, FaviconResolver},
    notifications::{ErrorReporter, TracingNotifier},
    storage::FileDocumentStore,
};

#[derive(Parser)]
#[command(name = "favicon-resolver")]
#[command(version)]
#[command(about = "Resolve, cache and propagate site favicons")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path [default: $CONFIG_FILE, else config.toml]
    #[arg(short, long)]
    config: Option<String>,

    /// Directory holding the cache and link documents (overrides config file)
    #[arg(short = 'd', long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the favicon for a page URL
    Resolve {
        url: String,
        /// Requested icon size in pixels
        #[arg(short, long)]
        size: Option<u32>,
    },
    /// Resolve favicons for several page URLs
    Batch {
        #[arg(required = true)]
        urls: Vec<String>,
        #[arg(short, long)]
        size: Option<u32>,
    },
    /// Show the cached favicon for a page URL without probing
    Lookup { url: String },
    /// Print cache statistics
    Stats,
    /// Drop every cached favicon
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("favicon_resolver={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_file = Config::config_path(cli.config.as_deref());
    let mut config = Config::load_from_file(&config_file)?;
    info!("Configuration loaded from: {}", config_file);

    if let Some(data_dir) = cli.data_dir {
        config.storage.path = data_dir;
    }
    info!("Using data directory: {}", config.storage.path.display());

    let store = Arc::new(FileDocumentStore::new(config.storage.path.clone()));
    let reporter = Arc::new(ErrorReporter::new(
        Arc::new(TracingNotifier),
        config.notifications.min_interval,
    ));
    let resolver = FaviconResolver::from_config(&config, store, reporter).await?;

    match cli.command {
        Command::Resolve { url, size } => {
            let size = size.unwrap_or(resolver.default_size());
            let icon = resolver.resolve(&url, size).await;
            println!("{}", icon.as_deref().unwrap_or("none"));
        }
        Command::Batch { urls, size } => {
            let size = size.unwrap_or(resolver.default_size());
            for (url, icon) in resolver.resolve_many(urls, size).await {
                println!("{}\t{}", url, icon.as_deref().unwrap_or("none"));
            }
        }
        Command::Lookup { url } => match resolver.lookup(&url) {
            CacheLookup::Hit(Some(icon)) => println!("cached: {icon}"),
            CacheLookup::Hit(None) => println!("cached: none"),
            CacheLookup::Miss => println!("not cached"),
        },
        Command::Stats => {
            let stats = resolver.cache().stats();
            println!("entries:        {}", stats.total_entries);
            println!("fresh icons:    {}", stats.fresh_icons);
            println!("fresh failures: {}", stats.fresh_failures);
            println!("expired:        {}", stats.expired_entries);
        }
        Command::Clear => {
            resolver.clear_cache().await;
            println!("cache cleared");
        }
    }

    Ok(())
}
