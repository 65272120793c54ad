//! Stockroom server binary.
//!
//! Binds the inventory service to the given address and keeps item photos
//! under the given cache directory.

use clap::Parser;
use std::path::PathBuf;
use stockroom::{AppState, Application, ItemStore};
use stockroom_storage::PhotoStore;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Inventory-tracking HTTP service
#[derive(Parser)]
#[command(name = "stockroom")]
#[command(version)]
#[command(about = "Inventory-tracking HTTP service with photo attachments")]
struct Cli {
    /// Address to bind the server to
    #[arg(short = 'H', long)]
    host: String,

    /// Port to listen on
    #[arg(short, long)]
    port: u16,

    /// Directory for photo attachment files (created if missing)
    #[arg(short, long)]
    cache: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let photos = match PhotoStore::new(&cli.cache).await {
        Ok(photos) => photos,
        Err(e) => {
            error!(error = %e, "Failed to open photo cache");
            std::process::exit(1);
        }
    };

    let state = AppState::new(ItemStore::new(), photos);

    if let Err(e) = Application::new(state).listen(&cli.host, cli.port).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
