// src/main.rs
use std::process::exit;
use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use dorkhunt::cli::{App, Args};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --verbose
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let mut app = App::new();

    if let Err(e) = app.initialize(args.config.as_deref()) {
        error!("Failed to initialize application: {}", e);
        exit(1);
    }

    if let Err(e) = app.run(args).await {
        error!("Command execution failed: {:#}", e);
        exit(1);
    }

    Ok(())
}
