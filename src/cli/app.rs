use std::path::Path;
use anyhow::Result;
use clap::CommandFactory;
use tracing::{info, debug};

use crate::config::Config;
use crate::error::{DorkHuntResult, DorkHuntError};

use super::commands::{self, Args};

/// The main application struct
#[derive(Default)]
pub struct App {
    config: Option<Config>,
}

impl App {
    /// Create a new application instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from `config_path`, the default location or the
    /// built-in defaults
    pub fn initialize(&mut self, config_path: Option<&Path>) -> DorkHuntResult<()> {
        let config = Config::load(config_path)?;
        debug!("Loaded {} engines, {} templates", config.engines.len(), config.templates.len());
        self.config = Some(config);
        Ok(())
    }

    /// Run the parsed command line
    pub async fn run(&mut self, args: Args) -> Result<()> {
        info!("Starting dorkhunt v{}", env!("CARGO_PKG_VERSION"));

        if self.config.is_none() {
            self.initialize(args.config.as_deref())?;
        }
        let config = self.config()?.clone();

        match &args.command {
            Some(command) => commands::execute_command(command, config).await,
            None => {
                Args::command().print_help()?;
                Ok(())
            }
        }
    }

    pub fn config(&self) -> DorkHuntResult<&Config> {
        self.config
            .as_ref()
            .ok_or_else(|| DorkHuntError::ConfigError("Application not initialized".to_string()))
    }
}
