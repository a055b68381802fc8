use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, error};

use crate::config::{Config, ExecutionMode};
use crate::core::{CategoryHint, EndpointRegistry, PlanOptions, QueryPlanner};
use crate::engine::Pipeline;
use crate::reporting::{HtmlArchive, ReportManager, Snapshot, WebhookNotifier};
use crate::utils::{Fetcher, HttpClient};

#[derive(Parser)]
#[command(name = "dorkhunt")]
#[command(version, about = "Search dorking and indicator extraction for a single target")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(long, short, global = true, help = "Path to a configuration file")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dork a target across search engines and collect indicators
    Hunt(HuntArgs),

    /// Print the queries planned for a target without sending them
    Plan {
        #[arg(help = "Email, @domain, username or name")]
        target: String,

        #[command(flatten)]
        plan: PlanArgs,

        #[arg(short, long = "engine", value_delimiter = ',', help = "Engines to count tasks for (default: all)")]
        engines: Vec<String>,
    },

    /// List configured search engines
    Engines,

    /// Initialize the configuration
    Init {
        #[arg(short, long, help = "Force overwrite existing configuration")]
        force: bool,
    },
}

/// Options shaping the query plan
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PlanArgs {
    #[arg(long, help = "Add the extended dork set")]
    pub deep: bool,

    #[arg(long, help = "Locale code used as a country filter (e.g. us, se)")]
    pub locale: Option<String>,

    #[arg(long, help = "Category hint for single-word usernames (male, female)")]
    pub hint: Option<CategoryHint>,
}

impl PlanArgs {
    pub fn to_options(&self) -> PlanOptions {
        PlanOptions {
            deep_mode: self.deep,
            locale: self.locale.clone(),
            category_hint: self.hint,
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct HuntArgs {
    #[arg(help = "Email, @domain, username or name")]
    pub target: String,

    #[command(flatten)]
    pub plan: PlanArgs,

    #[arg(short, long = "engine", value_delimiter = ',', help = "Engines to query (default: all)")]
    pub engines: Vec<String>,

    #[arg(long, help = "Run requests concurrently")]
    pub parallel: bool,

    #[arg(long, help = "Maximum concurrent requests in parallel mode")]
    pub concurrency: Option<usize>,

    #[arg(long, help = "Minimum delay between requests per slot (ms)")]
    pub min_delay_ms: Option<u64>,

    #[arg(long, help = "Maximum delay between requests per slot (ms)")]
    pub max_delay_ms: Option<u64>,

    #[arg(long, help = "Request timeout (seconds)")]
    pub timeout: Option<u64>,

    #[arg(long, help = "Retries for timeouts, transport errors, 429 and 5xx")]
    pub retries: Option<u32>,

    #[arg(long, help = "Identity rotation seed, for reproducible runs")]
    pub seed: Option<u64>,

    #[arg(short, long, help = "Output directory")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Also save each raw response body under the output directory")]
    pub save_html: bool,

    #[arg(long, help = "Webhook URL for the result summary")]
    pub webhook: Option<String>,

    #[arg(long, help = "Do not send the webhook summary")]
    pub no_notify: bool,
}

impl HuntArgs {
    /// Layer command-line flags over the loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) -> Result<()> {
        if self.parallel {
            config.dispatch.mode = ExecutionMode::Parallel;
        }
        if let Some(concurrency) = self.concurrency {
            config.dispatch.max_concurrency = concurrency;
        }
        if let Some(min_delay) = self.min_delay_ms {
            config.dispatch.min_delay_ms = min_delay;
        }
        if let Some(max_delay) = self.max_delay_ms {
            config.dispatch.max_delay_ms = max_delay;
        }
        if let Some(timeout) = self.timeout {
            config.dispatch.timeout_secs = timeout;
        }
        if let Some(retries) = self.retries {
            config.dispatch.max_retries = retries;
        }
        if let Some(output) = &self.output {
            config.global.output_dir = output.clone();
        }
        if self.no_notify {
            config.notify.enabled = false;
        }

        config.validate()?;
        Ok(())
    }
}

pub async fn execute_command(command: &Commands, config: Config) -> Result<()> {
    match command {
        Commands::Hunt(args) => handle_hunt_command(args, config).await,
        Commands::Plan { target, plan, engines } => handle_plan_command(target, plan, engines, &config),
        Commands::Engines => handle_engines_command(&config),
        Commands::Init { force } => handle_init_command(*force, &config),
    }
}

async fn handle_hunt_command(args: &HuntArgs, mut config: Config) -> Result<()> {
    args.apply_overrides(&mut config)?;

    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpClient::new(config.dispatch.timeout())?);
    let mut pipeline = Pipeline::with_seed(&config, fetcher, args.seed)?;
    let manager = ReportManager::new(config.global.output_dir.clone());

    if args.save_html {
        let archive = HtmlArchive::new(manager.report_dir(), &args.target);
        info!("Saving response bodies to {}", archive.dir().display());
        pipeline = pipeline.with_html_archive(archive);
    }

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, waiting for in-flight requests");
                cancel.cancel();
            }
        })
    };

    let options = args.plan.to_options();
    let snapshot = pipeline.run(&args.target, &options, &args.engines, cancel).await;
    interrupt.abort();
    let snapshot = snapshot?;

    print_summary(&snapshot);

    match manager.save(&snapshot).await {
        Ok(paths) => {
            for path in paths {
                println!("Saved {}", path.display());
            }
        }
        Err(e) => error!("Failed to save results: {}", e),
    }

    match WebhookNotifier::from_config(&config.notify, args.webhook.as_deref()) {
        Ok(Some(notifier)) => {
            notifier.send(&snapshot).await;
        }
        Ok(None) => {}
        Err(e) => error!("Webhook not sent: {}", e),
    }

    Ok(())
}

fn handle_plan_command(target: &str, plan: &PlanArgs, engines: &[String], config: &Config) -> Result<()> {
    let planner = QueryPlanner::from_config(config);
    let (target, queries) = planner.plan_str(target, &plan.to_options())?;
    let endpoints = EndpointRegistry::from_config(&config.engines).select(engines);

    println!("{} target: {}", target.kind(), target);
    for (i, query) in queries.iter().enumerate() {
        println!("{:>4}. {}", i + 1, query);
    }
    println!(
        "{} queries x {} engines = {} tasks",
        queries.len(),
        endpoints.len(),
        queries.len() * endpoints.len()
    );

    Ok(())
}

fn handle_engines_command(config: &Config) -> Result<()> {
    let registry = EndpointRegistry::from_config(&config.engines);

    for endpoint in registry.iter() {
        println!("{:<12} {}", endpoint.id, endpoint.url_template);
    }

    Ok(())
}

fn handle_init_command(force: bool, config: &Config) -> Result<()> {
    let path = config.init(force).context("Failed to initialize configuration")?;
    info!("Configuration initialized");
    println!("Configuration written to {}", path.display());
    Ok(())
}

fn print_summary(snapshot: &Snapshot) {
    let run = &snapshot.run;

    println!();
    println!("Target: {} ({})", run.target, run.target_kind);
    println!(
        "Tasks: {} total, {} succeeded, {} failed{}",
        run.tasks_total,
        run.tasks_succeeded,
        run.tasks_failed,
        if run.cancelled { ", cancelled" } else { "" }
    );
    println!("Duration: {}s", run.duration_seconds());
    for (engine, tally) in &run.engines {
        println!("  {:<12} {} ok, {} failed", engine, tally.succeeded, tally.failed);
    }

    if snapshot.is_empty() {
        println!("No results found.");
        return;
    }

    for (category, items) in snapshot.iter() {
        println!("{} [{}]", category.as_str().to_uppercase(), items.len());
        for item in items {
            println!("  {}", item);
        }
    }
    println!("Total: {}", snapshot.total_count());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hunt_flags_parse_and_override() {
        let args = Args::parse_from([
            "dorkhunt", "hunt", "a@b.com", "-e", "google,bing", "--engine", "yandex",
            "--deep", "--hint", "female", "--parallel", "--concurrency", "3",
            "--min-delay-ms", "0", "--max-delay-ms", "0", "--no-notify", "--save-html",
            "--timeout", "0",
        ]);

        let Some(Commands::Hunt(hunt)) = args.command else {
            panic!("expected hunt");
        };
        assert_eq!(hunt.engines, vec!["google", "bing", "yandex"]);
        assert!(hunt.plan.deep);
        assert!(hunt.save_html);
        assert_eq!(hunt.plan.hint, Some(CategoryHint::Female));

        let mut config = Config::builtin().unwrap();
        hunt.apply_overrides(&mut config).unwrap();
        assert_eq!(config.dispatch.mode, ExecutionMode::Parallel);
        assert_eq!(config.dispatch.max_concurrency, 3);
        assert_eq!(config.dispatch.max_delay_ms, 0);
        assert_eq!(config.dispatch.timeout_secs, 1);
        assert!(!config.notify.enabled);
    }

    #[test]
    fn test_bad_hint_is_rejected() {
        assert!(Args::try_parse_from(["dorkhunt", "plan", "bob", "--hint", "other"]).is_err());
    }
}
