mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
mod workflow;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::resolve::{self, ResolveCommandArgs};
use crate::config::{AppConfig, ConfigLoad, load_or_bootstrap};
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::jira::JiraClient;

const DEFAULT_LOG_FILTER: &str = "jira_resolver=info";

#[derive(Parser)]
#[command(
    name = "jira-resolver",
    author,
    version,
    about = "Resolve every Jira issue linked in a block of alert text",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// Use this config file instead of searching the default locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Alert text with links separated by a literal `\n` sequence.
    #[arg(value_name = "TEXT")]
    text: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(error) = run().await {
        error!("{error}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config(args)) => config_cmd::run(args.command, cli.config.as_deref()),
        None => run_resolve(cli.text.unwrap_or_default(), cli.config.as_deref()).await,
    }
}

async fn run_resolve(content: String, config_path: Option<&Path>) -> AppResult<()> {
    let stored = match load_or_bootstrap(config_path)? {
        ConfigLoad::Loaded { path, config } => {
            debug!(path = %path.display(), "loaded configuration");
            config
        }
        ConfigLoad::Bootstrapped(path) => {
            warn!("configuration file not found, created a default one");
            info!(
                "edit {} to set jira_host and jira_token, then run again",
                path.display()
            );
            return Ok(());
        }
    };
    let config = AppConfig::from(stored);

    let issue_tracker = Arc::new(JiraClient::new(
        &config.jira_base_url,
        &config.jira_token,
    )?);
    let context = AppContext::new(config, issue_tracker);

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let report = resolve::run(&context, ResolveCommandArgs { content }, &cancel).await?;

    println!(
        "{} issue(s) processed: {} resolved, {} without a Resolve transition.",
        report.processed, report.resolved, report.skipped
    );

    Ok(())
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling in-flight requests");
            cancel.cancel();
        }
    });
}
