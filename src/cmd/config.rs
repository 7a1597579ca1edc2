use std::io::{self, Write};
use std::path::Path;

use clap::{Args, Subcommand};

use crate::config::StoredConfig;
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Fill in the Jira host and token interactively.
    Init,
    /// Show the stored configuration (token masked).
    Show,
}

pub fn run(command: ConfigCommand, explicit: Option<&Path>) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(explicit),
        ConfigCommand::Show => run_show(explicit),
    }
}

fn run_init(explicit: Option<&Path>) -> AppResult<()> {
    let (path, mut cfg) = StoredConfig::load_for_edit(explicit)?;

    println!("Configuring jira-resolver.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!("The token is stored in the local config file; protect your filesystem accordingly.");
    println!();

    ask("Jira host (e.g., https://jira.example.com)", cfg.jira_host.as_deref(), false)?
        .apply_to(&mut cfg.jira_host);
    ask("Jira personal access token", cfg.jira_token.as_deref(), true)?
        .apply_to(&mut cfg.jira_token);

    cfg.save(&path)?;

    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show(explicit: Option<&Path>) -> AppResult<()> {
    let (path, cfg) = StoredConfig::load_for_edit(explicit)?;

    println!("Configuration file: {}", path.display());
    println!("Jira host: {}", or_not_set(cfg.jira_host.as_deref()));
    println!("Jira token: {}", mask_secret(cfg.jira_token.as_deref()));

    Ok(())
}

/// What the user typed in reply to one prompt.
#[derive(Debug, PartialEq, Eq)]
enum Answer {
    Unchanged,
    Cleared,
    Replaced(String),
}

impl Answer {
    fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Self::Unchanged,
            "-" => Self::Cleared,
            value => Self::Replaced(value.to_string()),
        }
    }

    fn apply_to(self, field: &mut Option<String>) {
        match self {
            Self::Unchanged => {}
            Self::Cleared => *field = None,
            Self::Replaced(value) => *field = Some(value),
        }
    }
}

fn ask(label: &str, current: Option<&str>, secret: bool) -> AppResult<Answer> {
    let mut stdout = io::stdout();

    let hint = match current.filter(|value| !value.is_empty()) {
        Some(_) if secret => " [****] (Enter to keep, '-' to clear)".to_string(),
        Some(value) => format!(" [{value}] (Enter to keep, '-' to clear)"),
        None => " (Enter to skip)".to_string(),
    };
    write!(stdout, "{label}{hint}: ")?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(Answer::parse(&line))
}

const NOT_SET: &str = "<not set>";

fn or_not_set(value: Option<&str>) -> &str {
    match value {
        Some(value) if !value.is_empty() => value,
        _ => NOT_SET,
    }
}

fn mask_secret(value: Option<&str>) -> String {
    let chars = value.unwrap_or_default().chars().collect::<Vec<_>>();
    match chars.len() {
        0 => NOT_SET.to_string(),
        1..=6 => "***".to_string(),
        len => {
            let prefix = chars[..3].iter().collect::<String>();
            let suffix = chars[len - 3..].iter().collect::<String>();
            format!("{prefix}***{suffix}")
        }
    }
}
