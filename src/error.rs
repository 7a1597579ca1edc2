use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("failed to initialise Jira client: {0}")]
    ClientInit(String),
    #[error("failed to fetch issue {issue}: {message}")]
    Fetch { issue: String, message: String },
    #[error("failed to list transitions for {issue}: {message}")]
    TransitionList { issue: String, message: String },
    #[error("failed to transition {issue}: {message}")]
    TransitionApply { issue: String, message: String },
    #[error("processing of {issue} was cancelled")]
    Cancelled { issue: String },
    #[error("resolver task failed: {0}")]
    Task(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
