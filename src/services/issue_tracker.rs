use async_trait::async_trait;

use crate::domain::issue::{Issue, Transition};
use crate::error::AppResult;

/// Remote tracker operations needed to resolve an issue. Implementations must
/// be safe to share between concurrently running tasks.
#[async_trait]
pub trait IssueTrackerService: Send + Sync {
    /// Reads an issue by key or id. Failures map to `AppError::Fetch`.
    async fn get_issue(&self, issue_id: &str) -> AppResult<Issue>;
    /// Lists transitions currently available on the issue. Failures map to
    /// `AppError::TransitionList`.
    async fn list_transitions(&self, issue_id: &str) -> AppResult<Vec<Transition>>;
    /// Applies a transition. Failures map to `AppError::TransitionApply`.
    async fn do_transition(&self, issue_id: &str, transition_id: &str) -> AppResult<()>;
}
