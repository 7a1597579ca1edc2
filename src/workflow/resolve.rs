use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::context::AppContext;
use crate::domain::issue::{Issue, Transition};
use crate::domain::link::{extract_links, issue_id_from_link};
use crate::error::{AppError, AppResult};
use crate::services::IssueTrackerService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    Resolved,
    /// The issue offered no "Resolve" transition and was left unchanged.
    NoResolveTransition,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub resolved: usize,
    pub skipped: usize,
}

/// Fetches the issue behind `link` and resolves it.
pub async fn resolve_link(
    tracker: &dyn IssueTrackerService,
    link: &str,
) -> AppResult<ResolveOutcome> {
    let issue_id = issue_id_from_link(link);
    let issue = tracker.get_issue(issue_id).await?;
    info!(key = %issue.key, summary = %issue.summary, "fetched issue");

    resolve_issue(tracker, &issue).await
}

/// Applies the "Resolve" transition when the issue offers one. A missing
/// transition is not an error.
pub async fn resolve_issue(
    tracker: &dyn IssueTrackerService,
    issue: &Issue,
) -> AppResult<ResolveOutcome> {
    let transitions = tracker.list_transitions(&issue.id).await?;

    let Some(transition) = Transition::find_resolve(&transitions) else {
        info!(key = %issue.key, "no Resolve transition available, leaving issue unchanged");
        return Ok(ResolveOutcome::NoResolveTransition);
    };

    tracker.do_transition(&issue.id, &transition.id).await?;
    info!(key = %issue.key, summary = %issue.summary, "resolved issue");

    Ok(ResolveOutcome::Resolved)
}

/// Resolves every link in `content` that points at the configured Jira host.
///
/// Each link runs in its own task. A failing task does not stop the others;
/// once all have finished the first error to complete is returned. Cancelling
/// `cancel` aborts whatever is still in flight.
pub async fn resolve_batch(
    ctx: &AppContext,
    content: &str,
    cancel: &CancellationToken,
) -> AppResult<BatchReport> {
    let links = extract_links(content, &ctx.config.jira_base_url);
    if links.is_empty() {
        info!("no issue links found");
        return Ok(BatchReport::default());
    }

    info!(count = links.len(), "fetching issues");

    let mut tasks = JoinSet::new();
    for link in links {
        let tracker = Arc::clone(&ctx.issue_tracker);
        let cancel = cancel.clone();
        let link = link.to_string();

        tasks.spawn(async move {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(AppError::Cancelled { issue: link.clone() }),
                result = resolve_link(tracker.as_ref(), &link) => result,
            };
            if let Err(err) = &result {
                error!(%link, "{err}");
            }
            result
        });
    }

    let mut report = BatchReport::default();
    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        report.processed += 1;
        match joined {
            Ok(Ok(ResolveOutcome::Resolved)) => report.resolved += 1,
            Ok(Ok(ResolveOutcome::NoResolveTransition)) => report.skipped += 1,
            Ok(Err(err)) => {
                first_error.get_or_insert(err);
            }
            Err(err) => {
                error!("resolver task failed: {err}");
                first_error.get_or_insert(AppError::Task(err.to_string()));
            }
        }
    }

    if let Some(err) = first_error {
        return Err(err);
    }

    info!(
        processed = report.processed,
        resolved = report.resolved,
        skipped = report.skipped,
        "issues processed"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::config::{AppConfig, StoredConfig};

    const HOST: &str = "https://j.example.com";

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        GetIssue(String),
        ListTransitions(String),
        DoTransition(String, String),
    }

    #[derive(Default)]
    struct FakeTracker {
        issues: HashMap<String, Issue>,
        transitions: HashMap<String, Vec<Transition>>,
        failing_transition_lists: Vec<String>,
        rejected_transitions: Vec<String>,
        stalled_issues: Vec<String>,
        panicking_issues: Vec<String>,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeTracker {
        fn with_issue(mut self, key: &str, id: &str, transitions: &[(&str, &str)]) -> Self {
            self.issues.insert(
                key.to_string(),
                Issue {
                    id: id.to_string(),
                    key: key.to_string(),
                    summary: format!("summary of {key}"),
                },
            );
            self.transitions.insert(
                id.to_string(),
                transitions
                    .iter()
                    .map(|(id, name)| Transition {
                        id: id.to_string(),
                        name: name.to_string(),
                    })
                    .collect(),
            );
            self
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn transition_calls(&self) -> Vec<Call> {
            self.calls()
                .into_iter()
                .filter(|call| matches!(call, Call::DoTransition(..)))
                .collect()
        }
    }

    #[async_trait]
    impl IssueTrackerService for FakeTracker {
        async fn get_issue(&self, issue_id: &str) -> AppResult<Issue> {
            self.record(Call::GetIssue(issue_id.to_string()));
            if self.stalled_issues.iter().any(|id| id == issue_id) {
                std::future::pending::<()>().await;
            }
            if self.panicking_issues.iter().any(|id| id == issue_id) {
                panic!("tracker crashed while reading {issue_id}");
            }
            self.issues
                .get(issue_id)
                .cloned()
                .ok_or_else(|| AppError::Fetch {
                    issue: issue_id.to_string(),
                    message: "Jira responded with 404 Not Found".to_string(),
                })
        }

        async fn list_transitions(&self, issue_id: &str) -> AppResult<Vec<Transition>> {
            self.record(Call::ListTransitions(issue_id.to_string()));
            if self.failing_transition_lists.iter().any(|id| id == issue_id) {
                return Err(AppError::TransitionList {
                    issue: issue_id.to_string(),
                    message: "Jira responded with 500".to_string(),
                });
            }
            Ok(self.transitions.get(issue_id).cloned().unwrap_or_default())
        }

        async fn do_transition(&self, issue_id: &str, transition_id: &str) -> AppResult<()> {
            self.record(Call::DoTransition(
                issue_id.to_string(),
                transition_id.to_string(),
            ));
            if self.rejected_transitions.iter().any(|id| id == issue_id) {
                return Err(AppError::TransitionApply {
                    issue: issue_id.to_string(),
                    message: "Jira responded with 400".to_string(),
                });
            }
            Ok(())
        }
    }

    fn context(tracker: Arc<FakeTracker>) -> AppContext {
        AppContext::new(
            AppConfig {
                jira_base_url: HOST.to_string(),
                jira_token: "token".to_string(),
            },
            tracker,
        )
    }

    #[tokio::test]
    async fn empty_input_is_a_successful_no_op() {
        let tracker = Arc::new(FakeTracker::default());
        let ctx = context(tracker.clone());

        let report = resolve_batch(&ctx, "", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report, BatchReport::default());
        assert!(tracker.calls().is_empty());
    }

    #[tokio::test]
    async fn processes_only_links_for_configured_host() {
        let tracker = Arc::new(
            FakeTracker::default()
                .with_issue("AB-1", "101", &[("31", "Resolve")])
                .with_issue("AB-2", "102", &[("31", "Resolve")]),
        );
        let ctx = context(tracker.clone());
        let content = r"https://j.example.com/browse/AB-1\nhttps://other.com/x\nhttps://j.example.com/browse/AB-2";

        let report = resolve_batch(&ctx, content, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.resolved, 2);
        let mut fetched = tracker
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::GetIssue(id) => Some(id),
                _ => None,
            })
            .collect::<Vec<_>>();
        fetched.sort();
        assert_eq!(fetched, vec!["AB-1", "AB-2"]);
    }

    #[tokio::test]
    async fn missing_resolve_transition_is_not_an_error() {
        let tracker = Arc::new(FakeTracker::default().with_issue(
            "AB-1",
            "101",
            &[("11", "Start Progress"), ("21", "Close")],
        ));
        let ctx = context(tracker.clone());

        let report = resolve_batch(
            &ctx,
            "https://j.example.com/browse/AB-1",
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.resolved, 0);
        assert!(tracker.transition_calls().is_empty());
    }

    #[tokio::test]
    async fn applies_resolve_transition_once_by_id() {
        let tracker = Arc::new(FakeTracker::default().with_issue(
            "AB-1",
            "101",
            &[("11", "Start Progress"), ("31", "Resolve"), ("41", "Close")],
        ));
        let issue = tracker.issues["AB-1"].clone();

        let outcome = resolve_issue(tracker.as_ref(), &issue).await.unwrap();

        assert_eq!(outcome, ResolveOutcome::Resolved);
        assert_eq!(
            tracker.transition_calls(),
            vec![Call::DoTransition("101".to_string(), "31".to_string())]
        );
    }

    #[tokio::test]
    async fn failed_fetch_does_not_stop_other_links() {
        let tracker = Arc::new(FakeTracker::default().with_issue(
            "AB-2",
            "102",
            &[("31", "Resolve")],
        ));
        let ctx = context(tracker.clone());
        let content = r"https://j.example.com/browse/AB-1\nhttps://j.example.com/browse/AB-2";

        let result = resolve_batch(&ctx, content, &CancellationToken::new()).await;

        assert!(matches!(result, Err(AppError::Fetch { ref issue, .. }) if issue == "AB-1"));
        assert!(tracker.calls().contains(&Call::GetIssue("AB-1".to_string())));
        assert_eq!(
            tracker.transition_calls(),
            vec![Call::DoTransition("102".to_string(), "31".to_string())]
        );
    }

    #[tokio::test]
    async fn transition_list_failure_is_reported() {
        let mut tracker =
            FakeTracker::default().with_issue("AB-1", "101", &[("31", "Resolve")]);
        tracker.failing_transition_lists.push("101".to_string());
        let tracker = Arc::new(tracker);
        let ctx = context(tracker.clone());

        let result = resolve_batch(
            &ctx,
            "https://j.example.com/browse/AB-1",
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(AppError::TransitionList { .. })));
        assert!(
            tracker
                .calls()
                .contains(&Call::ListTransitions("101".to_string()))
        );
        assert!(tracker.transition_calls().is_empty());
    }

    #[tokio::test]
    async fn rejected_transition_is_reported() {
        let mut tracker =
            FakeTracker::default().with_issue("AB-1", "101", &[("31", "Resolve")]);
        tracker.rejected_transitions.push("101".to_string());
        let tracker = Arc::new(tracker);
        let ctx = context(tracker.clone());

        let result = resolve_batch(
            &ctx,
            "https://j.example.com/browse/AB-1",
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(AppError::TransitionApply { .. })));
    }

    #[tokio::test]
    async fn cancelled_batch_skips_remote_calls() {
        let tracker = Arc::new(FakeTracker::default().with_issue(
            "AB-1",
            "101",
            &[("31", "Resolve")],
        ));
        let ctx = context(tracker.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = resolve_batch(&ctx, "https://j.example.com/browse/AB-1", &cancel).await;

        assert!(matches!(result, Err(AppError::Cancelled { .. })));
        assert!(tracker.calls().is_empty());
    }

    #[tokio::test]
    async fn cancelling_aborts_requests_in_flight() {
        let mut tracker = FakeTracker::default();
        tracker.stalled_issues.push("AB-1".to_string());
        let tracker = Arc::new(tracker);
        let ctx = context(tracker.clone());
        let cancel = CancellationToken::new();

        let cancel_once_started = async {
            while tracker.calls().is_empty() {
                tokio::task::yield_now().await;
            }
            cancel.cancel();
        };
        let (result, ()) = tokio::join!(
            resolve_batch(&ctx, "https://j.example.com/browse/AB-1", &cancel),
            cancel_once_started
        );

        assert!(matches!(
            result,
            Err(AppError::Cancelled { ref issue }) if issue == "https://j.example.com/browse/AB-1"
        ));
        assert_eq!(tracker.calls(), vec![Call::GetIssue("AB-1".to_string())]);
    }

    #[tokio::test]
    async fn panicking_task_is_reported_without_stopping_siblings() {
        let mut tracker =
            FakeTracker::default().with_issue("AB-2", "102", &[("31", "Resolve")]);
        tracker.panicking_issues.push("AB-1".to_string());
        let tracker = Arc::new(tracker);
        let ctx = context(tracker.clone());
        let content = r"https://j.example.com/browse/AB-1\nhttps://j.example.com/browse/AB-2";

        let result = resolve_batch(&ctx, content, &CancellationToken::new()).await;

        assert!(matches!(result, Err(AppError::Task(_))));
        assert_eq!(
            tracker.transition_calls(),
            vec![Call::DoTransition("102".to_string(), "31".to_string())]
        );
    }

    #[tokio::test]
    async fn padded_host_in_config_still_matches_links() {
        let tracker = Arc::new(FakeTracker::default().with_issue(
            "AB-1",
            "101",
            &[("31", "Resolve")],
        ));
        let config = AppConfig::from(StoredConfig {
            jira_host: Some("https://j.example.com \t".to_string()),
            jira_token: Some("token".to_string()),
        });
        let ctx = AppContext::new(config, tracker.clone());

        let report = resolve_batch(
            &ctx,
            "https://j.example.com/browse/AB-1",
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.resolved, 1);
    }
}
