use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, Response, Url,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize};

use crate::domain::issue::{Issue, Transition};
use crate::error::{AppError, AppResult};
use crate::services::IssueTrackerService;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct JiraClient {
    http: Client,
    base_url: String,
}

impl JiraClient {
    /// Builds a client that sends `token` as a bearer token on every request.
    pub fn new(base_url: &str, token: &str) -> AppResult<Self> {
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(AppError::ClientInit(
                "Jira host not configured".to_string(),
            ));
        }
        Url::parse(base_url)
            .map_err(|err| AppError::ClientInit(format!("invalid Jira host '{base_url}': {err}")))?;
        if token.trim().is_empty() {
            return Err(AppError::ClientInit(
                "Jira token not configured".to_string(),
            ));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|err| AppError::ClientInit(format!("invalid Jira token: {err}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| AppError::ClientInit(err.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    fn issue_endpoint(base_url: &str, issue_id: &str) -> String {
        format!(
            "{}/rest/api/2/issue/{}",
            base_url.trim_end_matches('/'),
            issue_id
        )
    }

    fn transitions_endpoint(base_url: &str, issue_id: &str) -> String {
        format!("{}/transitions", Self::issue_endpoint(base_url, issue_id))
    }

    async fn ensure_success(response: Response) -> Result<Response, String> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read response>".to_string());
        Err(format!("Jira responded with {status}: {body}"))
    }
}

#[async_trait]
impl IssueTrackerService for JiraClient {
    async fn get_issue(&self, issue_id: &str) -> AppResult<Issue> {
        let fetch_error = |message: String| AppError::Fetch {
            issue: issue_id.to_string(),
            message,
        };

        let response = self
            .http
            .get(Self::issue_endpoint(&self.base_url, issue_id))
            .send()
            .await
            .map_err(|err| fetch_error(format!("failed to call Jira: {err}")))?;
        let response = Self::ensure_success(response).await.map_err(fetch_error)?;

        let payload: JiraIssueResponse = response
            .json()
            .await
            .map_err(|err| fetch_error(format!("failed to parse Jira response: {err}")))?;

        Ok(payload.into())
    }

    async fn list_transitions(&self, issue_id: &str) -> AppResult<Vec<Transition>> {
        let list_error = |message: String| AppError::TransitionList {
            issue: issue_id.to_string(),
            message,
        };

        let response = self
            .http
            .get(Self::transitions_endpoint(&self.base_url, issue_id))
            .send()
            .await
            .map_err(|err| list_error(format!("failed to call Jira: {err}")))?;
        let response = Self::ensure_success(response).await.map_err(list_error)?;

        let payload: JiraTransitionsResponse = response
            .json()
            .await
            .map_err(|err| list_error(format!("failed to parse Jira response: {err}")))?;

        Ok(payload.transitions)
    }

    async fn do_transition(&self, issue_id: &str, transition_id: &str) -> AppResult<()> {
        let apply_error = |message: String| AppError::TransitionApply {
            issue: issue_id.to_string(),
            message,
        };

        let response = self
            .http
            .post(Self::transitions_endpoint(&self.base_url, issue_id))
            .json(&JiraDoTransitionRequest::new(transition_id))
            .send()
            .await
            .map_err(|err| apply_error(format!("failed to call Jira: {err}")))?;
        Self::ensure_success(response).await.map_err(apply_error)?;

        Ok(())
    }
}

#[derive(Deserialize)]
struct JiraIssueResponse {
    id: String,
    key: String,
    #[serde(default)]
    fields: JiraIssueFields,
}

#[derive(Deserialize, Default)]
struct JiraIssueFields {
    #[serde(default)]
    summary: Option<String>,
}

impl From<JiraIssueResponse> for Issue {
    fn from(payload: JiraIssueResponse) -> Self {
        Self {
            id: payload.id,
            key: payload.key,
            summary: payload.fields.summary.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct JiraTransitionsResponse {
    #[serde(default)]
    transitions: Vec<Transition>,
}

#[derive(Serialize)]
struct JiraDoTransitionRequest {
    transition: JiraTransitionRef,
}

impl JiraDoTransitionRequest {
    fn new(transition_id: &str) -> Self {
        Self {
            transition: JiraTransitionRef {
                id: transition_id.to_string(),
            },
        }
    }
}

#[derive(Serialize)]
struct JiraTransitionRef {
    id: String,
}
