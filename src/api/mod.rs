//! Collaborator boundary: the time-tracking and issue-tracking services.
//!
//! The interactive session only talks to these traits. HTTP implementations
//! live in [`tempo`] and [`jira`]; tests substitute in-memory fakes.

#![allow(missing_docs)]

#[cfg(feature = "http")]
pub mod jira;
#[cfg(feature = "http")]
pub mod tempo;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::config::Config;
use crate::core::errors::Result;
use crate::tracking::session::{SessionId, TrackingSession};

/// Secrets handed to collaborator constructors.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub tempo_token: String,
    pub jira_username: String,
    pub jira_api_token: String,
}

impl Credentials {
    /// Credentials from a loaded config; fails when any is missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.require_credentials()?;
        Ok(Self {
            tempo_token: config.tempo.token.clone(),
            jira_username: config.jira.username.clone(),
            jira_api_token: config.jira.api_token.clone(),
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("tempo_token", &"<redacted>")
            .field("jira_username", &self.jira_username)
            .field("jira_api_token", &"<redacted>")
            .finish()
    }
}

/// Where and how to reach the services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub tempo_base_url: String,
    pub jira_base_url: String,
    pub timeout: Duration,
}

impl Endpoints {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            tempo_base_url: config.tempo.base_url.clone(),
            jira_base_url: config.jira.base_url.clone(),
            timeout: config.network.request_timeout(),
        }
    }
}

/// One issue suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub id: String,
    pub key: String,
    pub title: String,
}

impl IssueSummary {
    /// `"{key} - {title}"`, as listed under a search field.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} - {}", self.key, self.title)
    }

    #[must_use]
    pub fn issue_ref(&self) -> IssueRef {
        IssueRef {
            id: self.id.clone(),
            key: self.key.clone(),
        }
    }
}

/// Issue identity attached to a tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub id: String,
    pub key: String,
}

/// Fields to change on a tracker. `None` leaves a field untouched;
/// `description: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionPatch {
    pub issue: Option<IssueRef>,
    pub description: Option<Option<String>>,
}

impl SessionPatch {
    #[must_use]
    pub fn issue(issue: IssueRef) -> Self {
        Self {
            issue: Some(issue),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn description(description: Option<String>) -> Self {
        Self {
            description: Some(description),
            ..Self::default()
        }
    }
}

/// Outcome of posting a worklog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorklogReceipt {
    /// The service acknowledged the worklog with a resource link.
    pub confirmed: bool,
}

/// Tempo trackers and worklogs.
pub trait TimeTracker: Send + Sync {
    fn list_sessions(&self) -> Result<Vec<TrackingSession>>;
    fn create_session(&self, issue: Option<&IssueRef>) -> Result<TrackingSession>;
    fn toggle_session(&self, id: &SessionId) -> Result<TrackingSession>;
    fn update_session(&self, id: &SessionId, patch: &SessionPatch) -> Result<TrackingSession>;
    fn delete_session(&self, id: &SessionId) -> Result<()>;
    fn log_time(&self, issue_key: &str, seconds: u64) -> Result<WorklogReceipt>;
}

/// Jira issue search and account lookup.
pub trait IssueTracker: Send + Sync {
    /// Suggestions for `text`, deduplicated by id in server order.
    fn search_issues(&self, text: &str) -> Result<Vec<IssueSummary>>;
    /// Account id of the authenticated user.
    fn myself(&self) -> Result<String>;
}

/// Jira page for `issue_key`.
#[must_use]
pub fn browse_url(jira_base_url: &str, issue_key: &str) -> String {
    format!("{}/browse/{issue_key}", jira_base_url.trim_end_matches('/'))
}

/// Keep the first position of every id while letting later copies win.
#[must_use]
pub fn dedup_issues(issues: impl IntoIterator<Item = IssueSummary>) -> Vec<IssueSummary> {
    let mut out: Vec<IssueSummary> = Vec::new();
    for issue in issues {
        match out.iter_mut().find(|existing| existing.id == issue.id) {
            Some(existing) => *existing = issue,
            None => out.push(issue),
        }
    }
    out
}
