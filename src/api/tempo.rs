//! Tempo REST client for trackers and worklogs.

#![allow(missing_docs)]

use std::sync::Arc;

use chrono::Local;
use parking_lot::Mutex;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{Credentials, Endpoints, IssueRef, IssueTracker, SessionPatch, TimeTracker, WorklogReceipt};
use crate::core::errors::{Result, TempoError};
use crate::tracking::session::{SessionId, TrackingSession};

const SERVICE: &str = "tempo";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBody<'a> {
    is_playing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    issue_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    issue_key: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    issue_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    issue_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<Option<&'a str>>,
}

impl<'a> From<&'a SessionPatch> for UpdateBody<'a> {
    fn from(patch: &'a SessionPatch) -> Self {
        Self {
            issue_id: patch.issue.as_ref().map(|issue| issue.id.as_str()),
            issue_key: patch.issue.as_ref().map(|issue| issue.key.as_str()),
            description: patch.description.as_ref().map(Option::as_deref),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WorklogBody<'a> {
    author_account_id: &'a str,
    start_date: String,
    issue_key: &'a str,
    time_spent_seconds: u64,
}

/// Blocking Tempo client. Worklogs need the Jira account id, so the client
/// holds the issue tracker and caches the id after the first lookup.
pub struct TempoClient {
    client: Client,
    base_url: String,
    token: String,
    accounts: Arc<dyn IssueTracker>,
    account_id: Mutex<Option<String>>,
}

impl TempoClient {
    pub fn new(
        credentials: &Credentials,
        endpoints: &Endpoints,
        accounts: Arc<dyn IssueTracker>,
    ) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        let client = Client::builder()
            .timeout(endpoints.timeout)
            .default_headers(headers)
            .build()
            .map_err(|error| TempoError::Http {
                service: SERVICE,
                details: format!("failed to build HTTP client: {error}"),
            })?;

        Ok(Self {
            client,
            base_url: endpoints.tempo_base_url.trim_end_matches('/').to_string(),
            token: credentials.tempo_token.clone(),
            accounts,
            account_id: Mutex::new(None),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token)
    }

    fn send(&self, request: RequestBuilder) -> Result<String> {
        let response = self
            .authorized(request)
            .send()
            .map_err(|error| TempoError::Http {
                service: SERVICE,
                details: error.to_string(),
            })?;
        let status = response.status();
        let body = response.text().map_err(|error| TempoError::Http {
            service: SERVICE,
            details: format!("response read failed: {error}"),
        })?;
        check_status(status, body)
    }

    fn request_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let body = self.send(request)?;
        serde_json::from_str(&body).map_err(|error| TempoError::Serialization {
            context: SERVICE,
            details: format!("malformed response: {error}"),
        })
    }

    fn account_id(&self) -> Result<String> {
        let mut cached = self.account_id.lock();
        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }
        let id = self.accounts.myself()?;
        *cached = Some(id.clone());
        Ok(id)
    }
}

pub(super) fn check_status(status: StatusCode, body: String) -> Result<String> {
    check_service_status(SERVICE, status, body)
}

/// Map a non-2xx status to an error, keeping the body for diagnostics.
pub(super) fn check_service_status(
    service: &'static str,
    status: StatusCode,
    body: String,
) -> Result<String> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(TempoError::Unauthorized { service });
    }
    if !status.is_success() {
        return Err(TempoError::HttpStatus {
            service,
            status: status.as_u16(),
            details: body.chars().take(200).collect(),
        });
    }
    Ok(body)
}

impl TimeTracker for TempoClient {
    fn list_sessions(&self) -> Result<Vec<TrackingSession>> {
        self.request_json(self.client.get(self.endpoint("/trackers/v1/")))
    }

    fn create_session(&self, issue: Option<&IssueRef>) -> Result<TrackingSession> {
        let body = CreateBody {
            is_playing: true,
            issue_id: issue.map(|issue| issue.id.as_str()),
            issue_key: issue.map(|issue| issue.key.as_str()),
        };
        self.request_json(self.client.post(self.endpoint("/trackers/v1/")).json(&body))
    }

    fn toggle_session(&self, id: &SessionId) -> Result<TrackingSession> {
        let path = format!("/trackers/v1/{id}/toggle");
        self.request_json(self.client.patch(self.endpoint(&path)))
    }

    fn update_session(&self, id: &SessionId, patch: &SessionPatch) -> Result<TrackingSession> {
        let path = format!("/trackers/v1/{id}");
        let body = UpdateBody::from(patch);
        self.request_json(self.client.put(self.endpoint(&path)).json(&body))
    }

    fn delete_session(&self, id: &SessionId) -> Result<()> {
        let path = format!("/trackers/v1/{id}");
        self.send(self.client.delete(self.endpoint(&path)))?;
        Ok(())
    }

    fn log_time(&self, issue_key: &str, seconds: u64) -> Result<WorklogReceipt> {
        let author = self.account_id()?;
        let body = WorklogBody {
            author_account_id: &author,
            start_date: Local::now().format("%Y-%m-%d").to_string(),
            issue_key,
            time_spent_seconds: seconds,
        };
        let reply: Value = self.request_json(
            self.client
                .post(self.endpoint("/core/3/worklogs"))
                .json(&body),
        )?;
        Ok(receipt_from(&reply))
    }
}

/// Tempo answers a stored worklog with its own `self` link.
fn receipt_from(reply: &Value) -> WorklogReceipt {
    WorklogReceipt {
        confirmed: reply
            .get("self")
            .and_then(Value::as_str)
            .is_some_and(|link| !link.is_empty()),
    }
}
