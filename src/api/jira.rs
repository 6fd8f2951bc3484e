//! Jira REST client: issue picker search and the current account.

#![allow(missing_docs)]

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header;
use serde::Deserialize;

use super::tempo::check_service_status;
use super::{Credentials, Endpoints, IssueSummary, IssueTracker, dedup_issues};
use crate::core::errors::{Result, TempoError};

const SERVICE: &str = "jira";
const PICKER_JQL: &str = r#"project in projectsWhereUserHasPermission("Work on issues")"#;

#[derive(Debug, Deserialize)]
struct PickerResponse {
    #[serde(default)]
    sections: Vec<PickerSection>,
}

#[derive(Debug, Deserialize)]
struct PickerSection {
    #[serde(default)]
    issues: Vec<PickerIssue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PickerIssue {
    id: serde_json::Value,
    key: String,
    #[serde(default)]
    summary_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Account {
    account_id: String,
}

/// Blocking Jira client authenticated with username and API token.
pub struct JiraClient {
    client: Client,
    base_url: String,
    username: String,
    api_token: String,
}

impl JiraClient {
    pub fn new(credentials: &Credentials, endpoints: &Endpoints) -> Result<Self> {
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
            base_url: endpoints.jira_base_url.trim_end_matches('/').to_string(),
            username: credentials.jira_username.clone(),
            api_token: credentials.jira_api_token.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request_json<T: serde::de::DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .basic_auth(&self.username, Some(&self.api_token))
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
        let body = check_service_status(SERVICE, status, body)?;
        serde_json::from_str(&body).map_err(|error| TempoError::Serialization {
            context: SERVICE,
            details: format!("malformed response: {error}"),
        })
    }
}

fn issues_from(response: PickerResponse) -> Vec<IssueSummary> {
    dedup_issues(
        response
            .sections
            .into_iter()
            .flat_map(|section| section.issues)
            .map(|issue| IssueSummary {
                id: match issue.id {
                    serde_json::Value::String(id) => id,
                    other => other.to_string(),
                },
                key: issue.key,
                title: issue.summary_text,
            }),
    )
}

impl IssueTracker for JiraClient {
    fn search_issues(&self, text: &str) -> Result<Vec<IssueSummary>> {
        let request = self
            .client
            .get(self.endpoint("/rest/api/2/issue/picker"))
            .query(&[
                ("currentJQL", PICKER_JQL),
                ("showSubTasks", "true"),
                ("showSubTaskParent", "true"),
                ("query", text),
            ]);
        let response: PickerResponse = self.request_json(request)?;
        Ok(issues_from(response))
    }

    fn myself(&self) -> Result<String> {
        let account: Account = self.request_json(self.client.get(self.endpoint("/rest/api/3/myself")))?;
        Ok(account.account_id)
    }
}
