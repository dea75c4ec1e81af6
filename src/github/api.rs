//! Descriptors for the handful of GitHub REST calls the bot makes.
//!
//! Nothing in here performs I/O: each function only describes a request, which
//! [`GitHubClient`](super::GitHubClient) then executes.

use reqwest::Method;
use serde_json::{json, Value};
use url::Url;

use crate::error::ClaError;

/// Context of the commit status the bot owns on every pull request.
pub const STATUS_CONTEXT: &str = "verification/cla-signed";

const ORG_CONFIG_REPO: &str = "clabot-config";
const POLICY_FILE: &str = ".clabot";

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            body: Some(body),
        }
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            url: url.into(),
            body: None,
        }
    }

    /// URL without its query string, safe to log.
    pub fn log_url(&self) -> &str {
        self.url.split('?').next().unwrap_or_default()
    }
}

/// Owner of a repository API URL, accepting both `https://api.github.com/repos/<owner>/<repo>`
/// and `https://<host>/<owner>/<repo>` forms.
pub fn repository_owner(repository_url: &str) -> Result<String, ClaError> {
    let url = Url::parse(repository_url).map_err(|_| ClaError::InvalidUrl(repository_url.to_owned()))?;

    let mut segments = url
        .path_segments()
        .into_iter()
        .flatten()
        .filter(|segment| !segment.is_empty())
        .peekable();
    if segments.peek() == Some(&"repos") {
        segments.next();
    }

    segments
        .next()
        .map(ToOwned::to_owned)
        .ok_or_else(|| ClaError::InvalidUrl(repository_url.to_owned()))
}

/// Organisation-wide policy: `.clabot` at the root of the owner's `clabot-config` repository,
/// on the same host as the repository under test.
pub fn org_config(repository_url: &str) -> Result<ApiRequest, ClaError> {
    let owner = repository_owner(repository_url)?;

    let mut url = Url::parse(repository_url).map_err(|_| ClaError::InvalidUrl(repository_url.to_owned()))?;
    url.set_path(&format!(
        "/repos/{}/{}/contents/{}",
        owner, ORG_CONFIG_REPO, POLICY_FILE
    ));
    url.set_query(None);
    url.set_fragment(None);

    Ok(ApiRequest::get(url.to_string()))
}

pub fn repo_config(repository_url: &str) -> ApiRequest {
    ApiRequest::get(format!(
        "{}/contents/{}",
        repository_url.trim_end_matches('/'),
        POLICY_FILE
    ))
}

pub fn file(download_url: &str) -> ApiRequest {
    ApiRequest::get(download_url)
}

pub fn commits(pull_request_url: &str) -> ApiRequest {
    ApiRequest::get(format!("{}/commits", pull_request_url))
}

pub fn labels(issue_url: &str) -> ApiRequest {
    ApiRequest::get(format!("{}/labels", issue_url))
}

pub fn add_label(issue_url: &str, label: &str) -> ApiRequest {
    ApiRequest::post(format!("{}/labels", issue_url), json!([label]))
}

pub fn delete_label(issue_url: &str, label: &str) -> Result<ApiRequest, ClaError> {
    let mut url = Url::parse(issue_url).map_err(|_| ClaError::InvalidUrl(issue_url.to_owned()))?;
    url.path_segments_mut()
        .map_err(|_| ClaError::InvalidUrl(issue_url.to_owned()))?
        .pop_if_empty()
        .extend(["labels", label]);

    Ok(ApiRequest::delete(url.to_string()))
}

pub fn set_status(repository_url: &str, sha: &str, state: &str, target_url: &str) -> ApiRequest {
    ApiRequest::post(
        format!("{}/statuses/{}", repository_url.trim_end_matches('/'), sha),
        json!({
            "state": state,
            "context": STATUS_CONTEXT,
            "target_url": target_url,
        }),
    )
}

pub fn comment(issue_url: &str, body: &str) -> ApiRequest {
    ApiRequest::post(format!("{}/comments", issue_url), json!({ "body": body }))
}

pub fn installation_token(api_url: &str, installation_id: u64) -> ApiRequest {
    ApiRequest::post(
        format!(
            "{}/app/installations/{}/access_tokens",
            api_url.trim_end_matches('/'),
            installation_id
        ),
        json!({}),
    )
}
