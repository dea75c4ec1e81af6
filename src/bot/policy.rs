use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::ClaError;

pub const DEFAULT_LABEL: &str = "cla-signed";

pub const DEFAULT_MESSAGE: &str = "Thank you for your pull request and welcome to our community. \
We require contributors to sign our Contributor License Agreement, and we don't seem to have the \
users {{usersWithoutCLA}} on file. In order for us to review and merge your code, please contact \
the project maintainers to get yourself added.";

pub const DEFAULT_MESSAGE_MISSING_EMAIL: &str = "Thank you for your pull request and welcome to \
our community. We could not parse the GitHub identity of the following contributors: \
{{unidentifiedUsers}}.\n\
This is most likely caused by a git client misconfiguration; please make sure to:\n\
1. check if your git client is configured with an email to sign commits `git config --list | grep email`\n\
2. If not, set it up using `git config --global user.email email@example.com`\n\
3. Make sure that the git commit email is configured in your GitHub account settings, see \
https://github.com/settings/emails";

pub const DEFAULT_RECHECK_COMMENT: &str =
    "The cla-bot has been summoned, and re-checked this pull request!";

/// Where the list of people who signed the CLA comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ContributorSource {
    /// logins and emails listed in the `.clabot` file itself
    List(Vec<String>),
    /// a file behind the GitHub "contents" API holding a JSON array
    GitHubContents(String),
    /// a service answering `{"isContributor": bool}` for each committer
    Webhook(String),
    /// any other URL serving a JSON array
    Url(String),
}

impl ContributorSource {
    /// Decides the kind of source from the `contributors` value. The first matching shape wins:
    /// array, GitHub API URL, URL with a query, plain URL.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Array(entries) => Some(Self::List(
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ToOwned::to_owned)
                    .collect(),
            )),
            Value::String(url) if is_url(url) => {
                if url.contains("api.github.com") {
                    Some(Self::GitHubContents(url.clone()))
                } else if url.contains('?') {
                    Some(Self::Webhook(url.clone()))
                } else {
                    Some(Self::Url(url.clone()))
                }
            }
            _ => None,
        }
    }
}

fn is_url(s: &str) -> bool {
    Url::parse(s)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// The `.clabot` file, merged over the built-in defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDocument {
    pub contributors: Option<ContributorSource>,
    pub label: String,
    /// template with a `usersWithoutCLA` variable
    pub message: String,
    /// template with an `unidentifiedUsers` variable
    pub message_missing_email: String,
    pub recheck_comment: String,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self {
            contributors: None,
            label: DEFAULT_LABEL.to_owned(),
            message: DEFAULT_MESSAGE.to_owned(),
            message_missing_email: DEFAULT_MESSAGE_MISSING_EMAIL.to_owned(),
            recheck_comment: DEFAULT_RECHECK_COMMENT.to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPolicy {
    contributors: Option<Value>,
    // older `.clabot` files name the kind of source explicitly
    contributor_list_github_url: Option<String>,
    contributor_list_url: Option<String>,
    contributor_webhook: Option<String>,
    label: Option<String>,
    message: Option<String>,
    message_missing_email: Option<String>,
    recheck_comment: Option<String>,
}

impl PolicyDocument {
    /// Parses the content of a `.clabot` file. Keys that are missing fall back to the defaults,
    /// unknown keys are ignored.
    pub fn parse(text: &str) -> Result<Self, ClaError> {
        let raw: RawPolicy = serde_json::from_str(text).map_err(ClaError::InvalidPolicy)?;
        let defaults = Self::default();

        let contributors = if let Some(url) = raw.contributor_list_github_url {
            Some(ContributorSource::GitHubContents(url))
        } else if let Some(url) = raw.contributor_list_url {
            Some(ContributorSource::Url(url))
        } else if let Some(url) = raw.contributor_webhook {
            Some(ContributorSource::Webhook(url))
        } else {
            raw.contributors.as_ref().and_then(ContributorSource::from_value)
        };

        Ok(Self {
            contributors,
            label: raw.label.unwrap_or(defaults.label),
            message: raw.message.unwrap_or(defaults.message),
            message_missing_email: raw
                .message_missing_email
                .unwrap_or(defaults.message_missing_email),
            recheck_comment: raw.recheck_comment.unwrap_or(defaults.recheck_comment),
        })
    }
}
