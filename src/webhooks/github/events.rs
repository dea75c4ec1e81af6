use serde::Deserialize;
use serde_json::Value;

mod issue_comment;
mod pull_request;

pub use issue_comment::*;
pub use pull_request::*;

/// A webhook delivery, as far as the bot is concerned.
#[derive(Debug)]
pub struct Webhook {
    /// The raw `action` field, kept around to explain why an event was ignored
    pub action: String,
    pub event: WebhookEvent,
}

impl Webhook {
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_str(body)?;
        let action = value
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let event = WebhookEvent::deserialize(value)?;

        Ok(Self { action, event })
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum WebhookEvent {
    Opened(PullRequestEvent),
    Synchronize(PullRequestEvent),
    Created(IssueCommentEvent),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct GitHubUser {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct Repository {
    /// API URL of the repository, e.g. `https://api.github.com/repos/o/r`
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct Installation {
    pub id: u64,
}
