use regex::Regex;
use tracing::{debug, trace};

use crate::webhooks::{Webhook, WebhookEvent};

/// What the bot should do with an incoming webhook.
#[derive(Debug, PartialEq)]
pub enum Triage {
    /// Check the CLA status of a pull request
    Check(CheckTarget),
    /// Nothing to do, the message says why
    Ignore(String),
}

/// The pull request a webhook asks the bot to check.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckTarget {
    pub pull_request_url: String,
    pub issue_url: String,
    pub repository_url: String,
    /// Only pull request events carry the head commit; for comments it comes from the commit list.
    pub head_sha: Option<String>,
    pub installation_id: Option<u64>,
    /// The check was requested through a comment, which gets acknowledged once done.
    pub recheck: bool,
}

/// Whether the event can trigger a check at all: a pull request being opened or updated, or a
/// comment made on a pull request's conversation (not on a plain issue).
pub fn is_actionable(event: &WebhookEvent) -> bool {
    match event {
        WebhookEvent::Opened(_) | WebhookEvent::Synchronize(_) => true,
        WebhookEvent::Created(event) => event.issue.pull_request.is_some(),
        WebhookEvent::Other => false,
    }
}

/// Whether a comment asks the bot for a re-check, e.g. `@cla-bot check` or
/// `@cla-bot[bot] check`. The space before `check` is optional.
pub fn comment_summons_bot(body: &str, bot_name: &str) -> bool {
    let pattern = format!(r"@{}(\[bot\])?\s*check", regex::escape(bot_name));
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(body),
        Err(e) => {
            debug!("couldn't build summon pattern for `{}`: {}", bot_name, e);
            false
        }
    }
}

pub fn triage(webhook: &Webhook, bot_name: &str) -> Triage {
    if !is_actionable(&webhook.event) {
        return Triage::Ignore(format!("ignored action of type {}", webhook.action));
    }

    let target = match &webhook.event {
        WebhookEvent::Opened(event) | WebhookEvent::Synchronize(event) => {
            trace!(
                "pull request {} by {}",
                event.pull_request.url,
                event.pull_request.user.login
            );
            CheckTarget {
                pull_request_url: event.pull_request.url.clone(),
                issue_url: event.pull_request.issue_url.clone(),
                repository_url: event.repository.url.clone(),
                head_sha: Some(event.pull_request.head.sha.clone()),
                installation_id: event.installation.as_ref().map(|i| i.id),
                recheck: false,
            }
        }
        WebhookEvent::Created(event) => {
            if !comment_summons_bot(&event.comment.body, bot_name) {
                return Triage::Ignore(format!("the comment didnt summon the {}", bot_name));
            }
            if event.comment.user.login == format!("{}[bot]", bot_name) {
                return Triage::Ignore(format!("the {} summoned itself. Ignored!", bot_name));
            }
            debug!("{} has been summoned by {}", bot_name, event.comment.user.login);

            let pull_request = match &event.issue.pull_request {
                Some(pull_request) => pull_request,
                None => return Triage::Ignore(format!("ignored action of type {}", webhook.action)),
            };
            CheckTarget {
                pull_request_url: pull_request.url.clone(),
                issue_url: event.issue.url.clone(),
                repository_url: event.repository.url.clone(),
                head_sha: None,
                installation_id: event.installation.as_ref().map(|i| i.id),
                recheck: true,
            }
        }
        WebhookEvent::Other => {
            return Triage::Ignore(format!("ignored action of type {}", webhook.action))
        }
    };

    Triage::Check(target)
}
