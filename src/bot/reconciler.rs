use tracing::info;

use crate::{
    bot::{policy::PolicyDocument, template, verifier::Verdict},
    error::ClaError,
    github::GitHubSession,
};

/// The pull request whose visible state gets reconciled.
#[derive(Debug, Clone, Copy)]
pub struct PullRequestContext<'a> {
    pub pull_request_url: &'a str,
    pub issue_url: &'a str,
    pub repository_url: &'a str,
    pub head_sha: &'a str,
    /// acknowledge the re-check request once done
    pub recheck: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// label present, status `success`
    Success,
    /// label absent, status `error`, explanatory comment posted
    Failure,
}

#[derive(Debug, PartialEq)]
pub struct Reconciliation {
    pub outcome: Outcome,
    pub message: String,
}

/// Makes the label, commit status and comments of the pull request match the verdict.
///
/// Every step is safe to repeat. Steps run in order and the first failing one aborts the rest.
pub async fn reconcile(
    verdict: &Verdict,
    policy: &PolicyDocument,
    pr: &PullRequestContext<'_>,
    session: &GitHubSession<'_>,
) -> Result<Reconciliation, ClaError> {
    let ctx = session.ctx();

    let reconciliation = if !verdict.unidentified.is_empty() {
        let names = verdict.unidentified.join(", ");
        info!(
            correlation = %ctx.correlation_id,
            "Some commits from the following contributors are not signed with a valid email address: {}",
            names
        );

        let comment = template::render(
            &policy.message_missing_email,
            &[("unidentifiedUsers", names.as_str())],
        );
        session.comment(pr.issue_url, &comment).await?;

        remove_label_and_fail(&names, policy, pr, session).await?
    } else if verdict.non_contributors.is_empty() {
        info!(
            correlation = %ctx.correlation_id,
            "All contributors have a signed CLA, adding success status to the pull request and a label"
        );

        ensure_label(policy, pr, session).await?;
        session
            .set_status(pr.repository_url, pr.head_sha, "success")
            .await?;

        Reconciliation {
            outcome: Outcome::Success,
            message: format!("added label {} to {}", policy.label, pr.pull_request_url),
        }
    } else {
        let users = verdict
            .non_contributors
            .iter()
            .map(|login| format!("@{}", login))
            .collect::<Vec<_>>()
            .join(", ");
        info!(
            correlation = %ctx.correlation_id,
            "The contributors {} have not signed the CLA, adding error status to the pull request",
            users
        );

        let comment = template::render(&policy.message, &[("usersWithoutCLA", users.as_str())]);
        session.comment(pr.issue_url, &comment).await?;

        remove_label_and_fail(&users, policy, pr, session).await?
    };

    if pr.recheck {
        session
            .comment(pr.issue_url, &policy.recheck_comment)
            .await?;
    }

    Ok(reconciliation)
}

/// Adds the label unless the pull request already carries it.
async fn ensure_label(
    policy: &PolicyDocument,
    pr: &PullRequestContext<'_>,
    session: &GitHubSession<'_>,
) -> Result<(), ClaError> {
    let labels = session.labels(pr.issue_url).await?;

    // exact match, the same way GitHub displays it
    if labels.iter().any(|label| label.name == policy.label) {
        info!(
            correlation = %session.ctx().correlation_id,
            "The pull request already has the label {}", policy.label
        );
        return Ok(());
    }

    session.add_label(pr.issue_url, &policy.label).await
}

async fn remove_label_and_fail(
    users: &str,
    policy: &PolicyDocument,
    pr: &PullRequestContext<'_>,
    session: &GitHubSession<'_>,
) -> Result<Reconciliation, ClaError> {
    session.delete_label(pr.issue_url, &policy.label).await?;
    session
        .set_status(pr.repository_url, pr.head_sha, "error")
        .await?;

    Ok(Reconciliation {
        outcome: Outcome::Failure,
        message: format!(
            "CLA has not been signed by users {}, added a comment to {}",
            users, pr.pull_request_url
        ),
    })
}
