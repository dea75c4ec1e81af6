use anyhow::{bail, Context};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
    config::ClabotConfig,
    context::LogContext,
    error::ClaError,
    github::{api, GitHubClient, GitHubSession, InstallationTokens, StaticToken, TokenProvider},
    webhooks::Webhook,
};

mod classifier;
use classifier::{CheckTarget, Triage};

mod config_resolver;
use config_resolver::resolve_config;

mod policy;

mod reconciler;
use reconciler::{reconcile, PullRequestContext};

mod template;

mod verifier;
use verifier::{verify, Committer};

#[cfg(test)]
mod tests;

pub struct ClaBot {
    bot_name: String,
    log_url: Url,
    client: GitHubClient,
    tokens: Box<dyn TokenProvider>,
}

/// What a check knew when it failed, so the failure can still be reported on the pull request.
#[derive(Debug)]
struct Progress {
    token: Option<String>,
    head_sha: Option<String>,
}

impl ClaBot {
    /// Creates a new [`ClaBot`] from the provided [`ClabotConfig`].
    ///
    /// A configured GitHub App takes precedence over a static token; having neither is an error.
    pub fn new(config: &ClabotConfig) -> anyhow::Result<Self> {
        let client = GitHubClient::new()?;

        let tokens: Box<dyn TokenProvider> = match (&config.github_app, &config.github_token) {
            (Some(app), _) => {
                let pem = std::fs::read(&app.private_key).with_context(|| {
                    format!("couldn't read {}", app.private_key.display())
                })?;
                let tokens =
                    InstallationTokens::new(app.app_id, &pem, app.api_url.clone(), client.clone())
                        .context("invalid GitHub App private key")?;
                info!("running as GitHub App {}", app.app_id);
                Box::new(tokens)
            }
            (None, Some(token)) => {
                info!("running as a webhook with a static token");
                Box::new(StaticToken(token.clone()))
            }
            (None, None) => bail!("one of `github_token` or `github_app` must be configured"),
        };

        Ok(Self::with_token_provider(
            config.bot_name.clone(),
            config.log_url.clone(),
            client,
            tokens,
        ))
    }

    pub fn with_token_provider(
        bot_name: String,
        log_url: Url,
        client: GitHubClient,
        tokens: Box<dyn TokenProvider>,
    ) -> Self {
        Self {
            bot_name,
            log_url,
            client,
            tokens,
        }
    }

    /// Handles one webhook delivery, returning the message describing what was done.
    ///
    /// When the check fails after the bot got hold of a token and the head commit, a commit
    /// status describing the failure is written before the error is returned.
    pub async fn handle(
        &self,
        webhook: &Webhook,
        delivery: Option<&str>,
    ) -> Result<String, ClaError> {
        let target = match classifier::triage(webhook, &self.bot_name) {
            Triage::Check(target) => target,
            Triage::Ignore(message) => {
                debug!("{}", message);
                return Ok(message);
            }
        };

        let org = api::repository_owner(&target.repository_url)?;
        let ctx = LogContext::new(&org, delivery, &self.log_url);
        info!(
            correlation = %ctx.correlation_id,
            "checking pull request {}", target.pull_request_url
        );

        let mut progress = Progress {
            token: None,
            head_sha: target.head_sha.clone(),
        };
        match self.check(&target, &ctx, &mut progress).await {
            Ok(message) => {
                info!(correlation = %ctx.correlation_id, "{}", message);
                Ok(message)
            }
            Err(err) => {
                error!(correlation = %ctx.correlation_id, "{}", err);
                self.report_failure(&target, &ctx, &progress, &err).await;
                Err(err)
            }
        }
    }

    async fn check(
        &self,
        target: &CheckTarget,
        ctx: &LogContext,
        progress: &mut Progress,
    ) -> Result<String, ClaError> {
        let token = self.tokens.token(target.installation_id, ctx).await?;
        progress.token = Some(token.clone());
        let session = GitHubSession::new(&self.client, token, ctx);

        info!(correlation = %ctx.correlation_id, "Obtaining the list of commits for the pull request");
        let commits = session.commits(&target.pull_request_url).await?;
        let last_sha = commits
            .last()
            .map(|commit| commit.sha.clone())
            .ok_or_else(|| ClaError::NoCommits(target.pull_request_url.clone()))?;
        let head_sha = target.head_sha.clone().unwrap_or(last_sha);
        progress.head_sha = Some(head_sha.clone());

        let policy = resolve_config(&target.repository_url, &session).await?;

        let committers: Vec<Committer> = commits.iter().map(Committer::from).collect();
        info!(
            correlation = %ctx.correlation_id,
            "Total Commits: {}, checking CLA status for committers", committers.len()
        );
        let verdict = verify(&policy, &committers, &session).await?;

        let pr = PullRequestContext {
            pull_request_url: &target.pull_request_url,
            issue_url: &target.issue_url,
            repository_url: &target.repository_url,
            head_sha: &head_sha,
            recheck: target.recheck,
        };
        let reconciliation = reconcile(&verdict, &policy, &pr, &session).await?;
        debug!(correlation = %ctx.correlation_id, "outcome: {:?}", reconciliation.outcome);

        Ok(reconciliation.message)
    }

    /// Best effort: a failure to write the status is only logged.
    async fn report_failure(
        &self,
        target: &CheckTarget,
        ctx: &LogContext,
        progress: &Progress,
        err: &ClaError,
    ) {
        let (token, sha) = match (&progress.token, &progress.head_sha) {
            (Some(token), Some(sha)) => (token, sha),
            _ => {
                debug!(
                    correlation = %ctx.correlation_id,
                    "no token or head commit yet, can't report the failure on the pull request"
                );
                return;
            }
        };

        let session = GitHubSession::new(&self.client, token.clone(), ctx);
        if let Err(e) = session
            .set_status(&target.repository_url, sha, err.status_state())
            .await
        {
            warn!(
                correlation = %ctx.correlation_id,
                "couldn't report the failure on the pull request: {}", e
            );
        }
    }
}
