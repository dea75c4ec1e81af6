use tracing::{error, info};

use crate::{
    bot::policy::PolicyDocument,
    error::ClaError,
    github::{api, types::ContentsEntry, GitHubSession},
};

/// Locates and fetches the `.clabot` policy for a repository.
///
/// The organisation-wide file in `<owner>/clabot-config` wins whenever it can be fetched; any
/// failure there falls back to the `.clabot` at the root of the repository itself. Failing to
/// find either is fatal and reported as a configuration error.
pub async fn resolve_config(
    repository_url: &str,
    session: &GitHubSession<'_>,
) -> Result<PolicyDocument, ClaError> {
    let ctx = session.ctx();

    info!(correlation = %ctx.correlation_id, "Attempting to obtain organisation level .clabot file URL");
    let entry = match org_config_entry(repository_url, session).await {
        Ok(entry) => {
            info!(correlation = %ctx.correlation_id, "Organisation configuration found!");
            entry
        }
        Err(e) => {
            info!(
                correlation = %ctx.correlation_id,
                "Organisation configuration not found ({}), resolving .clabot URL at project level", e
            );
            session
                .contents_entry(&api::repo_config(repository_url))
                .await
                .map_err(|e| ClaError::MissingPolicy {
                    source: Box::new(e),
                })?
        }
    };

    info!(
        correlation = %ctx.correlation_id,
        "Obtaining .clabot configuration file from {}",
        entry.download_url.split('?').next().unwrap_or_default()
    );
    let text = session.download(&entry).await?;

    PolicyDocument::parse(&text).map_err(|e| {
        error!(correlation = %ctx.correlation_id, "{}", e);
        e
    })
}

async fn org_config_entry(
    repository_url: &str,
    session: &GitHubSession<'_>,
) -> Result<ContentsEntry, ClaError> {
    let request = api::org_config(repository_url)?;
    session.contents_entry(&request).await
}
