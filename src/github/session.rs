use tracing::info;

use crate::{
    context::LogContext,
    error::ClaError,
    github::{
        api,
        types::{ContentsEntry, Label, PullRequestCommit},
        ApiRequest, Auth, GitHubClient,
    },
};

/// A [`GitHubClient`] bound to the token and logging context of one invocation.
pub struct GitHubSession<'a> {
    client: &'a GitHubClient,
    token: String,
    ctx: &'a LogContext,
}

impl<'a> GitHubSession<'a> {
    pub fn new(client: &'a GitHubClient, token: String, ctx: &'a LogContext) -> Self {
        Self { client, token, ctx }
    }

    pub fn client(&self) -> &GitHubClient {
        self.client
    }

    pub fn ctx(&self) -> &LogContext {
        self.ctx
    }

    async fn send(&self, request: &ApiRequest) -> Result<String, ClaError> {
        self.client
            .execute(request, Auth::Token(&self.token), self.ctx)
            .await
    }

    /// Resolves a "contents" API reference to the file it points at: first the metadata, then
    /// the body behind its `download_url`.
    pub async fn fetch_contents(&self, request: &ApiRequest) -> Result<String, ClaError> {
        let entry = self.contents_entry(request).await?;
        self.download(&entry).await
    }

    pub async fn contents_entry(&self, request: &ApiRequest) -> Result<ContentsEntry, ClaError> {
        self.client
            .execute_json(request, Auth::Token(&self.token), self.ctx)
            .await
    }

    pub async fn download(&self, entry: &ContentsEntry) -> Result<String, ClaError> {
        self.send(&api::file(&entry.download_url)).await
    }

    pub async fn commits(&self, pull_request_url: &str) -> Result<Vec<PullRequestCommit>, ClaError> {
        self.client
            .execute_json(
                &api::commits(pull_request_url),
                Auth::Token(&self.token),
                self.ctx,
            )
            .await
    }

    pub async fn labels(&self, issue_url: &str) -> Result<Vec<Label>, ClaError> {
        self.client
            .execute_json(&api::labels(issue_url), Auth::Token(&self.token), self.ctx)
            .await
    }

    pub async fn add_label(&self, issue_url: &str, label: &str) -> Result<(), ClaError> {
        self.send(&api::add_label(issue_url, label)).await?;
        Ok(())
    }

    pub async fn delete_label(&self, issue_url: &str, label: &str) -> Result<(), ClaError> {
        self.send(&api::delete_label(issue_url, label)?).await?;
        Ok(())
    }

    pub async fn set_status(
        &self,
        repository_url: &str,
        sha: &str,
        state: &str,
    ) -> Result<(), ClaError> {
        info!(correlation = %self.ctx.correlation_id, "setting commit status of {} to {}", sha, state);
        self.send(&api::set_status(
            repository_url,
            sha,
            state,
            &self.ctx.log_url,
        ))
        .await?;
        Ok(())
    }

    pub async fn comment(&self, issue_url: &str, body: &str) -> Result<(), ClaError> {
        self.send(&api::comment(issue_url, body)).await?;
        Ok(())
    }
}
