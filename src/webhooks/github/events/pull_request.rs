use serde::Deserialize;

use crate::webhooks::github::events::{GitHubUser, Installation, Repository};

#[derive(Debug, Deserialize)]
pub struct PullRequestEvent {
    pub repository: Repository,
    pub pull_request: PullRequest,
    pub installation: Option<Installation>,
}

#[derive(Debug, Deserialize)]
pub struct PullRequest {
    /// API URL of the pull request, e.g. `https://api.github.com/repos/o/r/pulls/2`
    pub url: String,
    /// API URL of the issue backing the pull request, where labels and comments live
    pub issue_url: String,
    pub head: PrRef,
    pub user: GitHubUser,
}

#[derive(Debug, Deserialize)]
pub struct PrRef {
    pub sha: String,
}
