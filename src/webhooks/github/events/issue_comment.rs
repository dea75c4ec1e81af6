use serde::Deserialize;

use crate::webhooks::github::events::{GitHubUser, Installation, Repository};

#[derive(Debug, Deserialize)]
pub struct IssueCommentEvent {
    pub repository: Repository,
    pub issue: Issue,
    pub comment: Comment,
    pub installation: Option<Installation>,
}

#[derive(Debug, Deserialize)]
pub struct Issue {
    pub url: String,
    // an issue can be a PR, in this case the object contains a `pull_request` key with urls to the
    // PR
    pub pull_request: Option<PullRequestLinks>,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestLinks {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct Comment {
    pub body: String,
    pub user: GitHubUser,
}
