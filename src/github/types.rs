use serde::Deserialize;

/// Response of the "contents" API; only the raw download location is of interest.
#[derive(Debug, Deserialize)]
pub struct ContentsEntry {
    pub download_url: String,
}

#[derive(Debug, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct InstallationToken {
    pub token: String,
}

/// A commit as listed by `GET /pulls/<n>/commits`.
#[derive(Debug, Deserialize)]
pub struct PullRequestCommit {
    #[serde(default)]
    pub sha: String,
    /// `null` when the commit's email isn't linked to any GitHub account
    pub author: Option<Account>,
    #[serde(default)]
    pub commit: GitCommit,
}

#[derive(Debug, Deserialize)]
pub struct Account {
    pub login: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct GitCommit {
    pub author: Option<GitAuthor>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GitAuthor {
    pub name: Option<String>,
    pub email: Option<String>,
}
