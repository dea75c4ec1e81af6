use std::collections::BTreeMap;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::Deserialize;
use tracing::info;
use url::Url;

use crate::{
    bot::policy::{ContributorSource, PolicyDocument},
    error::ClaError,
    github::{types::PullRequestCommit, ApiRequest, Auth, GitHubSession},
};

const CHECK_CONTRIBUTOR_PARAM: &str = "checkContributor";

/// The author of one commit of a pull request.
#[derive(Debug, Clone, PartialEq)]
pub struct Committer {
    /// `None` when the commit email isn't linked to a GitHub account
    pub login: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub sha: String,
}

impl Committer {
    /// How to refer to a committer GitHub couldn't identify.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.sha.clone())
    }
}

impl From<&PullRequestCommit> for Committer {
    fn from(commit: &PullRequestCommit) -> Self {
        let author = commit.commit.author.as_ref();
        Self {
            login: commit.author.as_ref().map(|account| account.login.clone()),
            email: author.and_then(|a| a.email.clone()),
            name: author.and_then(|a| a.name.clone()),
            sha: commit.sha.clone(),
        }
    }
}

/// Outcome of checking every committer of a pull request.
#[derive(Debug, Default, PartialEq)]
pub struct Verdict {
    /// logins of identified committers who haven't signed
    pub non_contributors: Vec<String>,
    /// names of committers without a GitHub account; takes precedence over everything else
    pub unidentified: Vec<String>,
}

/// A way of telling which committers have signed the CLA.
#[async_trait]
pub trait ContributorVerifier: Send + Sync {
    /// Returns the logins of the committers that aren't known contributors.
    async fn non_contributors(
        &self,
        committers: &[Committer],
        session: &GitHubSession<'_>,
    ) -> Result<Vec<String>, ClaError>;
}

/// Matches committers against a literal list, ignoring case. Entries with an `@` are compared to
/// the commit email, the others to the GitHub login.
#[derive(Debug, Clone)]
pub struct ContributorList {
    emails: Vec<String>,
    logins: Vec<String>,
}

impl ContributorList {
    pub fn new(entries: &[String]) -> Self {
        let (emails, logins): (Vec<String>, Vec<String>) = entries
            .iter()
            .map(|entry| entry.to_lowercase())
            .partition(|entry| entry.contains('@'));

        Self { emails, logins }
    }

    fn is_contributor(&self, committer: &Committer) -> bool {
        let email_matches = committer
            .email
            .as_ref()
            .is_some_and(|email| self.emails.contains(&email.to_lowercase()));
        let login_matches = committer
            .login
            .as_ref()
            .is_some_and(|login| self.logins.contains(&login.to_lowercase()));

        email_matches || login_matches
    }

    pub fn check(&self, committers: &[Committer]) -> Vec<String> {
        committers
            .iter()
            .filter(|committer| !self.is_contributor(committer))
            .filter_map(|committer| committer.login.clone())
            .collect()
    }
}

#[async_trait]
impl ContributorVerifier for ContributorList {
    async fn non_contributors(
        &self,
        committers: &[Committer],
        _: &GitHubSession<'_>,
    ) -> Result<Vec<String>, ClaError> {
        Ok(self.check(committers))
    }
}

/// A JSON array stored in a repository, read through the GitHub contents API with the bot's
/// credentials.
pub struct GitHubContentsList {
    pub url: String,
}

#[async_trait]
impl ContributorVerifier for GitHubContentsList {
    async fn non_contributors(
        &self,
        committers: &[Committer],
        session: &GitHubSession<'_>,
    ) -> Result<Vec<String>, ClaError> {
        let body = session.fetch_contents(&ApiRequest::get(&self.url)).await?;
        let entries = parse_list(&self.url, &body)?;

        Ok(ContributorList::new(&entries).check(committers))
    }
}

/// A JSON array served from an arbitrary URL.
pub struct RemoteList {
    pub url: String,
}

#[async_trait]
impl ContributorVerifier for RemoteList {
    async fn non_contributors(
        &self,
        committers: &[Committer],
        session: &GitHubSession<'_>,
    ) -> Result<Vec<String>, ClaError> {
        let body = session
            .client()
            .execute(&ApiRequest::get(&self.url), Auth::Anonymous, session.ctx())
            .await?;
        let entries = parse_list(&self.url, &body)?;

        Ok(ContributorList::new(&entries).check(committers))
    }
}

/// A service asked about each committer separately. Requests run concurrently and all of them
/// complete; any single failure then fails the whole check.
pub struct WebhookQuery {
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributorCheck {
    is_contributor: bool,
}

impl WebhookQuery {
    /// `…?checkContributor=` style URLs get the login appended as is, anything else gets a
    /// `checkContributor` query parameter.
    fn url_for(&self, login: &str) -> Result<String, ClaError> {
        if self.url.ends_with('=') {
            let encoded: String = url::form_urlencoded::byte_serialize(login.as_bytes()).collect();
            return Ok(format!("{}{}", self.url, encoded));
        }

        let mut url = Url::parse(&self.url).map_err(|_| ClaError::InvalidUrl(self.url.clone()))?;
        url.query_pairs_mut()
            .append_pair(CHECK_CONTRIBUTOR_PARAM, login);
        Ok(url.to_string())
    }

    async fn is_contributor(
        &self,
        login: &str,
        session: &GitHubSession<'_>,
    ) -> Result<bool, ClaError> {
        let request = ApiRequest::get(self.url_for(login)?);
        let check: ContributorCheck = session
            .client()
            .execute_json(&request, Auth::Anonymous, session.ctx())
            .await?;

        Ok(check.is_contributor)
    }
}

#[async_trait]
impl ContributorVerifier for WebhookQuery {
    async fn non_contributors(
        &self,
        committers: &[Committer],
        session: &GitHubSession<'_>,
    ) -> Result<Vec<String>, ClaError> {
        let logins = sorted_unique(committers.iter().filter_map(|c| c.login.clone()));

        // every query runs to completion, then the first failure fails the check
        let answers = join_all(
            logins
                .iter()
                .map(|login| self.is_contributor(login, session)),
        )
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

        let contributors: Vec<String> = logins
            .into_iter()
            .zip(answers)
            .filter_map(|(login, is_contributor)| is_contributor.then_some(login))
            .collect();

        Ok(ContributorList::new(&contributors).check(committers))
    }
}

fn parse_list(url: &str, body: &str) -> Result<Vec<String>, ClaError> {
    serde_json::from_str(body).map_err(|source| ClaError::InvalidContributorList {
        url: url.split('?').next().unwrap_or_default().to_owned(),
        source,
    })
}

impl ContributorSource {
    pub fn verifier(&self) -> Box<dyn ContributorVerifier> {
        match self {
            Self::List(entries) => Box::new(ContributorList::new(entries)),
            Self::GitHubContents(url) => Box::new(GitHubContentsList { url: url.clone() }),
            Self::Webhook(url) => Box::new(WebhookQuery { url: url.clone() }),
            Self::Url(url) => Box::new(RemoteList { url: url.clone() }),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::List(_) => "the list supplied in the .clabot file",
            Self::GitHubContents(_) => "the github URL supplied in the .clabot file",
            Self::Webhook(_) => "the webhook supplied in the .clabot file",
            Self::Url(_) => "the URL supplied in the .clabot file",
        }
    }
}

/// De-duplicates ignoring case and sorts, keeping the first spelling seen.
pub fn sorted_unique(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut unique = BTreeMap::new();
    for item in items {
        unique.entry(item.to_lowercase()).or_insert(item);
    }
    unique.into_values().collect()
}

/// Checks every committer against the policy.
///
/// Committers without a GitHub account can't be checked at all: when there are any, they are all
/// the verdict reports and the contributor source isn't consulted.
pub async fn verify(
    policy: &PolicyDocument,
    committers: &[Committer],
    session: &GitHubSession<'_>,
) -> Result<Verdict, ClaError> {
    let ctx = session.ctx();

    let unidentified = sorted_unique(
        committers
            .iter()
            .filter(|committer| committer.login.is_none())
            .map(Committer::display_name),
    );
    if !unidentified.is_empty() {
        return Ok(Verdict {
            non_contributors: Vec::new(),
            unidentified,
        });
    }

    let source = policy
        .contributors
        .as_ref()
        .ok_or(ClaError::NoContributorSource)?;
    info!(correlation = %ctx.correlation_id, "Checking contributors against {}", source.describe());

    let non_contributors = source.verifier().non_contributors(committers, session).await?;

    Ok(Verdict {
        non_contributors: sorted_unique(non_contributors),
        unidentified: Vec::new(),
    })
}
