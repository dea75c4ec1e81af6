use thiserror::Error;

/// Everything that can go wrong while checking a pull request.
///
/// Ignorable events (unsupported actions, unsummoned comments) are not errors and never end up
/// here.
#[derive(Debug, Error)]
pub enum ClaError {
    #[error("API request {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("API request {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("API response from {url} couldn't be decoded: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("The .clabot file is not valid JSON")]
    InvalidPolicy(#[source] serde_json::Error),

    #[error("No .clabot file could be fetched: {source}")]
    MissingPolicy {
        #[source]
        source: Box<ClaError>,
    },

    #[error("A mechanism for verifying contributors has not been specified")]
    NoContributorSource,

    #[error("the contributor list at {url} is not a JSON array of strings")]
    InvalidContributorList {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("couldn't parse url {0}")]
    InvalidUrl(String),

    #[error("pull request {0} has no commits")]
    NoCommits(String),

    #[error("running as a GitHub App requires an installation id in the webhook")]
    MissingInstallation,

    #[error("couldn't sign GitHub App token: {0}")]
    AppToken(#[from] jsonwebtoken::errors::Error),
}

impl ClaError {
    /// Commit status state written back to the pull request when this error aborts a check.
    pub fn status_state(&self) -> &'static str {
        match self {
            Self::InvalidPolicy(_)
            | Self::MissingPolicy { .. }
            | Self::NoContributorSource
            | Self::InvalidContributorList { .. } => "error",
            _ => "failure",
        }
    }
}
