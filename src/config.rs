use std::path::PathBuf;

use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
pub struct ClabotConfig {
    /// Name the bot answers to in comments, e.g. `cla-bot` for `@cla-bot check`
    pub bot_name: String,
    /// Personal access token used when the bot is installed as a plain webhook
    pub github_token: Option<String>,
    /// Credentials used when the bot is installed as a GitHub App. Takes precedence over
    /// `github_token`.
    pub github_app: Option<GitHubAppConfig>,
    /// Base URL of the hosted logs; the commit status of each check links to
    /// `<log_url>/<correlation id>`
    pub log_url: Url,
}

#[derive(Debug, Deserialize)]
pub struct GitHubAppConfig {
    /// The App's numeric id, used as issuer of the App JWT
    pub app_id: u64,
    /// Path to the App's PEM encoded RSA private key
    pub private_key: PathBuf,
    /// Where installation tokens are requested from
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    "https://api.github.com".to_owned()
}
