use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use tracing::info;

use crate::{
    context::LogContext,
    error::ClaError,
    github::{api, types::InstallationToken, Auth, GitHubClient},
};

/// Supplies the credential the bot acts with for one webhook.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(
        &self,
        installation_id: Option<u64>,
        ctx: &LogContext,
    ) -> Result<String, ClaError>;
}

/// Bot installed as a plain webhook: always acts with the same access token.
pub struct StaticToken(pub String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self, _: Option<u64>, ctx: &LogContext) -> Result<String, ClaError> {
        info!(correlation = %ctx.correlation_id, "Bot installed as a webhook, using access token");
        Ok(self.0.clone())
    }
}

/// Bot installed as a GitHub App: exchanges a short-lived app JWT for an installation token.
pub struct InstallationTokens {
    app_id: u64,
    key: EncodingKey,
    api_url: String,
    client: GitHubClient,
}

#[derive(Debug, Serialize)]
struct Claims {
    iat: u64,
    exp: u64,
    iss: u64,
}

impl InstallationTokens {
    pub fn new(
        app_id: u64,
        private_key_pem: &[u8],
        api_url: impl Into<String>,
        client: GitHubClient,
    ) -> Result<Self, ClaError> {
        Ok(Self {
            app_id,
            key: EncodingKey::from_rsa_pem(private_key_pem)?,
            api_url: api_url.into(),
            client,
        })
    }

    fn app_jwt(&self) -> Result<String, ClaError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        // backdated to absorb clock drift with GitHub
        let claims = Claims {
            iat: now.saturating_sub(60),
            exp: now + 600,
            iss: self.app_id,
        };

        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.key,
        )?)
    }
}

#[async_trait]
impl TokenProvider for InstallationTokens {
    async fn token(
        &self,
        installation_id: Option<u64>,
        ctx: &LogContext,
    ) -> Result<String, ClaError> {
        let installation_id = installation_id.ok_or(ClaError::MissingInstallation)?;
        info!(
            correlation = %ctx.correlation_id,
            "Bot installed as an integration, obtaining installation token"
        );

        let jwt = self.app_jwt()?;
        let request = api::installation_token(&self.api_url, installation_id);
        let response: InstallationToken = self
            .client
            .execute_json(&request, Auth::Bearer(&jwt), ctx)
            .await?;

        Ok(response.token)
    }
}
