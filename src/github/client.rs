use std::time::Duration;

use anyhow::Context;
use reqwest::{header, Method};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::{context::LogContext, error::ClaError, github::ApiRequest};

const USER_AGENT: &str = "github-cla-bot";

/// Credential attached to a single request.
#[derive(Debug, Clone, Copy)]
pub enum Auth<'a> {
    /// `Authorization: token <..>`, used for every call made on behalf of the bot
    Token(&'a str),
    /// `Authorization: Bearer <..>`, used with a GitHub App JWT
    Bearer(&'a str),
    /// third-party contributor lists and webhooks get no credentials
    Anonymous,
}

/// Executes [`ApiRequest`]s, one attempt each, and sorts the outcome into success, transport
/// error or non-2xx status.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
}

impl GitHubClient {
    pub fn new() -> anyhow::Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to create http client")?;

        Ok(Self { http })
    }

    /// Performs the request and returns the raw response body.
    pub async fn execute(
        &self,
        request: &ApiRequest,
        auth: Auth<'_>,
        ctx: &LogContext,
    ) -> Result<String, ClaError> {
        let log_url = request.log_url();
        info!(correlation = %ctx.correlation_id, "API request {} {}", request.method, log_url);

        let mut builder = self.http.request(request.method.clone(), &request.url);
        builder = match auth {
            Auth::Token(token) => builder.header(header::AUTHORIZATION, format!("token {}", token)),
            Auth::Bearer(token) => builder.bearer_auth(token),
            Auth::Anonymous => builder,
        };
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|source| {
            debug!(correlation = %ctx.correlation_id, "API response {}: {}", log_url, source);
            ClaError::Transport {
                url: log_url.to_owned(),
                source,
            }
        })?;

        let status = response.status();
        debug!(correlation = %ctx.correlation_id, "API response {}: {}", log_url, status);

        // removing something that's already gone is fine
        if request.method == Method::DELETE && status.as_u16() == 404 {
            return Ok(String::new());
        }
        if !status.is_success() {
            return Err(ClaError::Status {
                url: log_url.to_owned(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| ClaError::Transport {
            url: log_url.to_owned(),
            source,
        })
    }

    /// Performs the request and decodes the JSON response body.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
        auth: Auth<'_>,
        ctx: &LogContext,
    ) -> Result<T, ClaError> {
        let body = self.execute(request, auth, ctx).await?;
        serde_json::from_str(&body).map_err(|source| ClaError::Decode {
            url: request.log_url().to_owned(),
            source,
        })
    }
}
