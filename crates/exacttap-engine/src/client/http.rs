//! `reqwest`-backed [`MarketingApi`] implementation.
//!
//! Connecting performs the OAuth client-credentials exchange once; the
//! resulting bearer token is the session handle every accessor shares.

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{ApiError, Filter, MarketingApi, RetrieveRequest, Row};
use crate::config::TapConfig;

const LEGACY_AUTH_URL: &str = "https://auth.exacttargetapis.com";
const LEGACY_REST_URL: &str = "https://www.exacttargetapis.com";
const RETRIEVE_PATH: &str = "/data/v1/retrieve";
/// Guards against an upstream that keeps answering `moreResults: true`.
const MAX_PAGES: usize = 100_000;

/// Authenticated HTTP session against the marketing API.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    http: Client,
    rest_url: String,
    access_token: String,
}

#[derive(Serialize)]
#[serde(untagged)]
enum TokenRequest<'a> {
    Tenant {
        grant_type: &'static str,
        client_id: &'a str,
        client_secret: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    Legacy {
        client_id: &'a str,
        client_secret: &'a str,
    },
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(alias = "accessToken")]
    access_token: String,
    #[serde(default)]
    rest_instance_url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveBody<'a> {
    object_type: &'a str,
    properties: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    continue_request: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrievePage {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    more_results: bool,
    #[serde(default)]
    request_id: Option<String>,
}

impl HttpApiClient {
    /// Authenticate with the client credentials from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the HTTP client cannot be built or the token
    /// exchange fails.
    pub async fn connect(config: &TapConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(transport)?;

        let (token_url, body) = match &config.tenant_subdomain {
            Some(subdomain) => {
                let base = config.auth_url.clone().unwrap_or_else(|| {
                    format!("https://{subdomain}.auth.marketingcloudapis.com")
                });
                (
                    format!("{}/v2/token", base.trim_end_matches('/')),
                    TokenRequest::Tenant {
                        grant_type: "client_credentials",
                        client_id: &config.client_id,
                        client_secret: &config.client_secret,
                    },
                )
            }
            None => {
                let base = config.auth_url.as_deref().unwrap_or(LEGACY_AUTH_URL);
                (
                    format!("{}/v1/requestToken", base.trim_end_matches('/')),
                    TokenRequest::Legacy {
                        client_id: &config.client_id,
                        client_secret: &config.client_secret,
                    },
                )
            }
        };

        tracing::debug!(url = %token_url, "Requesting access token");
        let response = http
            .post(&token_url)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let token: TokenResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(format!("token response: {e}")))?;

        let rest_url = config
            .rest_url
            .clone()
            .or(token.rest_instance_url)
            .or_else(|| {
                config
                    .tenant_subdomain
                    .as_ref()
                    .map(|s| format!("https://{s}.rest.marketingcloudapis.com"))
            })
            .unwrap_or_else(|| LEGACY_REST_URL.to_string());

        tracing::info!(rest_url = %rest_url, "Authenticated");
        Ok(Self {
            http,
            rest_url: rest_url.trim_end_matches('/').to_string(),
            access_token: token.access_token,
        })
    }

    async fn fetch_page(
        &self,
        request: &RetrieveRequest,
        continue_request: Option<&str>,
    ) -> Result<RetrievePage, ApiError> {
        let body = RetrieveBody {
            object_type: &request.object_type,
            properties: &request.properties,
            filter: request.filter.as_ref(),
            continue_request,
        };
        let response = self
            .http
            .post(format!("{}{RETRIEVE_PATH}", self.rest_url))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(format!("{} page: {e}", request.object_type)))
    }
}

impl MarketingApi for HttpApiClient {
    async fn retrieve(&self, request: &RetrieveRequest) -> Result<Vec<Row>, ApiError> {
        let mut rows = Vec::new();
        let mut continuation: Option<String> = None;

        for page_no in 1..=MAX_PAGES {
            let page = self.fetch_page(request, continuation.as_deref()).await?;
            tracing::debug!(
                object_type = request.object_type,
                page = page_no,
                rows = page.results.len(),
                "Fetched page"
            );

            for value in page.results {
                match value {
                    Value::Object(row) => rows.push(row),
                    other => {
                        return Err(ApiError::Decode(format!(
                            "{} row is not an object: {other}",
                            request.object_type
                        )))
                    }
                }
            }

            if !page.more_results {
                return Ok(rows);
            }
            continuation = match page.request_id {
                Some(id) => Some(id),
                None => {
                    return Err(ApiError::Decode(
                        "moreResults without a requestId".to_string(),
                    ))
                }
            };
        }

        Err(ApiError::Decode(format!(
            "{} exceeded {MAX_PAGES} pages",
            request.object_type
        )))
    }
}

fn transport(err: reqwest::Error) -> ApiError {
    ApiError::Transport {
        timeout: err.is_timeout(),
        message: err.to_string(),
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let retry_after_ms = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| secs.saturating_mul(1000));
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
        retry_after_ms,
    })
}
