use crate::config::TraktConfig;
use crate::http::HttpClient;
use crate::models::{TokenPair, TrackingItem};
use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

const API_VERSION: &str = "2";

#[derive(Debug, Error)]
pub enum TraktError {
    #[error("Trakt rejected the user token")]
    Unauthorized,
    #[error("Trakt request failed with status {status}")]
    Status { status: u16 },
    #[error("Trakt request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Trakt returned an unreadable body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure modes of the authorization-code exchange. Each has its own
/// message so the caller can tell them apart.
#[derive(Debug, Error)]
pub enum TokenExchangeError {
    #[error("Trakt Error: Non-JSON response.\n{snippet}")]
    NonJson { snippet: String },
    #[error("Auth Error: {description}")]
    Rejected { description: String },
    #[error("System Error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'static str,
}

#[derive(Clone)]
pub struct TraktClient {
    http: HttpClient,
    base_url: String,
    authorize_url: String,
    client_id: String,
    client_secret: String,
}

impl TraktClient {
    pub fn new(http: HttpClient, config: &TraktConfig, client_id: String, client_secret: String) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            authorize_url: config.authorize_url.clone(),
            client_id,
            client_secret,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn headers(&self, request: RequestBuilder, user_token: Option<&str>) -> RequestBuilder {
        let request = request
            .header("trakt-api-version", API_VERSION)
            .header("trakt-api-key", &self.client_id);
        match user_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Browser-facing authorize URL the login route redirects to.
    pub fn authorize_url(&self, redirect_uri: &str) -> Result<url::Url, url::ParseError> {
        url::Url::parse_with_params(
            &self.authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri),
            ],
        )
    }

    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenPair, TokenExchangeError> {
        info!("Exchanging authorization code for a token pair");

        let body = TokenRequest {
            code,
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            redirect_uri,
            grant_type: "authorization_code",
        };
        let response = self
            .http
            .post_json(&self.url("oauth/token"), &body, |r| r)
            .await?;
        let status = response.status();
        let text = response.text().await?;

        parse_token_response(status, &text)
    }

    /// Fetches a list endpoint. A body that is not a JSON array yields an
    /// empty list; entries that don't look like tracking items are skipped.
    #[instrument(skip(self, user_token))]
    pub async fn get_items(&self, path: &str, user_token: Option<&str>) -> Result<Vec<TrackingItem>, TraktError> {
        let response = self
            .http
            .get(&self.url(path), |r| self.headers(r, user_token))
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(TraktError::Unauthorized),
            status if !status.is_success() => {
                return Err(TraktError::Status { status: status.as_u16() })
            }
            _ => {}
        }

        let body: Value = response.json().await?;
        let items = parse_items(body);
        debug!("Retrieved {} items from {}", items.len(), path);
        Ok(items)
    }

    /// Posts a sync mutation and hands back whatever JSON Trakt answered.
    #[instrument(skip(self, payload, user_token))]
    pub async fn sync(&self, endpoint: &str, payload: &Value, user_token: &str) -> Result<Value, TraktError> {
        info!("Forwarding sync mutation to {}", endpoint);
        let response = self
            .http
            .post_json(&self.url(endpoint), payload, |r| self.headers(r, Some(user_token)))
            .await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

pub(crate) fn parse_items(body: Value) -> Vec<TrackingItem> {
    let Value::Array(entries) = body else {
        warn!("Expected a JSON array from Trakt, got something else");
        return Vec::new();
    };

    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<TrackingItem>(entry) {
            Ok(item) => Some(item),
            Err(e) => {
                debug!("Skipping unrecognised Trakt entry: {}", e);
                None
            }
        })
        .collect()
}

pub(crate) fn parse_token_response(status: StatusCode, text: &str) -> Result<TokenPair, TokenExchangeError> {
    let body: Value = serde_json::from_str(text).map_err(|_| TokenExchangeError::NonJson {
        snippet: text.chars().take(200).collect(),
    })?;

    let has_token = body
        .get("access_token")
        .and_then(Value::as_str)
        .is_some_and(|t| !t.is_empty());

    if !status.is_success() || !has_token {
        let description = body
            .get("error_description")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string());
        return Err(TokenExchangeError::Rejected { description });
    }

    serde_json::from_value(body).map_err(|e| TokenExchangeError::Rejected {
        description: e.to_string(),
    })
}
