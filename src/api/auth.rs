use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use super::{is_api_path, ApiError, AppState};
use crate::config::ServerConfig;
use crate::models::TokenPair;
use crate::trakt::TokenExchangeError;

/// Bearer token the client sent, forwarded to Trakt as-is.
#[derive(Debug, Clone)]
pub struct UserToken(String);

impl UserToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
}

/// Plain-text failures of the OAuth callback.
#[derive(Debug)]
pub enum AuthFailure {
    MissingCode,
    Exchange(TokenExchangeError),
    Api(ApiError),
}

impl From<ApiError> for AuthFailure {
    fn from(err: ApiError) -> Self {
        AuthFailure::Api(err)
    }
}

impl IntoResponse for AuthFailure {
    fn into_response(self) -> Response {
        match self {
            AuthFailure::MissingCode => {
                (StatusCode::BAD_REQUEST, "Login Failed: No Code provided").into_response()
            }
            AuthFailure::Exchange(e) => {
                let status = match e {
                    TokenExchangeError::Rejected { .. } => StatusCode::BAD_REQUEST,
                    TokenExchangeError::NonJson { .. } | TokenExchangeError::Transport(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                warn!("Token exchange failed: {}", e);
                (status, e.to_string()).into_response()
            }
            AuthFailure::Api(e) => e.into_response(),
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Refuses every request while the Trakt/TMDB credentials are missing.
pub async fn require_credentials(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    match state.upstreams() {
        Ok(_) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

/// Guards `/api/*` (except `/api/public/*`): the `Authorization` header must
/// be present and not the literal `Bearer null` a logged-out client sends.
/// The token is not validated here.
pub async fn require_bearer(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let path = request.uri().path();
    if !is_api_path(path) || path.starts_with("/api/public/") {
        return Ok(next.run(request).await);
    }

    let token = bearer_token(request.headers()).ok_or(ApiError::NeedLogin)?;
    request.extensions_mut().insert(token);
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<UserToken> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    if value.is_empty() || value == "Bearer null" {
        return None;
    }
    let token = value.strip_prefix("Bearer ").unwrap_or(value);
    Some(UserToken(token.to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /auth/login
/// Sends the browser to Trakt's consent page.
pub async fn login(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Response, ApiError> {
    let upstreams = state.upstreams()?;
    let redirect_uri = callback_uri(&state.config.server, &headers);
    let location = upstreams
        .trakt
        .authorize_url(&redirect_uri)
        .map_err(|e| ApiError::Internal(format!("Invalid Trakt authorize URL: {e}")))?;

    Ok((StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response())
}

/// GET /auth/callback
/// Exchanges the code and hands the token pair to the browser.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> Result<Html<String>, AuthFailure> {
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or(AuthFailure::MissingCode)?;
    let upstreams = state.upstreams()?;
    let redirect_uri = callback_uri(&state.config.server, &headers);

    let tokens = upstreams
        .trakt
        .exchange_code(&code, &redirect_uri)
        .await
        .map_err(AuthFailure::Exchange)?;

    info!("User signed in");
    Ok(Html(bootstrap_page(&tokens)))
}

pub(crate) fn request_origin(server: &ServerConfig, headers: &HeaderMap) -> String {
    if let Some(url) = &server.public_url {
        return url.trim_end_matches('/').to_string();
    }

    let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let host = header_str(header::HOST.as_str()).unwrap_or("localhost");
    let proto = header_str("x-forwarded-proto").unwrap_or("http");
    format!("{proto}://{host}")
}

fn callback_uri(server: &ServerConfig, headers: &HeaderMap) -> String {
    format!("{}/auth/callback", request_origin(server, headers))
}

/// Encodes a value as a JS literal that is safe inside a `<script>` block.
fn script_literal(value: Option<&str>) -> String {
    let literal = value.map(Value::from).unwrap_or(Value::Null).to_string();
    literal.replace("</", "<\\/")
}

pub(crate) fn bootstrap_page(tokens: &TokenPair) -> String {
    let access = script_literal(Some(&tokens.access_token));
    let refresh = script_literal(tokens.refresh_token.as_deref());

    format!(
        r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1">
<style>body{{font-family:sans-serif;text-align:center;padding:50px;background:#111;color:#fff}}</style></head>
<body><h3>Signed in</h3><p>Redirecting...</p>
<script>
    localStorage.setItem('trakt_token', {access});
    localStorage.setItem('trakt_refresh', {refresh});
    setTimeout(() => {{ window.location.href = '/'; }}, 300);
</script></body></html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_null_is_not_a_token() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer null"));
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers).unwrap().as_str(), "abc123");
    }

    #[test]
    fn origin_prefers_public_url() {
        let mut server = ServerConfig::default();
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("deck.local:8787"));
        assert_eq!(request_origin(&server, &headers), "http://deck.local:8787");

        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert_eq!(request_origin(&server, &headers), "https://deck.local:8787");

        server.public_url = Some("https://deck.example.com/".to_string());
        assert_eq!(request_origin(&server, &headers), "https://deck.example.com");
    }

    #[test]
    fn bootstrap_page_escapes_tokens() {
        let page = bootstrap_page(&TokenPair {
            access_token: "abc</script><script>alert(1)".to_string(),
            refresh_token: None,
            token_type: None,
            expires_in: None,
            scope: None,
            created_at: None,
        });
        assert!(page.contains(r#"localStorage.setItem('trakt_token', "abc<\/script><script>alert(1)");"#));
        assert!(page.contains("localStorage.setItem('trakt_refresh', null);"));
        assert!(!page.contains("abc</script>"));
    }
}
