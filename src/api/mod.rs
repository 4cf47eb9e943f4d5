use axum::{
    handler::HandlerWithoutStateExt,
    http::Uri,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::{ConfigError, Configuration};
use crate::http::HttpClient;
use crate::lists::Lists;
use crate::tmdb::TmdbClient;
use crate::trakt::TraktClient;

mod actions;
pub mod auth;
mod error;
mod lists;

pub use auth::UserToken;
pub use error::ApiError;

/// Upstream clients, only available once all credentials are configured.
#[derive(Clone)]
pub struct Upstreams {
    pub trakt: TraktClient,
    pub tmdb: TmdbClient,
}

impl Upstreams {
    pub fn lists<'a>(&'a self, token: &'a UserToken) -> Lists<'a> {
        Lists {
            trakt: &self.trakt,
            tmdb: &self.tmdb,
            user_token: token.as_str(),
        }
    }
}

pub struct AppState {
    pub config: Arc<Configuration>,
    upstreams: Result<Upstreams, ConfigError>,
}

impl AppState {
    pub fn new(config: Configuration) -> anyhow::Result<Self> {
        let http = HttpClient::new(&config.http)?;

        let upstreams = config.credentials().map(|creds| Upstreams {
            trakt: TraktClient::new(
                http.clone(),
                &config.trakt,
                creds.trakt_client_id,
                creds.trakt_client_secret,
            ),
            tmdb: TmdbClient::new(http, &config.tmdb, creds.tmdb_token),
        });
        if let Err(e) = &upstreams {
            warn!("Credentials incomplete, every request will fail: {}", e);
        }

        Ok(Self {
            config: Arc::new(config),
            upstreams,
        })
    }

    pub fn upstreams(&self) -> Result<&Upstreams, ApiError> {
        self.upstreams
            .as_ref()
            .map_err(|e| ApiError::Config(e.clone()))
    }
}

pub(crate) fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

pub fn router(state: Arc<AppState>) -> Router {
    let app = Router::new()
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/api/public/backdrop", get(lists::backdrop))
        .route("/api/user/continue", get(lists::continue_watching))
        .route("/api/user/watchlist", get(lists::watchlist))
        .route("/api/user/myschedule", get(lists::my_schedule))
        .route("/api/user/trakt_fav", get(lists::trakt_favorites))
        .route("/api/user/favs", get(lists::account_favorites))
        .route("/api/list", get(lists::list_tab))
        .route("/api/action", post(actions::perform));

    let app = match &state.config.server.static_dir {
        Some(dir) => app.fallback_service(
            ServeDir::new(dir).not_found_service(not_found.into_service()),
        ),
        None => app.fallback(not_found),
    };

    app.layer(middleware::from_fn(auth::require_bearer))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_credentials,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found(uri: Uri) -> Response {
    if is_api_path(uri.path()) {
        ApiError::NotFound.into_response()
    } else {
        (axum::http::StatusCode::NOT_FOUND, "Not Found").into_response()
    }
}
