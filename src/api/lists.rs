use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, AppState, UserToken};
use crate::lists::{backdrop_posters, ListResponse, Tab};
use crate::models::HydratedItem;

type ListResult = Result<Json<Vec<HydratedItem>>, ApiError>;

#[derive(Deserialize)]
pub struct ListQuery {
    tab: Option<String>,
}

/// GET /api/public/backdrop
pub async fn backdrop(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, ApiError> {
    let upstreams = state.upstreams()?;
    Ok(Json(backdrop_posters(&upstreams.trakt, &upstreams.tmdb).await))
}

/// GET /api/user/continue
pub async fn continue_watching(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<UserToken>,
) -> ListResult {
    let lists = state.upstreams()?.lists(&token);
    Ok(Json(lists.continue_watching().await?))
}

/// GET /api/user/watchlist
pub async fn watchlist(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<UserToken>,
) -> ListResult {
    let lists = state.upstreams()?.lists(&token);
    Ok(Json(lists.watchlist().await?))
}

/// GET /api/user/myschedule
pub async fn my_schedule(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<UserToken>,
) -> ListResult {
    let lists = state.upstreams()?.lists(&token);
    Ok(Json(lists.my_schedule().await?))
}

/// GET /api/user/trakt_fav
pub async fn trakt_favorites(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<UserToken>,
) -> ListResult {
    let lists = state.upstreams()?.lists(&token);
    Ok(Json(lists.trakt_favorites().await?))
}

/// GET /api/user/favs
pub async fn account_favorites(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<UserToken>,
) -> ListResult {
    let lists = state.upstreams()?.lists(&token);
    Ok(Json(lists.account_favorites().await?))
}

/// GET /api/list?tab=schedule|trakt_hot|...
pub async fn list_tab(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<UserToken>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let lists = state.upstreams()?.lists(&token);
    let tab = Tab::from_query(query.tab.as_deref());
    Ok(Json(lists.tab(tab).await?))
}
