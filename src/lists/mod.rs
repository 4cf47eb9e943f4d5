use crate::hydrate::hydrate;
use crate::models::{HydratedItem, ListKind, TrackingItem};
use crate::tmdb::{TmdbClient, TmdbError};
use crate::trakt::{TraktClient, TraktError};
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{info, instrument, warn};

pub const PLAYBACK_LIMIT: usize = 50;
pub const MY_SCHEDULE_DAYS: u32 = 14;
pub const SCHEDULE_DAYS: u32 = 7;
pub const FAVORITES_LIMIT: usize = 50;
pub const TRENDING_SHOWS_LIMIT: usize = 15;
pub const BACKDROP_LIMIT: usize = 30;

#[derive(Debug, Error)]
pub enum ListError {
    #[error(transparent)]
    Trakt(#[from] TraktError),
    #[error(transparent)]
    Tmdb(#[from] TmdbError),
}

/// Sub-tabs served by `/api/list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Schedule,
    TraktHot,
    TmdbTrending,
}

impl Tab {
    pub fn from_query(tab: Option<&str>) -> Self {
        match tab {
            Some("schedule") => Tab::Schedule,
            Some("trakt_hot") => Tab::TraktHot,
            _ => Tab::TmdbTrending,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ListResponse {
    Hydrated(Vec<HydratedItem>),
    Raw(Vec<Value>),
}

/// Dedup key for playback entries. Show id wins over movie id, which wins
/// over the playback row's own id; kinds never collide with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackKey {
    Show(u64),
    Movie(u64),
    Entry(u64),
}

pub fn playback_key(item: &TrackingItem) -> Option<PlaybackKey> {
    if let Some(id) = item.show.as_ref().and_then(|s| s.ids.trakt) {
        return Some(PlaybackKey::Show(id));
    }
    if let Some(id) = item.movie.as_ref().and_then(|m| m.ids.trakt) {
        return Some(PlaybackKey::Movie(id));
    }
    item.id.map(PlaybackKey::Entry)
}

/// Keeps the first entry per show/movie/playback id, preserving order.
/// Entries with no id at all are dropped.
pub fn dedupe_playback(items: Vec<TrackingItem>) -> Vec<TrackingItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| playback_key(item).is_some_and(|key| seen.insert(key)))
        .collect()
}

fn liked_at_millis(item: &TrackingItem) -> i64 {
    item.liked_at
        .as_deref()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

/// Newest `liked_at` first; missing or unparseable timestamps count as the
/// epoch. Ties keep their merged order.
pub fn sort_favorites(mut items: Vec<TrackingItem>) -> Vec<TrackingItem> {
    items.sort_by_key(|item| std::cmp::Reverse(liked_at_millis(item)));
    items.truncate(FAVORITES_LIMIT);
    items
}

pub fn is_japanese_anime(item: &TrackingItem) -> bool {
    let Some(show) = &item.show else {
        return false;
    };
    let from_japan = show.country.as_deref() == Some("jp");
    let animated = show
        .genres
        .as_ref()
        .is_some_and(|g| g.iter().any(|g| g == "anime" || g == "animation"));
    from_japan && animated
}

/// The user's own calendar first (tagged `is_mine`), then public Japanese
/// anime not already present. One entry per show id; entries without a show
/// id are dropped.
pub fn merge_schedule(mine: Vec<TrackingItem>, public: Vec<TrackingItem>) -> Vec<TrackingItem> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(mine.len());

    for mut item in mine {
        if item.show_trakt_id().is_some_and(|id| seen.insert(id)) {
            item.is_mine = true;
            merged.push(item);
        }
    }
    for item in public.into_iter().filter(is_japanese_anime) {
        if item.show_trakt_id().is_some_and(|id| seen.insert(id)) {
            merged.push(item);
        }
    }
    merged
}

/// Turns a non-auth upstream failure into an empty list, the way every list
/// endpoint degrades. An expired token still surfaces.
fn or_empty(result: Result<Vec<TrackingItem>, TraktError>) -> Result<Vec<TrackingItem>, TraktError> {
    match result {
        Err(TraktError::Status { status }) => {
            warn!("Trakt list request failed with status {}, returning empty list", status);
            Ok(Vec::new())
        }
        other => other,
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn calendar_path(scope: &str, start: NaiveDate, days: u32) -> String {
    format!("calendars/{}/shows/{}/{}", scope, start.format("%Y-%m-%d"), days)
}

/// Aggregation entry points. Each borrows the per-request user token.
pub struct Lists<'a> {
    pub trakt: &'a TraktClient,
    pub tmdb: &'a TmdbClient,
    pub user_token: &'a str,
}

impl Lists<'_> {
    async fn fetch(&self, path: &str) -> Result<Vec<TrackingItem>, TraktError> {
        or_empty(self.trakt.get_items(path, Some(self.user_token)).await)
    }

    #[instrument(skip(self))]
    pub async fn continue_watching(&self) -> Result<Vec<HydratedItem>, ListError> {
        let playback = self
            .fetch(&format!("sync/playback?limit={}", PLAYBACK_LIMIT))
            .await?;
        let unique = dedupe_playback(playback);
        Ok(hydrate(self.tmdb, &unique, ListKind::Continue).await)
    }

    #[instrument(skip(self))]
    pub async fn watchlist(&self) -> Result<Vec<HydratedItem>, ListError> {
        let items = self.fetch("sync/watchlist?sort=added,desc").await?;
        Ok(hydrate(self.tmdb, &items, ListKind::Chase).await)
    }

    #[instrument(skip(self))]
    pub async fn my_schedule(&self) -> Result<Vec<HydratedItem>, ListError> {
        let items = self
            .fetch(&calendar_path("my", today(), MY_SCHEDULE_DAYS))
            .await?;
        Ok(hydrate(self.tmdb, &items, ListKind::MySchedule).await)
    }

    #[instrument(skip(self))]
    pub async fn trakt_favorites(&self) -> Result<Vec<HydratedItem>, ListError> {
        let (shows, movies) = tokio::join!(
            self.fetch("users/me/favorites/shows"),
            self.fetch("users/me/favorites/movies"),
        );
        let mut all = shows?;
        all.extend(movies?);

        let sorted = sort_favorites(all);
        Ok(hydrate(self.tmdb, &sorted, ListKind::TraktFav).await)
    }

    /// TMDB account favorites (TV only), newest first.
    #[instrument(skip(self))]
    pub async fn account_favorites(&self) -> Result<Vec<HydratedItem>, ListError> {
        let account = self.tmdb.account().await?;
        let results = self.tmdb.favorite_tv(account.id).await?;

        let items: Vec<TrackingItem> = results
            .into_iter()
            .filter_map(|mut entry| {
                entry
                    .as_object_mut()?
                    .insert("media_type".to_string(), Value::from("tv"));
                serde_json::from_value(entry).ok()
            })
            .collect();

        Ok(hydrate(self.tmdb, &items, ListKind::Favs).await)
    }

    #[instrument(skip(self))]
    pub async fn tab(&self, tab: Tab) -> Result<ListResponse, ListError> {
        match tab {
            Tab::Schedule => Ok(ListResponse::Hydrated(self.schedule().await?)),
            Tab::TraktHot => {
                let items = self
                    .fetch(&format!("shows/trending?limit={}", TRENDING_SHOWS_LIMIT))
                    .await?;
                Ok(ListResponse::Hydrated(
                    hydrate(self.tmdb, &items, ListKind::Trending).await,
                ))
            }
            Tab::TmdbTrending => match self.tmdb.trending_week().await {
                Ok(results) => Ok(ListResponse::Raw(results)),
                Err(TmdbError::Status { status }) => {
                    warn!("TMDB trending failed with status {}, returning empty list", status);
                    Ok(ListResponse::Raw(Vec::new()))
                }
                Err(e) => Err(e.into()),
            },
        }
    }

    async fn schedule(&self) -> Result<Vec<HydratedItem>, ListError> {
        let start = today();
        let mine_path = calendar_path("my", start, SCHEDULE_DAYS);
        let public_path = format!("{}?extended=full", calendar_path("all", start, SCHEDULE_DAYS));
        let (mine, public) = tokio::join!(
            self.fetch(&mine_path),
            self.fetch(&public_path),
        );

        let merged = merge_schedule(mine?, public?);
        info!("Schedule merged to {} shows", merged.len());
        Ok(hydrate(self.tmdb, &merged, ListKind::Schedule).await)
    }
}

/// Poster URLs for the login wall. Never fails; any upstream problem just
/// means fewer (or no) posters.
#[instrument(skip(trakt, tmdb))]
pub async fn backdrop_posters(trakt: &TraktClient, tmdb: &TmdbClient) -> Vec<String> {
    let movies = match trakt
        .get_items(&format!("movies/trending?limit={}", BACKDROP_LIMIT), None)
        .await
    {
        Ok(movies) => movies,
        Err(e) => {
            warn!("Backdrop trending fetch failed: {}", e);
            return Vec::new();
        }
    };

    let lookups = movies.iter().map(|item| async move {
        let id = item.movie.as_ref()?.ids.tmdb?;
        tmdb.movie_poster_url(id).await.ok().flatten()
    });

    join_all(lookups).await.into_iter().flatten().collect()
}
