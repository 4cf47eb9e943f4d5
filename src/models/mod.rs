use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Keys the hydration layer owns on a [`HydratedItem`]. Metadata records
/// lose these before flattening so each key is serialized exactly once.
pub const DERIVED_KEYS: &[&str] = &[
    "media_type",
    "trakt_type",
    "air_time_iso",
    "episode_info",
    "origin_country",
    "genres",
    "runtime_real",
    "episode_image",
    "next_ep_date",
    "last_ep_date",
    "last_ep_info",
    "total_seasons",
    "total_episodes",
    "status",
    "watch_progress",
    "is_tracking",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Tv,
    Movie,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Tv => "tv",
            MediaType::Movie => "movie",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which list an item was hydrated for; echoed to the client as `trakt_type`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Continue,
    Chase,
    #[serde(rename = "myschedule")]
    MySchedule,
    TraktFav,
    Schedule,
    Trending,
    Favs,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MediaIds {
    pub trakt: Option<u64>,
    pub tmdb: Option<u64>,
}

/// The `show` or `movie` half of a Trakt item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MediaRef {
    #[serde(default)]
    pub ids: MediaIds,
    pub country: Option<String>,
    pub genres: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpisodeRef {
    pub season: u32,
    pub number: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A raw entry from a Trakt sync/calendar/favorites/trending endpoint, or a
/// TMDB account favorite tagged with its `media_type`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrackingItem {
    pub id: Option<u64>,
    pub media_type: Option<String>,
    pub show: Option<MediaRef>,
    pub movie: Option<MediaRef>,
    pub episode: Option<EpisodeRef>,
    pub progress: Option<f64>,
    pub first_aired: Option<String>,
    pub paused_at: Option<String>,
    pub liked_at: Option<String>,
    pub collected_at: Option<String>,
    #[serde(default)]
    pub is_mine: bool,
}

impl TrackingItem {
    /// First timestamp present, in the order the lists care about.
    pub fn air_time(&self) -> Option<&str> {
        self.first_aired
            .as_deref()
            .or(self.paused_at.as_deref())
            .or(self.liked_at.as_deref())
            .or(self.collected_at.as_deref())
    }

    /// Resolves the metadata lookup key. `None` means the item cannot be
    /// hydrated and must be dropped.
    pub fn metadata_target(&self) -> Option<(MediaType, u64)> {
        if let Some(show) = &self.show {
            return show.ids.tmdb.map(|id| (MediaType::Tv, id));
        }
        if let Some(movie) = &self.movie {
            return movie.ids.tmdb.map(|id| (MediaType::Movie, id));
        }
        let media_type = match self.media_type.as_deref() {
            None | Some("tv") => MediaType::Tv,
            Some("movie") => MediaType::Movie,
            Some(_) => return None,
        };
        self.id.map(|id| (media_type, id))
    }

    pub fn show_trakt_id(&self) -> Option<u64> {
        self.show.as_ref().and_then(|s| s.ids.trakt)
    }
}

/// Token pair returned by the OAuth token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
    pub scope: Option<String>,
    pub created_at: Option<u64>,
}

/// A metadata record merged with the tracking item it came from.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HydratedItem {
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
    pub media_type: MediaType,
    pub trakt_type: ListKind,
    pub air_time_iso: Option<String>,
    pub episode_info: Option<EpisodeRef>,
    pub origin_country: Value,
    pub genres: Value,
    pub runtime_real: Option<Value>,
    pub episode_image: Option<String>,
    pub next_ep_date: Option<Value>,
    pub last_ep_date: Option<Value>,
    pub last_ep_info: Option<Value>,
    pub total_seasons: Option<Value>,
    pub total_episodes: Option<Value>,
    pub status: Option<Value>,
    pub watch_progress: Option<f64>,
    pub is_tracking: bool,
}

impl HydratedItem {
    pub fn build(
        item: &TrackingItem,
        media_type: MediaType,
        kind: ListKind,
        mut metadata: Map<String, Value>,
        episode_image: Option<String>,
    ) -> Self {
        let mut take = |key: &str| metadata.remove(key).filter(|v| !v.is_null());

        let origin_country = take("origin_country").unwrap_or_else(|| Value::Array(Vec::new()));
        let genres = take("genres").unwrap_or_else(|| Value::Array(Vec::new()));
        let status = take("status");
        let runtime = take("runtime");
        let episode_run_time = take("episode_run_time");
        let next_episode = take("next_episode_to_air");
        let last_air_date = take("last_air_date");
        let last_episode = take("last_episode_to_air");
        let seasons = take("number_of_seasons");
        let episodes = take("number_of_episodes");

        let runtime_real = runtime.clone().filter(is_truthy_number).or_else(|| {
            episode_run_time
                .as_ref()
                .and_then(|v| v.as_array())
                .and_then(|a| a.first())
                .cloned()
        });
        let next_ep_date = next_episode
            .as_ref()
            .and_then(|ep| ep.get("air_date"))
            .filter(|v| !v.is_null())
            .cloned();

        // Put back the source fields the client also reads directly.
        for (key, value) in [
            ("runtime", runtime),
            ("episode_run_time", episode_run_time),
            ("next_episode_to_air", next_episode),
            ("last_air_date", last_air_date.clone()),
            ("last_episode_to_air", last_episode.clone()),
            ("number_of_seasons", seasons.clone()),
            ("number_of_episodes", episodes.clone()),
        ] {
            if let Some(value) = value {
                metadata.insert(key.to_string(), value);
            }
        }
        for key in DERIVED_KEYS {
            metadata.remove(*key);
        }

        let watch_progress = match kind {
            ListKind::Continue => item.progress,
            _ => None,
        };

        Self {
            metadata,
            media_type,
            trakt_type: kind,
            air_time_iso: item.air_time().map(str::to_string),
            episode_info: item.episode.clone(),
            origin_country,
            genres,
            runtime_real,
            episode_image,
            next_ep_date,
            last_ep_date: last_air_date,
            last_ep_info: last_episode,
            total_seasons: seasons,
            total_episodes: episodes,
            status,
            watch_progress,
            is_tracking: item.is_mine,
        }
    }
}

fn is_truthy_number(value: &Value) -> bool {
    value.as_f64().is_some_and(|n| n != 0.0)
}
