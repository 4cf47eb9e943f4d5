use crate::config::TmdbConfig;
use crate::http::HttpClient;
use crate::models::MediaType;
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum TmdbError {
    #[error("TMDB request failed with status {status}")]
    Status { status: u16 },
    #[error("TMDB request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct EpisodeDetails {
    still_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MovieDetails {
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Account {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
struct Paged {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Clone)]
pub struct TmdbClient {
    http: HttpClient,
    token: String,
    base_url: String,
    image_base_url: String,
    language: String,
}

impl TmdbClient {
    pub fn new(http: HttpClient, config: &TmdbConfig, token: String) -> Self {
        Self {
            http,
            token,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_base_url: config.image_base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Response, TmdbError> {
        let response = self
            .http
            .get(&self.url(path), |r| r.bearer_auth(&self.token).query(query))
            .await?;

        if !response.status().is_success() {
            return Err(TmdbError::Status {
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, TmdbError> {
        Ok(self.get(path, query).await?.json::<T>().await?)
    }

    /// Full detail record for a show or movie, kept as an open object.
    #[instrument(skip(self))]
    pub async fn details(&self, media_type: MediaType, id: u64) -> Result<Map<String, Value>, TmdbError> {
        let path = format!("{}/{}", media_type, id);
        self.get_json(&path, &[("language", self.language.as_str())]).await
    }

    #[instrument(skip(self))]
    pub async fn episode_still(&self, show_id: u64, season: u32, number: u32) -> Result<Option<String>, TmdbError> {
        let path = format!("tv/{}/season/{}/episode/{}", show_id, season, number);
        let episode: EpisodeDetails = self.get_json(&path, &[("language", self.language.as_str())]).await?;
        Ok(episode.still_path)
    }

    /// Poster URL for the login wall. Always requested in English so the
    /// artwork is the original release poster.
    #[instrument(skip(self))]
    pub async fn movie_poster_url(&self, id: u64) -> Result<Option<String>, TmdbError> {
        let path = format!("movie/{}", id);
        let movie: MovieDetails = self.get_json(&path, &[("language", "en-US")]).await?;
        Ok(movie
            .poster_path
            .map(|p| format!("{}/w342{}", self.image_base_url, p)))
    }

    #[instrument(skip(self))]
    pub async fn trending_week(&self) -> Result<Vec<Value>, TmdbError> {
        let page: Paged = self
            .get_json("trending/all/week", &[("language", self.language.as_str())])
            .await?;
        debug!("TMDB trending returned {} results", page.results.len());
        Ok(page.results)
    }

    #[instrument(skip(self))]
    pub async fn account(&self) -> Result<Account, TmdbError> {
        self.get_json("account", &[]).await
    }

    #[instrument(skip(self))]
    pub async fn favorite_tv(&self, account_id: u64) -> Result<Vec<Value>, TmdbError> {
        let path = format!("account/{}/favorite/tv", account_id);
        let page: Paged = self
            .get_json(
                &path,
                &[("language", self.language.as_str()), ("sort_by", "created_at.desc")],
            )
            .await?;
        Ok(page.results)
    }
}
