use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_TRAKT_BASE_URL: &str = "https://api.trakt.tv";
pub const DEFAULT_TRAKT_AUTHORIZE_URL: &str = "https://trakt.tv/oauth/authorize";
pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Error: please configure {} (config file or environment)", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Configuration {
    pub server: ServerConfig,
    pub trakt: TraktConfig,
    pub tmdb: TmdbConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    #[serde(rename = "publicUrl")]
    pub public_url: Option<String>,
    #[serde(rename = "staticDir")]
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8787".to_string(),
            public_url: None,
            static_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TraktConfig {
    #[serde(rename = "clientId")]
    pub client_id: Option<String>,
    #[serde(rename = "clientSecret")]
    pub client_secret: Option<String>,
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    #[serde(rename = "authorizeUrl")]
    pub authorize_url: String,
}

impl Default for TraktConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            base_url: DEFAULT_TRAKT_BASE_URL.to_string(),
            authorize_url: DEFAULT_TRAKT_AUTHORIZE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TmdbConfig {
    pub token: Option<String>,
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    #[serde(rename = "imageBaseUrl")]
    pub image_base_url: String,
    pub language: String,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: DEFAULT_TMDB_BASE_URL.to_string(),
            image_base_url: DEFAULT_TMDB_IMAGE_BASE_URL.to_string(),
            language: "zh-CN".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    #[serde(rename = "timeoutSeconds")]
    pub timeout_seconds: u64,
    #[serde(rename = "userAgent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: concat!("watchdeck/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// The three secrets every request needs, resolved and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub trakt_client_id: String,
    pub trakt_client_secret: String,
    pub tmdb_token: String,
}

impl Configuration {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Configuration = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise starts from defaults, then
    /// applies the `TRAKT_ID`, `TRAKT_SECRET` and `TMDB_TOKEN` overrides.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(id) = lookup("TRAKT_ID") {
            self.trakt.client_id = Some(id);
        }
        if let Some(secret) = lookup("TRAKT_SECRET") {
            self.trakt.client_secret = Some(secret);
        }
        if let Some(token) = lookup("TMDB_TOKEN") {
            self.tmdb.token = Some(token);
        }
    }

    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        fn present(value: &Option<String>) -> Option<String> {
            value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
        }

        let id = present(&self.trakt.client_id);
        let secret = present(&self.trakt.client_secret);
        let token = present(&self.tmdb.token);

        match (id, secret, token) {
            (Some(trakt_client_id), Some(trakt_client_secret), Some(tmdb_token)) => {
                Ok(Credentials {
                    trakt_client_id,
                    trakt_client_secret,
                    tmdb_token,
                })
            }
            (id, secret, token) => {
                let mut missing = Vec::new();
                if id.is_none() {
                    missing.push("TRAKT_ID");
                }
                if secret.is_none() {
                    missing.push("TRAKT_SECRET");
                }
                if token.is_none() {
                    missing.push("TMDB_TOKEN");
                }
                Err(ConfigError::MissingCredentials(missing))
            }
        }
    }
}
