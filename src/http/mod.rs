use crate::config::HttpConfig;
use anyhow::Result;
use reqwest::{Client, Method, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Shared upstream client. Cloning is cheap; the connection pool is shared.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Non-success statuses are returned, not turned into errors; callers
    /// decide what a 401 or 404 means.
    async fn send(request: RequestBuilder) -> reqwest::Result<Response> {
        let response = request.send().await?;

        if !response.status().is_success() {
            warn!("Upstream responded with status: {}", response.status());
        }

        Ok(response)
    }

    #[instrument(skip_all, fields(url = %url))]
    pub async fn get(&self, url: &str, configure: impl FnOnce(RequestBuilder) -> RequestBuilder) -> reqwest::Result<Response> {
        debug!("Making GET request");
        Self::send(configure(self.request(Method::GET, url))).await
    }

    #[instrument(skip_all, fields(url = %url))]
    pub async fn post_json<B: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        configure: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> reqwest::Result<Response> {
        debug!("Making POST request");
        Self::send(configure(self.request(Method::POST, url).json(body))).await
    }
}
