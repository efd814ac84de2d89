use super::error::{error_detail, ApiError};
use crate::model::{CategorizedFeed, ChannelPreferences, DurationSetting, RefreshOutcome};
use crate::util::validate_server_url;
use chrono::Utc;
use futures::StreamExt;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

const MAX_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Backend root, e.g. `http://127.0.0.1:8000`.
    pub base_url: String,
    /// Budget for ordinary requests, covering send and body read.
    pub request_timeout: Duration,
    /// Budget for `/api/refresh`, which re-queries upstream sources.
    pub refresh_timeout: Duration,
    /// Append `?t=<millis>` to feed fetches so intermediaries never serve a stale copy.
    pub cache_bust: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout: Duration::from_secs(15),
            refresh_timeout: Duration::from_secs(120),
            cache_bust: true,
        }
    }
}

#[derive(Serialize)]
struct CategoryBody<'a> {
    category: &'a str,
}

#[derive(Serialize)]
struct AssignChannelBody<'a> {
    channel: &'a str,
    category: &'a str,
}

/// Typed client for the dashboard backend.
///
/// Cheap to clone: the underlying `reqwest::Client` shares its connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    request_timeout: Duration,
    refresh_timeout: Duration,
    cache_bust: bool,
    max_body_size: usize,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let base = validate_server_url(&settings.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{} ({})", settings.base_url, e)))?;

        let http = reqwest::Client::builder()
            .redirect(Policy::limited(3))
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Duration::from_secs(30))
            .connect_timeout(settings.request_timeout)
            .user_agent(concat!("vidboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            http,
            base,
            request_timeout: settings.request_timeout,
            refresh_timeout: settings.refresh_timeout,
            cache_bust: settings.cache_bust,
            max_body_size: MAX_BODY_SIZE,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_max_body_size(mut self, limit: usize) -> Self {
        self.max_body_size = limit;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    // ------------------------------------------------------------------------
    // Feed
    // ------------------------------------------------------------------------

    /// `GET /videos.json`, cache-busted unless disabled.
    pub async fn fetch_feed(&self) -> Result<CategorizedFeed, ApiError> {
        let mut url = self.endpoint(&["videos.json"])?;
        if self.cache_bust {
            url.query_pairs_mut()
                .append_pair("t", &Utc::now().timestamp_millis().to_string());
        }
        let feed: CategorizedFeed = self.get_json(url, self.request_timeout).await?;
        tracing::debug!(
            categories = feed.categories().len(),
            videos = feed.video_count(),
            "Fetched feed"
        );
        Ok(feed)
    }

    /// `GET /api/refresh`: asks the backend to re-collect from upstream.
    ///
    /// One blocking round trip under the long refresh timeout.
    pub async fn refresh(&self) -> Result<RefreshOutcome, ApiError> {
        let url = self.endpoint(&["api", "refresh"])?;
        tracing::info!(timeout = ?self.refresh_timeout, "Requesting backend refresh");
        self.get_json(url, self.refresh_timeout).await
    }

    // ------------------------------------------------------------------------
    // Categories and channels
    // ------------------------------------------------------------------------

    /// `GET /api/categories`
    pub async fn fetch_preferences(&self) -> Result<ChannelPreferences, ApiError> {
        let url = self.endpoint(&["api", "categories"])?;
        self.get_json(url, self.request_timeout).await
    }

    /// `POST /api/categories` with `{category}`
    pub async fn create_category(&self, name: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "categories"])?;
        let request = self.http.post(url).json(&CategoryBody { category: name });
        self.execute(request, self.request_timeout).await?;
        Ok(())
    }

    /// `DELETE /api/categories/{name}`
    pub async fn delete_category(&self, name: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "categories", name])?;
        self.execute(self.http.delete(url), self.request_timeout)
            .await?;
        Ok(())
    }

    /// `POST /api/channels` with `{channel, category}`
    pub async fn assign_channel(&self, channel: &str, category: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "channels"])?;
        let request = self
            .http
            .post(url)
            .json(&AssignChannelBody { channel, category });
        self.execute(request, self.request_timeout).await?;
        Ok(())
    }

    /// `DELETE /api/channels/{name}`, scoped by a `{category}` body when given.
    pub async fn unassign_channel(
        &self,
        channel: &str,
        category: Option<&str>,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "channels", channel])?;
        let mut request = self.http.delete(url);
        if let Some(category) = category {
            request = request.json(&CategoryBody { category });
        }
        self.execute(request, self.request_timeout).await?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Retention window
    // ------------------------------------------------------------------------

    /// `GET /api/settings/duration`
    pub async fn fetch_duration(&self) -> Result<DurationSetting, ApiError> {
        let url = self.endpoint(&["api", "settings", "duration"])?;
        self.get_json(url, self.request_timeout).await
    }

    /// `POST /api/settings/duration` with `{days, months}`
    pub async fn save_duration(&self, setting: DurationSetting) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "settings", "duration"])?;
        let request = self.http.post(url).json(&setting);
        self.execute(request, self.request_timeout).await?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------------

    /// Append percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        timeout: Duration,
    ) -> Result<T, ApiError> {
        let body = self.execute(self.http.get(url), timeout).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Send a request and return the body of a 2xx response.
    ///
    /// Non-2xx responses become `HttpStatus` with the body's detail.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> Result<Vec<u8>, ApiError> {
        let exchange = async {
            let response = request.send().await.map_err(ApiError::Network)?;
            let status = response.status();
            let url = response.url().clone();
            let body = read_limited_body(response, self.max_body_size).await?;

            if !status.is_success() {
                let detail = error_detail(&body);
                tracing::debug!(
                    url = %url,
                    status = status.as_u16(),
                    detail = %detail,
                    "Backend returned error status"
                );
                return Err(ApiError::HttpStatus {
                    status: status.as_u16(),
                    detail,
                });
            }

            tracing::trace!(url = %url, bytes = body.len(), "Backend request succeeded");
            Ok(body)
        };

        tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| ApiError::Timeout(timeout))?
    }
}

/// Read the response body, refusing anything over `max_size` bytes.
async fn read_limited_body(
    response: reqwest::Response,
    max_size: usize,
) -> Result<Vec<u8>, ApiError> {
    if let Some(len) = response.content_length() {
        if len > max_size as u64 {
            return Err(ApiError::ResponseTooLarge(max_size));
        }
    }

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::Network)?;
        if body.len() + chunk.len() > max_size {
            return Err(ApiError::ResponseTooLarge(max_size));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
