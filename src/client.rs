//! Backend API client
//!
//! Composes the retrying fetch with a per-client TTL cache: JSON reads are
//! served from the cache while fresh and fetched (with retry) otherwise;
//! writes always go to the network and are never cached.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::cache::{cache_key, TtlCache};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::fetch::{fetch_with_retry, RequestSpec, RetryOptions};

/// Client for the Vorex backend API
#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    retry: RetryOptions,
    cache: TtlCache<Value>,
}

impl ApiClient {
    /// Creates a client from configuration with its own HTTP client.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(config.timeout()).build()?;
        Self::with_client(http, config)
    }

    /// Creates a client around an existing HTTP client.
    pub fn with_client(http: Client, config: &ClientConfig) -> Result<Self, ApiError> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| ApiError::InvalidRequest(format!("base URL '{}': {}", config.base_url, e)))?;

        Ok(Self {
            http,
            base_url,
            retry: config.retry_options(),
            cache: TtlCache::new(config.cache_ttl_minutes),
        })
    }

    /// Replaces the retry options, e.g. to attach an `on_retry` callback.
    pub fn with_retry_options(mut self, retry: RetryOptions) -> Self {
        self.retry = retry;
        self
    }

    /// The response cache owned by this client
    pub fn cache(&self) -> &TtlCache<Value> {
        &self.cache
    }

    /// Drops every cached response.
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    /// Resolves `path` against the base URL and appends `query`.
    pub fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidRequest(format!("path '{}': {}", path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Fetches and decodes a JSON resource, consulting the cache first.
    ///
    /// # Returns
    /// * `Ok(T)` - From the cache if fresh, otherwise from the network
    /// * `Err(ApiError::Http)` - The server answered with a non-2xx status
    /// * `Err(ApiError)` - Transport failure after retries, or bad JSON
    #[instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path, query)?;
        let key = cache_key(&url);

        if let Some(cached) = self.cache.get(&key) {
            debug!(key = %key, "Cache hit");
            return Ok(serde_json::from_value(cached)?);
        }
        debug!(key = %key, "Cache miss, fetching");

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let request = RequestSpec::get().with_headers(headers);

        let response = fetch_with_retry(&self.http, url.as_str(), &request, &self.retry).await?;
        let value = read_json(response).await?;
        self.cache.set(key, value.clone());
        Ok(serde_json::from_value(value)?)
    }

    /// Sends `body` as JSON and decodes the JSON reply. Never cached.
    #[instrument(skip(self, body))]
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path, &[])?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let request = RequestSpec::new(Method::POST)
            .with_headers(headers)
            .with_body(serde_json::to_vec(body)?);

        let response = fetch_with_retry(&self.http, url.as_str(), &request, &self.retry).await?;
        let value = read_json(response).await?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Turns a non-2xx response into `ApiError::Http` and parses the body
/// otherwise. An empty body reads as `null`.
async fn read_json(response: Response) -> Result<Value, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::from_status(status));
    }
    let body = response.bytes().await?;
    if body.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&body)?)
}
