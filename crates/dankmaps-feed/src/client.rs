//! HTTP client for the store directory backend.
//!
//! Wraps `reqwest` with typed error classification ([`FeedError`]), optional
//! retry with back-off, and normalization of wire records into
//! [`StoreRecord`]s.

use std::time::Duration;

use dankmaps_core::{AppConfig, StoreRecord};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::FeedError;
use crate::normalize::{normalize_record, normalize_records};
use crate::retry::retry_with_backoff;
use crate::types::WireStoreRecord;
use crate::updates::UpdateSubscription;

/// Request timeout applied when the caller does not choose one.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Tunables for [`FeedClient`].
#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub user_agent: String,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: 0,
            retry_backoff_ms: 500,
            user_agent: "dankmaps/0.1 (store-directory)".to_owned(),
        }
    }
}

impl From<&AppConfig> for FeedOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout_ms: config.feed_timeout_ms,
            max_retries: config.feed_max_retries,
            retry_backoff_ms: config.feed_retry_backoff_ms,
            user_agent: config.feed_user_agent.clone(),
        }
    }
}

/// Client for the `/api/clients` endpoints.
///
/// Holds two `reqwest` clients: one with the full request timeout for
/// one-shot fetches, and one with only a connect timeout for the long-lived
/// update subscription.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    stream_client: Client,
    base_url: Url,
    options: FeedOptions,
}

impl FeedClient {
    /// Creates a client for `endpoint` with default options and the given
    /// request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidEndpoint`] if `endpoint` is not an
    /// absolute http(s) URL, or [`FeedError::Network`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(endpoint: &str, timeout_ms: u64) -> Result<Self, FeedError> {
        Self::with_options(
            endpoint,
            FeedOptions {
                timeout_ms,
                ..FeedOptions::default()
            },
        )
    }

    /// Creates a client from the `DANKMAPS_FEED_*` settings.
    ///
    /// # Errors
    ///
    /// Same as [`FeedClient::with_options`].
    pub fn from_config(config: &AppConfig) -> Result<Self, FeedError> {
        Self::with_options(&config.feed_url, FeedOptions::from(config))
    }

    /// Creates a client with explicit options.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidEndpoint`] if `endpoint` is not an
    /// absolute http(s) URL, or [`FeedError::Network`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn with_options(endpoint: &str, options: FeedOptions) -> Result<Self, FeedError> {
        let invalid = |reason: String| FeedError::InvalidEndpoint {
            endpoint: endpoint.to_owned(),
            reason,
        };

        let normalised = format!("{}/", endpoint.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(invalid(format!(
                "unsupported scheme '{}'",
                base_url.scheme()
            )));
        }
        if options.timeout_ms == 0 {
            return Err(invalid("timeout must be greater than zero".to_owned()));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(options.timeout_ms))
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(options.user_agent.as_str())
            .build()
            .map_err(FeedError::Network)?;

        let stream_client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(options.user_agent.as_str())
            .build()
            .map_err(FeedError::Network)?;

        Ok(Self {
            client,
            stream_client,
            base_url,
            options,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.options.timeout_ms
    }

    /// Fetches every store from `GET {endpoint}/api/clients`.
    ///
    /// Entries that cannot be placed on the map are skipped with a warning;
    /// the remaining stores keep server order.
    ///
    /// # Errors
    ///
    /// - [`FeedError::Timeout`] if no complete response arrives in time.
    /// - [`FeedError::Network`] if the server cannot be reached.
    /// - [`FeedError::Server`] on a non-2xx response.
    /// - [`FeedError::Deserialize`] if the body is not a JSON array.
    pub async fn fetch_stores(&self) -> Result<Vec<StoreRecord>, FeedError> {
        let url = self.clients_url(&[]);
        let raw: Vec<serde_json::Value> = self.get_json(&url, None).await?;
        let total = raw.len();
        let stores = normalize_records(raw);
        tracing::debug!(total, kept = stores.len(), "fetched store feed");
        Ok(stores)
    }

    /// Fetches one store from `GET {endpoint}/api/clients/{id}`.
    ///
    /// # Errors
    ///
    /// - [`FeedError::NotFound`] on 404 or when the record cannot be placed
    ///   on the map.
    /// - Otherwise the same errors as [`FeedClient::fetch_stores`].
    pub async fn fetch_store(&self, id: &str) -> Result<StoreRecord, FeedError> {
        let url = self.clients_url(&[id]);
        let wire: WireStoreRecord = self.get_json(&url, Some(id)).await?;
        normalize_record(wire).ok_or_else(|| FeedError::NotFound { id: id.to_owned() })
    }

    /// Opens the `storeDetailsUpdated` event stream at
    /// `GET {endpoint}/api/clients/events`.
    ///
    /// Dropping the returned subscription closes the connection.
    ///
    /// # Errors
    ///
    /// - [`FeedError::Timeout`] or [`FeedError::Network`] if the connection
    ///   cannot be opened.
    /// - [`FeedError::Server`] if the server rejects the subscription.
    pub async fn subscribe_updates(&self) -> Result<UpdateSubscription, FeedError> {
        let url = self.clients_url(&["events"]);
        let response = self
            .stream_client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Server {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!("subscribed to store update events");
        Ok(UpdateSubscription::from_response(response))
    }

    /// `{base}/api/clients[/extra...]`, with each extra segment percent-encoded.
    fn clients_url(&self, extra: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // http(s) URLs always have a path, so this only fails for
        // cannot-be-a-base URLs, which the constructor rejects.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "clients"]).extend(extra);
        }
        url
    }

    fn transport_error(&self, err: reqwest::Error) -> FeedError {
        FeedError::from_transport(err, self.options.timeout_ms)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        lookup_id: Option<&str>,
    ) -> Result<T, FeedError> {
        retry_with_backoff(
            self.options.max_retries,
            self.options.retry_backoff_ms,
            || self.get_json_once(url, lookup_id),
        )
        .await
    }

    async fn get_json_once<T: DeserializeOwned>(
        &self,
        url: &Url,
        lookup_id: Option<&str>,
    ) -> Result<T, FeedError> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = lookup_id {
                return Err(FeedError::NotFound { id: id.to_owned() });
            }
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;
        serde_json::from_str(&body).map_err(|e| FeedError::Deserialize {
            context: url.path().to_owned(),
            source: e,
        })
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
