//! HTTP client adapter.
//!
//! Wraps every outbound request: resolves the path against the versioned base
//! URL, injects `Authorization: Bearer <access_token>` from the token store,
//! applies the request timeout, and maps failures onto [`ClientError`].
//!
//! A 401 from any endpoint publishes [`AuthEvent::Unauthorized`] on a
//! broadcast channel before the error is returned. The session manager
//! subscribes to that channel; nothing here touches session state.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::error::{ClientError, ClientResult};
use crate::tokens::TokenStore;

/// Standard User-Agent header for storefront API requests.
pub const USER_AGENT: &str = concat!("storefront/", env!("CARGO_PKG_VERSION"));

const EVENT_CAPACITY: usize = 16;

/// Cross-cutting auth notifications published by the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A request came back with HTTP 401.
    Unauthorized { method: String, path: String },
}

/// Shared HTTP client. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenStore>,
    events: broadcast::Sender<AuthEvent>,
}

impl ApiClient {
    /// Builds a client from config, resolving the base URL (env > config >
    /// default) and the request timeout.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the TLS backend fails
    /// to initialise.
    pub fn from_config(config: &Config, tokens: Arc<dyn TokenStore>) -> anyhow::Result<Self> {
        let base_url = config.resolve_base_url()?;
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.api.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self::with_http(http, base_url, tokens))
    }

    /// Builds a client around an existing `reqwest::Client`.
    pub fn with_http(http: reqwest::Client, base_url: Url, tokens: Arc<dyn TokenStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                http,
                base_url,
                tokens,
                events,
            }),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Subscribes to auth events (the unauthorized signal).
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.events.subscribe()
    }

    /// Starts a request for `path` (relative to the base URL) with the bearer
    /// token attached when one is stored.
    ///
    /// # Errors
    /// Returns a network error if `path` cannot be joined onto the base URL,
    /// or a storage error if the token store cannot be read.
    pub fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let url = self
            .inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::network(format!("invalid request path {path}: {e}")))?;

        let mut builder = self.inner.http.request(method, url);
        let tokens = self
            .inner
            .tokens
            .load()
            .map_err(|e| ClientError::storage(format!("{e:#}")))?;
        if let Some(tokens) = tokens {
            builder = builder.bearer_auth(tokens.access_token);
        }
        Ok(builder)
    }

    /// Sends a prepared request and checks the status.
    ///
    /// # Errors
    /// Transport failures map to network/timeout errors; 401 publishes the
    /// unauthorized signal and returns an unauthorized error; any other
    /// non-success status returns a backend error carrying `detail`.
    pub async fn send(&self, builder: RequestBuilder) -> ClientResult<Response> {
        let request = builder
            .build()
            .map_err(|e| ClientError::network(e.to_string()))?;
        let method = request.method().to_string();
        let path = request.url().path().to_string();
        debug!(%method, %path, "api request");

        let response = self
            .inner
            .http
            .execute(request)
            .await
            .map_err(|e| {
                let err = ClientError::from_transport(&e);
                warn!(%method, %path, error = %err, "api request failed");
                err
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            debug!(%method, %path, "api request unauthorized");
            // No receivers is fine: nobody is tracking a session.
            let _ = self.inner.events.send(AuthEvent::Unauthorized {
                method: method.clone(),
                path: path.clone(),
            });
            return Err(ClientError::unauthorized(&body));
        }

        let err = ClientError::http_status(status.as_u16(), &body);
        debug!(%method, %path, status = status.as_u16(), "api request rejected");
        Err(err)
    }

    /// Sends and decodes a JSON body.
    pub async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = self.send(builder).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::from_transport(&e))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::decode(format!("invalid response body: {e}")))
    }

    /// Sends and discards the body.
    pub async fn send_empty(&self, builder: RequestBuilder) -> ClientResult<()> {
        self.send(builder).await.map(drop)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let builder = self.request(Method::GET, path)?;
        self.send_json(builder).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}
