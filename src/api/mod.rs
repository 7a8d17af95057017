//! REST clients for the supported indexers.
//!
//! Each backend wraps an [`ApiClient`] and exposes its list endpoints as
//! [`OffsetSource`](crate::fetch::OffsetSource) or
//! [`CursorSource`](crate::fetch::CursorSource) implementations.

pub mod bob;
pub mod hiro;
pub mod ord;
mod types;

pub use types::*;

use std::time::Duration;

use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Bounds connection setup only; response deadlines come from the fetch layer.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin JSON-over-HTTP client bound to one base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("teller/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|source| Error::Network {
                url: base_url.to_string(),
                source,
            })?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `{base}{path}` with `query` and decode the JSON body.
    pub async fn get_json<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + Sync + ?Sized,
    {
        let url = self.url(path);
        debug!(%url, "GET");

        let request = self
            .client
            .get(&url)
            .query(query)
            .header(ACCEPT, "application/json");
        Self::send(request, url).await
    }

    /// POST `body` as JSON to `{base}{path}` and decode the JSON reply.
    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let url = self.url(path);
        debug!(%url, "POST");

        let request = self
            .client
            .post(&url)
            .json(body)
            .header(ACCEPT, "application/json");
        Self::send(request, url).await
    }

    async fn send<T: DeserializeOwned>(request: reqwest::RequestBuilder, url: String) -> Result<T> {
        let response = request.send().await.map_err(|source| Error::Network {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status { url, status });
        }

        let body = response.bytes().await.map_err(|source| Error::Network {
            url: url.clone(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|source| Error::Decode { url, source })
    }
}

/// Query string with no parameters.
pub(crate) const NO_QUERY: &[(&str, &str)] = &[];
