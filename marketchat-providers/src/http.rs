//! HTTP client abstraction and utilities

use crate::base;
use async_trait::async_trait;
use marketchat_core::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest_eventsource::{EventSource, RequestBuilderExt};
use serde_json::Value;
use std::time::Duration;

/// HTTP client abstraction, injectable so tests can swap the transport
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send a POST request and return the JSON response body. Non-success
    /// statuses are classified into the shared error taxonomy.
    async fn post(
        &self,
        provider: &'static str,
        url: &str,
        headers: HeaderMap,
        body: Value,
    ) -> Result<Value>;

    /// Open a server-sent-events POST request. The connection is established
    /// lazily on first poll; dropping the returned source aborts it.
    async fn post_event_stream(
        &self,
        url: &str,
        headers: HeaderMap,
        body: Value,
    ) -> Result<EventSource>;
}

/// Default HTTP client implementation using reqwest
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Create a new HTTP client. Only connection establishment is bounded by
    /// a timeout; an overall request deadline would cut off long streams.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(base::network_error)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn post(
        &self,
        provider: &'static str,
        url: &str,
        headers: HeaderMap,
        body: Value,
    ) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(base::network_error)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = base::retry_after(response.headers());
            let text = response.text().await.unwrap_or_default();
            let message = base::vendor_error_message(&text)
                .unwrap_or_else(|| format!("HTTP {}: {}", status, text));
            return Err(base::classify_status(
                provider,
                status.as_u16(),
                message,
                retry_after,
            ));
        }

        response.json().await.map_err(base::network_error)
    }

    async fn post_event_stream(
        &self,
        url: &str,
        headers: HeaderMap,
        body: Value,
    ) -> Result<EventSource> {
        self.client
            .post(url)
            .headers(headers)
            .json(&body)
            .eventsource()
            .map_err(|e| Error::Network {
                message: e.to_string(),
                source: Some(Box::new(e)),
            })
    }
}

/// Bearer-token headers used by the OpenAI-compatible API
pub fn bearer_headers(api_key: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| Error::Validation(format!("invalid API key: {}", e)))?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(headers)
}
