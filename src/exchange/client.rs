//! Shared JSON-over-HTTP plumbing for the exchange adapters.

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::trace;

use super::error::AdapterError;
use super::traits::Exchange;

/// Per-request timeout applied by the underlying HTTP client.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin wrapper around `reqwest::Client` that tags every failure with the
/// exchange it came from.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    exchange: Exchange,
}

impl ApiClient {
    /// Create a client for one exchange.
    pub fn new(exchange: Exchange) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { http, exchange })
    }

    pub fn exchange(&self) -> Exchange {
        self.exchange
    }

    /// GET `url` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, AdapterError> {
        trace!(exchange = %self.exchange, url, "GET");
        let response = self
            .http
            .get(url)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.decode(response).await
    }

    /// POST `body` as JSON to `url` and decode the JSON response.
    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, AdapterError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        trace!(exchange = %self.exchange, url, "POST");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.decode(response).await
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, AdapterError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Status {
                exchange: self.exchange,
                status,
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| AdapterError::malformed(self.exchange, e.to_string()))
    }

    fn transport_error(&self, source: reqwest::Error) -> AdapterError {
        if source.is_timeout() {
            AdapterError::Timeout {
                exchange: self.exchange,
                timeout: REQUEST_TIMEOUT,
            }
        } else {
            AdapterError::Network {
                exchange: self.exchange,
                source,
            }
        }
    }
}
