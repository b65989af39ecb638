//! Adapter boundary errors.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

use super::traits::Exchange;

/// Failure of a single exchange request.
///
/// Status, shape and transport failures all collapse into this one type so
/// callers only ever see a descriptive message naming the exchange.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{exchange} API error {status}: {body}")]
    Status {
        exchange: Exchange,
        status: StatusCode,
        body: String,
    },

    #[error("{exchange} returned a malformed response: {message}")]
    Malformed { exchange: Exchange, message: String },

    #[error("{exchange} request failed: {source}")]
    Network {
        exchange: Exchange,
        #[source]
        source: reqwest::Error,
    },

    #[error("{exchange} request timed out after {}s", .timeout.as_secs_f64())]
    Timeout {
        exchange: Exchange,
        timeout: Duration,
    },
}

impl AdapterError {
    /// Exchange the failed request was addressed to.
    pub fn exchange(&self) -> Exchange {
        match self {
            AdapterError::Status { exchange, .. }
            | AdapterError::Malformed { exchange, .. }
            | AdapterError::Network { exchange, .. }
            | AdapterError::Timeout { exchange, .. } => *exchange,
        }
    }

    pub(crate) fn malformed(exchange: Exchange, message: impl Into<String>) -> Self {
        AdapterError::Malformed {
            exchange,
            message: message.into(),
        }
    }
}
