//! A transport for API calls.

use std::{future::Future, time::Duration};

use serde_json::Value;
use url::Url;

#[cfg(http_sender)]
mod http_sender;

#[cfg(http_sender)]
pub use http_sender::{HttpApiSender, DEFAULT_TIMEOUT};

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`.
    Get,
    /// `POST`.
    Post,
}

/// A request to be sent to the API.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Method.
    pub method: Method,
    /// Path relative to the base url.
    pub path: String,
    /// JSON body.
    pub body: Option<Value>,
    /// Access credential to attach.
    pub credential: Option<String>,
}

impl ApiRequest {
    /// Create a `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
            credential: None,
        }
    }

    /// Create a `POST` request.
    pub fn post(path: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body,
            credential: None,
        }
    }

    /// Attach credential.
    pub fn with_credential(mut self, credential: Option<String>) -> Self {
        self.credential = credential;
        self
    }
}

/// A raw response from the API.
#[derive(Debug, Clone, Default)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
    /// Values of the `Set-Cookie` headers.
    pub set_cookie: Vec<String>,
}

impl ApiResponse {
    /// Returns whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Type describing the status of the transport.
#[derive(Debug, Default, Clone)]
pub struct TransportStats {
    /// Number of requests issued.
    pub request_count: usize,

    /// Total amount of time spent transacting with the server.
    pub elapsed_time: Duration,

    /// Total amount of waiting time due to server rate limiting
    /// (a subset of `elapsed_time`)
    pub rate_limited_time: Duration,
}

/// A transport for API calls.
pub trait ApiSender {
    /// Send an [`ApiRequest`].
    ///
    /// Any response that reached the client must be returned as `Ok`,
    /// whatever its status. `Err` is reserved for transport failures.
    fn send(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = crate::Result<ApiResponse>> + Send;

    /// Get transport statistics.
    fn transport_stats(&self) -> TransportStats;

    /// Get the base url.
    fn base_url(&self) -> &Url;
}
