//! HTTP access to both trackers.
//!
//! Every tracker call goes through the [`Transport`] trait so the phases can
//! be driven against a scripted transport in tests. The production
//! implementation is [`HttpTransport`], a blocking `reqwest` client carrying
//! the tracker's static auth headers and a per-call timeout.

pub mod catalog;
pub mod retry;

pub use catalog::{check_destination_login, fetch_field_catalog, find_field};
pub use retry::{RetryPolicy, send_with_retry};

use crate::error::{BridgeError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::trace;

/// HTTP verbs the trackers are called with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        };
        write!(f, "{name}")
    }
}

/// A single tracker request. Query values are escaped by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            query: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    #[must_use]
    pub fn put(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Put,
            url: url.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Value of a query parameter, if present.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Status and raw body of a tracker response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Decode the body, reporting a malformed response against `url`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedResponse` if the body is not the expected JSON shape.
    pub fn json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| BridgeError::MalformedResponse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// Turn this response into an `UnexpectedStatus` error.
    #[must_use]
    pub fn unexpected(&self, url: &str) -> BridgeError {
        BridgeError::UnexpectedStatus {
            url: url.to_string(),
            status: self.status,
            body: truncate_body(&self.body),
        }
    }
}

fn truncate_body(body: &str) -> String {
    const LIMIT: usize = 500;
    if body.len() <= LIMIT {
        return body.to_string();
    }
    let mut end = LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

/// Sends tracker requests. Implementations must be shareable across workers.
pub trait Transport: Send + Sync {
    /// Send one request and return its status and body.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` or `Transport` when no HTTP response was received.
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

/// Blocking `reqwest` transport with static headers.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Build a client with the given default headers and per-call timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(headers: HeaderMap, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Transport for the source tracker (personal access token).
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value.
    pub fn bearer(token: &str, timeout: Duration) -> Result<Self> {
        Self::new(bearer_headers(token)?, timeout)
    }

    /// Transport for the destination tracker (email + API token).
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are not a valid header value.
    pub fn basic(email: &str, token: &str, timeout: Duration) -> Result<Self> {
        Self::new(basic_headers(email, token)?, timeout)
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        trace!(method = %request.method, url = %request.url, "Sending request");
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
            Method::Put => self.client.put(&request.url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                BridgeError::Timeout {
                    url: request.url.clone(),
                }
            } else {
                BridgeError::Transport {
                    url: request.url.clone(),
                    reason: e.to_string(),
                }
            }
        };

        let response = builder.send().map_err(map_err)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(map_err)?;
        Ok(ApiResponse { status, body })
    }
}

/// Headers for bearer-token auth.
///
/// # Errors
///
/// Returns `Config` if the token contains characters not allowed in headers.
pub fn bearer_headers(token: &str) -> Result<HeaderMap> {
    json_headers(&format!("Bearer {token}"))
}

/// Headers for HTTP Basic auth: `base64(email:token)`.
///
/// # Errors
///
/// Returns `Config` if the encoded value is not a valid header.
pub fn basic_headers(email: &str, token: &str) -> Result<HeaderMap> {
    json_headers(&format!("Basic {}", basic_credentials(email, token)))
}

/// Base64 of `email:token`.
#[must_use]
pub fn basic_credentials(email: &str, token: &str) -> String {
    STANDARD.encode(format!("{email}:{token}"))
}

fn json_headers(authorization: &str) -> Result<HeaderMap> {
    let mut auth = HeaderValue::from_str(authorization)
        .map_err(|_| BridgeError::Config("credentials contain invalid characters".to_string()))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    Ok(headers)
}
