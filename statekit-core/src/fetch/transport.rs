//! Request-issuing primitive.
//!
//! The fetcher never opens sockets itself. Hosts inject a [`Transport`]
//! implementation (a browser fetch binding, an HTTP client, a test fake)
//! and the fetcher drives it. The transport contract is deliberately small:
//! one request in, one response or error out, cancellation by dropping the
//! returned future.

use futures_util::future::BoxFuture;
use thiserror::Error;

/// Errors produced at the transport level, before any HTTP status exists.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request never produced a response (DNS, refused, reset...).
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request was cancelled by its owner.
    #[error("request aborted")]
    Aborted,
}

/// A request handed to the transport.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub url: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            headers: Vec::new(),
            body: None,
        }
    }
}

/// Extra request configuration passed through to the transport unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub method: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RequestOptions {
    pub(crate) fn into_request(self, url: String) -> Request {
        Request {
            url,
            method: self.method.unwrap_or_else(|| "GET".to_string()),
            headers: self.headers,
            body: self.body,
        }
    }
}

/// A response as the transport saw it: status code plus unparsed body.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    /// Whether the status is in the 200..=299 range.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The injected request-issuing primitive.
///
/// Cancellation is cooperative: dropping the returned future abandons the
/// request. Implementations must not hold state that outlives the future.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, request: Request) -> BoxFuture<'static, Result<Response, TransportError>>;
}
