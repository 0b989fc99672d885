//! Transport port: one HTTP request/response exchange.
//!
//! The application layer only sees this trait.  The reqwest-backed
//! implementation lives in `infrastructure::http`; tests substitute a mock or
//! a loopback stub server.
//!
//! # What counts as a transport failure?
//!
//! Only failures to *complete an exchange*: DNS resolution, TCP connect, TLS,
//! and timeouts.  A reply with status 404 or 503 is a completed exchange and
//! is returned as `Ok(RawResponse)`; deciding what a status means is the
//! caller's job.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// HTTP methods used by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A single outbound request.
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// `Content-Type` to send with `body`, if any.
    pub content_type: Option<&'static str>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// A body-less GET.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            content_type: None,
            body: None,
        }
    }

    /// A POST carrying an already-encoded JSON body.
    pub fn post_json(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            content_type: Some(portal_core::JSON_CONTENT_TYPE),
            body: Some(body),
        }
    }
}

// Request bodies carry passwords, so only their length is printed.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("content_type", &self.content_type)
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .finish()
    }
}

/// A completed exchange, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// Canonical reason phrase for `status` (may be empty for unknown codes).
    pub reason: String,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// e.g. `"HTTP 503 Service Unavailable"`.
    pub fn status_line(&self) -> String {
        if self.reason.is_empty() {
            format!("HTTP {}", self.status)
        } else {
            format!("HTTP {} {}", self.status, self.reason)
        }
    }
}

/// Why an exchange could not be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connect or read deadline exceeded.
    Timeout,
    /// DNS resolution or TCP/TLS connection failed.
    ConnectFailed,
    /// Anything else (malformed URL, body read aborted, ...).
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Timeout => f.write_str("request timed out"),
            TransportErrorKind::ConnectFailed => f.write_str("connection failed"),
            TransportErrorKind::Other => f.write_str("transport error"),
        }
    }
}

/// Error returned by [`Transport::send`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Performs one HTTP exchange without blocking the calling task.
///
/// Implementations must be safe to share between unrelated concurrent
/// requests (a login and a discovery lookup may run at the same time over the
/// same connection pool).  They never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the completed response.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no response could be obtained.
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError>;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
