//! reqwest-backed [`Transport`].
//!
//! One `HttpTransport` owns one `reqwest::Client`, and with it one connection
//! pool.  The client is `Clone + Send + Sync` and internally reference
//! counted, so the same transport is handed to both the auth client and the
//! discovery engine and their requests may run concurrently.
//!
//! # Timeouts
//!
//! reqwest 0.11 exposes a connect timeout and a whole-request timeout but no
//! separate read timeout.  The connect timeout is applied as configured; the
//! whole-request timeout is `connect + read`, which bounds the read phase by
//! at least `read` and never cuts a request short before either budget is
//! spent.

use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, trace};

use crate::application::transport::{
    HttpRequest, Method, RawResponse, Transport, TransportError, TransportErrorKind,
};

/// Connect and read budgets for every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSettings {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP/1.1 transport over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Builds the underlying client.
    ///
    /// # Errors
    ///
    /// Returns [`TransportErrorKind::Other`] if the TLS backend cannot be
    /// initialised.
    pub fn new(settings: TransportSettings) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.connect_timeout + settings.read_timeout)
            .user_agent(concat!("portal-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::new(TransportErrorKind::Other, describe(&e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        debug!(?request, "sending");

        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        if let Some(content_type) = request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        let body = response.bytes().await.map_err(classify)?;
        trace!(status = status.as_u16(), len = body.len(), "received");

        Ok(RawResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body: body.to_vec(),
        })
    }
}

fn classify(error: reqwest::Error) -> TransportError {
    let kind = if error.is_timeout() {
        TransportErrorKind::Timeout
    } else if error.is_connect() {
        TransportErrorKind::ConnectFailed
    } else {
        TransportErrorKind::Other
    };
    TransportError::new(kind, describe(&error))
}

/// Flattens an error and its sources into one line.
///
/// reqwest's top-level message ("error sending request for url ...") hides
/// the useful part ("Connection refused") in the source chain.
fn describe(error: &reqwest::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text.replace(['\r', '\n'], " ")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
