//! One HTTP/1.1 `POST /write` per cycle.
//!
//! [`exchange`] runs the request over any connected `embedded_io_async`
//! stream; the firmware supplies the TCP socket through [`UploadTransport`].
//! Progress is reported through an `FnMut(HttpEvent)` sink that only sees the
//! event payload and cannot abort the exchange.

mod exchange;
mod helpers;
#[cfg(test)]
mod tests;

use core::fmt;

use log::{debug, info, warn};

use crate::config::Endpoint;

pub use exchange::{exchange, REQUEST_HEAD_MAX};

#[derive(Clone, Copy, Debug)]
pub struct UploadRequest<'a> {
    pub endpoint: &'a Endpoint,
    pub payload: &'a [u8],
}

impl<'a> UploadRequest<'a> {
    pub fn new(endpoint: &'a Endpoint, payload: &'a [u8]) -> Self {
        Self { endpoint, payload }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportError {
    NotReady,
    Resolve,
    Connect,
    RequestTooLarge,
    Write,
    Read,
    Timeout,
    MalformedResponse,
}

impl TransportError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotReady => "not_ready",
            Self::Resolve => "resolve",
            Self::Connect => "connect",
            Self::RequestTooLarge => "request_too_large",
            Self::Write => "write",
            Self::Read => "read",
            Self::Timeout => "timeout",
            Self::MalformedResponse => "malformed_response",
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadResult {
    Completed {
        status: u16,
        content_length: Option<u32>,
    },
    Failed(TransportError),
}

impl UploadResult {
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Completed { status: 200..=299, .. })
    }

    pub const fn status(self) -> Option<u16> {
        match self {
            Self::Completed { status, .. } => Some(status),
            Self::Failed(_) => None,
        }
    }
}

impl fmt::Display for UploadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed { status, .. } => write!(f, "status={}", status),
            Self::Failed(err) => write!(f, "failed err={}", err),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpEvent<'a> {
    Connected,
    HeadersSent,
    /// One response header line, without the trailing CRLF.
    Header(&'a str),
    Data { len: usize },
    Finished,
    Error(TransportError),
    Disconnected,
}

/// Default diagnostics sink.
pub fn log_http_event(event: HttpEvent<'_>) {
    match event {
        HttpEvent::Connected => debug!("upload: connected"),
        HttpEvent::HeadersSent => debug!("upload: request sent"),
        HttpEvent::Header(line) => debug!("upload: header {}", line),
        HttpEvent::Data { len } => debug!("upload: body {}B", len),
        HttpEvent::Finished => info!("upload: response complete"),
        HttpEvent::Error(err) => warn!("upload: err={}", err),
        HttpEvent::Disconnected => debug!("upload: disconnected"),
    }
}

/// Sends one request. Implementations never retry.
#[allow(async_fn_in_trait)]
pub trait UploadTransport {
    async fn upload(&mut self, request: &UploadRequest<'_>) -> UploadResult;
}
