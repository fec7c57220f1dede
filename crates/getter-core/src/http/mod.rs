//! HTTP/1.0 collaborators: URL splitting, socket exchange, header parsing.
//!
//! One connection per request, framed by peer close. Every socket call
//! returns a `FetchError` instead of aborting, so a failure is reported to
//! whichever chunk asked for it.

mod error;
mod parse;
mod target;
mod wire;

pub use error::{FetchError, UrlError};
pub use parse::{parse_accepts_ranges, parse_content_length, parse_status, split_header_from_body};
pub use target::{host_for_header, split_url, split_url_with_port, Target, DEFAULT_PORT};
pub use wire::{connect, receive_response, send_request};

use std::time::Duration;

use crate::config::GetterConfig;

/// User-Agent sent with range GETs unless configured otherwise.
pub const DEFAULT_USER_AGENT: &str = "getter";

/// `HEAD` request bytes for `target`.
pub fn head_request(target: &Target) -> String {
    format!(
        "HEAD /{} HTTP/1.0\r\nHost: {}\r\n\r\n",
        target.path,
        host_for_header(&target.host)
    )
}

/// Range `GET` request bytes; `end` is inclusive.
pub fn range_request(host: &str, path: &str, start: u64, end: u64, user_agent: &str) -> String {
    format!(
        "GET /{} HTTP/1.0\r\nHost: {}\r\nRange: bytes={}-{}\r\nUser-Agent: {}\r\n\r\n",
        path,
        host_for_header(host),
        start,
        end,
        user_agent
    )
}

/// Parsed response to a `HEAD` probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadResult {
    /// Status code from the status line, if it could be read.
    pub status: Option<u16>,
    /// Total size in bytes, if `Content-Length` is present.
    pub content_length: Option<u64>,
    /// True if server sent `Accept-Ranges: bytes`.
    pub accepts_ranges: bool,
}

impl HeadResult {
    pub fn from_raw(raw: &[u8]) -> Self {
        Self {
            status: parse_status(raw),
            content_length: parse_content_length(raw),
            accepts_ranges: parse_accepts_ranges(raw),
        }
    }
}

/// Blocking HTTP/1.0 client settings shared by the probe and every worker.
#[derive(Debug, Clone)]
pub struct HttpClient {
    pub connect_timeout: Duration,
    pub io_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            io_timeout: Duration::from_secs(60),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpClient {
    pub fn from_config(cfg: &GetterConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            io_timeout: Duration::from_secs(cfg.io_timeout_secs),
            user_agent: cfg.user_agent.clone(),
        }
    }

    /// One connect/write/read-to-close exchange; returns the raw response.
    fn exchange(&self, host: &str, port: u16, request: &str) -> Result<Vec<u8>, FetchError> {
        let mut stream = connect(host, port, self.connect_timeout, self.io_timeout)?;
        send_request(&mut stream, request.as_bytes())?;
        receive_response(&mut stream)
    }

    /// Sends `HEAD` for `target` and parses size and range support.
    pub fn probe(&self, target: &Target) -> Result<HeadResult, FetchError> {
        let raw = self.exchange(&target.host, target.port, &head_request(target))?;
        let head = HeadResult::from_raw(&raw);
        tracing::debug!(
            resource = %target,
            status = ?head.status,
            content_length = ?head.content_length,
            accepts_ranges = head.accepts_ranges,
            "probe response"
        );
        Ok(head)
    }

    /// Fetches bytes `start..=end` and returns the body.
    ///
    /// Fails with `Status` on a non-2xx reply and `BodyLength` when the body
    /// does not match the requested span.
    pub fn fetch_range(
        &self,
        host: &str,
        path: &str,
        port: u16,
        start: u64,
        end: u64,
    ) -> Result<Vec<u8>, FetchError> {
        let request = range_request(host, path, start, end, &self.user_agent);
        let raw = self.exchange(host, port, &request)?;

        if let Some(code) = parse_status(&raw) {
            if !(200..300).contains(&code) {
                return Err(FetchError::Status(code));
            }
        }

        let header_len = raw.len() - split_header_from_body(&raw).len();
        let mut body = raw;
        body.drain(..header_len);

        let expected = end - start + 1;
        let received = body.len() as u64;
        if received != expected {
            return Err(FetchError::BodyLength { expected, received });
        }
        Ok(body)
    }
}
