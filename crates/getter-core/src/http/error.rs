//! Error types for the HTTP/1.0 collaborators.

use std::io;
use thiserror::Error;

/// Error returned by a single request/response exchange.
///
/// A fetch error belongs to the chunk that requested it; the worker pool
/// reports it tagged with that chunk's `sequence_index` instead of aborting.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Host could not be resolved, or the peer refused/timed out the connect.
    #[error("connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    /// Writing the request failed (broken connection or write deadline).
    #[error("write request: {0}")]
    Write(#[source] io::Error),
    /// Reading the response failed (broken connection or read deadline).
    #[error("read response: {0}")]
    Read(#[source] io::Error),
    /// Response status line was not 2xx.
    #[error("HTTP {0}")]
    Status(u16),
    /// Body length differs from the requested range (server closed early
    /// or ignored the Range header).
    #[error("body length mismatch: expected {expected} bytes, got {received}")]
    BodyLength { expected: u64, received: u64 },
    /// The fetcher panicked while handling this chunk.
    #[error("fetch panicked: {0}")]
    Panicked(String),
}

/// URL could not be split into host and path.
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("could not split url into host/path: {0}")]
    Malformed(String),
    /// Only plain `http://` is spoken.
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}
