//! Split a download URL into host, port and path.
//!
//! Accepts the bare `host/path` form (`www.example.com/file.iso`), an
//! explicit port (`host:8080/path`) and an optional `http://` scheme.

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use ::url::Host;

use super::error::UrlError;

/// Port used when the URL does not name one.
pub const DEFAULT_PORT: u16 = 80;

/// Where a resource lives. `path` is stored without its leading `/`; an
/// IPv6 `host` is stored without brackets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub host: String,
    pub path: String,
    pub port: u16,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let host = host_for_header(&self.host);
        if self.port == DEFAULT_PORT {
            write!(f, "{}/{}", host, self.path)
        } else {
            write!(f, "{}:{}/{}", host, self.port, self.path)
        }
    }
}

/// `host` as written in a `Host` header: IPv6 literals get their brackets back.
pub fn host_for_header(host: &str) -> Cow<'_, str> {
    if host.contains(':') {
        Cow::Owned(format!("[{}]", host))
    } else {
        Cow::Borrowed(host)
    }
}

/// Splits `url` into a [`Target`], using `default_port` when none is given.
pub fn split_url_with_port(url: &str, default_port: u16) -> Result<Target, UrlError> {
    let url = url.trim();
    if url.contains("://") {
        return split_with_scheme(url, default_port);
    }

    let Some((authority, path)) = url.split_once('/') else {
        return Err(UrlError::Malformed(url.to_string()));
    };
    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| UrlError::Malformed(url.to_string()))?;
            (host, port)
        }
        None => (authority, default_port),
    };
    if host.is_empty() {
        return Err(UrlError::Malformed(url.to_string()));
    }

    Ok(Target {
        host: host.to_string(),
        path: path.to_string(),
        port,
    })
}

/// Splits `url` into a [`Target`] on port 80 unless the URL names a port.
pub fn split_url(url: &str) -> Result<Target, UrlError> {
    split_url_with_port(url, DEFAULT_PORT)
}

fn split_with_scheme(url: &str, default_port: u16) -> Result<Target, UrlError> {
    let parsed = ::url::Url::parse(url).map_err(|_| UrlError::Malformed(url.to_string()))?;
    if parsed.scheme() != "http" {
        return Err(UrlError::UnsupportedScheme(parsed.scheme().to_string()));
    }
    // The parser fills in `/` for a bare authority; a path must be written.
    let after_scheme = url.split_once("://").map_or("", |(_, rest)| rest);
    if !after_scheme.contains('/') {
        return Err(UrlError::Malformed(url.to_string()));
    }
    let host = match parsed.host() {
        Some(Host::Domain(d)) if !d.is_empty() => d.to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        _ => return Err(UrlError::Malformed(url.to_string())),
    };

    let mut path = parsed.path().trim_start_matches('/').to_string();
    if let Some(query) = parsed.query() {
        path.push('?');
        path.push_str(query);
    }

    Ok(Target {
        host,
        path,
        port: parsed.port().unwrap_or(default_port),
    })
}
