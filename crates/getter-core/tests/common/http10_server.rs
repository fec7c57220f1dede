//! Minimal HTTP/1.0 server that supports HEAD and Range GET for integration tests.
//!
//! Serves a single static body and closes the connection after each
//! response. Every request head is recorded so tests can count fetches.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// If false, GET ignores Range and always returns 200 with the full body,
    /// and HEAD omits `Accept-Ranges`.
    pub support_ranges: bool,
    /// If false, HEAD omits `Content-Length`.
    pub send_length: bool,
    /// Status code for HEAD responses.
    pub head_status: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            support_ranges: true,
            send_length: true,
            head_status: 200,
        }
    }
}

/// A running server. The listener thread lives until the process exits.
pub struct TestServer {
    pub port: u16,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    /// `127.0.0.1:<port>/<path>` in the bare form the planner accepts.
    pub fn url(&self, path: &str) -> String {
        format!("127.0.0.1:{}/{}", self.port, path)
    }

    /// Raw request heads received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests whose method is `method`.
    pub fn requests_with_method(&self, method: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.starts_with(&format!("{} ", method)))
            .collect()
    }
}

pub fn start(body: Vec<u8>) -> TestServer {
    start_with_options(body, ServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: ServerOptions) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let log = Arc::clone(&log);
            thread::spawn(move || handle(stream, &body, opts, &log));
        }
    });
    TestServer { port, requests }
}

fn read_head(stream: &mut TcpStream) -> Option<String> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return None,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8(head).ok()
}

fn handle(mut stream: TcpStream, body: &[u8], opts: ServerOptions, log: &Mutex<Vec<String>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let Some(request) = read_head(&mut stream) else {
        return;
    };
    log.lock().unwrap().push(request.clone());

    let (method, range) = parse_request(&request);
    let total = body.len() as u64;
    let accept_ranges = if opts.support_ranges {
        "Accept-Ranges: bytes\r\n"
    } else {
        ""
    };

    if method == "HEAD" {
        let length = if opts.send_length {
            format!("Content-Length: {}\r\n", total)
        } else {
            String::new()
        };
        let response = format!(
            "HTTP/1.0 {} X\r\n{}{}\r\n",
            opts.head_status, length, accept_ranges
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    if method == "GET" {
        let (status, slice) = match range {
            Some((start, end_incl)) if opts.support_ranges => {
                let end_incl = end_incl.min(total.saturating_sub(1));
                if start > end_incl {
                    ("416 Range Not Satisfiable", &body[0..0])
                } else {
                    ("206 Partial Content", &body[start as usize..=end_incl as usize])
                }
            }
            _ => ("200 OK", body),
        };
        let response = format!(
            "HTTP/1.0 {}\r\nContent-Length: {}\r\n{}\r\n",
            status,
            slice.len(),
            accept_ranges
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.write_all(slice);
        return;
    }

    let _ = stream.write_all(b"HTTP/1.0 405 Method Not Allowed\r\n\r\n");
}

/// Returns (method, optional (start, end_inclusive) for Range: bytes=X-Y).
fn parse_request(request: &str) -> (&str, Option<(u64, u64)>) {
    let method = request.split_whitespace().next().unwrap_or("");
    let mut range = None;
    for line in request.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                if let Some(part) = value.trim().strip_prefix("bytes=") {
                    if let Some((a, b)) = part.split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end = b.trim().parse::<u64>().unwrap_or(u64::MAX);
                        range = Some((start, end));
                    }
                }
            }
        }
    }
    (method, range)
}

/// Parses the `Range: bytes=a-b` header out of a recorded request.
pub fn recorded_range(request: &str) -> Option<(u64, u64)> {
    parse_request(request).1
}
