//! Blocking socket plumbing: connect, write a request, read to close.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::error::FetchError;

const READ_BUF_SIZE: usize = 8 * 1024;

/// Opens a TCP connection to `host:port`, trying each resolved address in turn.
/// `io_timeout` is applied to every subsequent read and write on the stream.
pub fn connect(
    host: &str,
    port: u16,
    connect_timeout: Duration,
    io_timeout: Duration,
) -> Result<TcpStream, FetchError> {
    let connect_err = |source: io::Error| FetchError::Connect {
        host: host.to_string(),
        port,
        source,
    };

    let addrs = (host, port).to_socket_addrs().map_err(connect_err)?;
    let mut last_err = io::Error::new(io::ErrorKind::NotFound, "no addresses resolved");
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, connect_timeout) {
            Ok(stream) => {
                stream.set_read_timeout(Some(io_timeout)).map_err(connect_err)?;
                stream.set_write_timeout(Some(io_timeout)).map_err(connect_err)?;
                return Ok(stream);
            }
            Err(e) => last_err = e,
        }
    }
    Err(connect_err(last_err))
}

/// Writes the whole request.
pub fn send_request(stream: &mut TcpStream, request: &[u8]) -> Result<(), FetchError> {
    stream.write_all(request).map_err(FetchError::Write)?;
    stream.flush().map_err(FetchError::Write)
}

/// Reads until the peer closes the connection (HTTP/1.0 framing).
pub fn receive_response(stream: &mut TcpStream) -> Result<Vec<u8>, FetchError> {
    let mut response = Vec::with_capacity(READ_BUF_SIZE);
    let mut buf = [0u8; READ_BUF_SIZE];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => response.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(FetchError::Read(e)),
        }
    }
    Ok(response)
}
