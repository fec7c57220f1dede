//! Parse raw HTTP/1.0 response bytes: status, header fields, body offset.

const HEADER_END: &[u8] = b"\r\n\r\n";

/// Returns the header block (without the terminating blank line) as text.
/// Non-UTF-8 bytes are replaced; header names and numbers are ASCII anyway.
fn header_text(raw: &[u8]) -> String {
    let end = find_header_end(raw).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

fn find_header_end(raw: &[u8]) -> Option<usize> {
    raw.windows(HEADER_END.len()).position(|w| w == HEADER_END)
}

/// Iterates `(name, value)` pairs of the header lines, skipping the status line.
fn header_fields(text: &str) -> impl Iterator<Item = (&str, &str)> {
    text.lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim(), value.trim()))
}

/// Status code from the first line (`HTTP/1.x 206 Partial Content`).
pub fn parse_status(raw: &[u8]) -> Option<u16> {
    let text = header_text(raw);
    let first = text.lines().next()?;
    let mut parts = first.split_whitespace();
    let version = parts.next()?;
    if !version.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}

/// Declared `Content-Length`, if present and numeric.
pub fn parse_content_length(raw: &[u8]) -> Option<u64> {
    let text = header_text(raw);
    let length = header_fields(&text)
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<u64>().ok());
    length
}

/// True if the server sent `Accept-Ranges: bytes`.
pub fn parse_accepts_ranges(raw: &[u8]) -> bool {
    let text = header_text(raw);
    let accepts = header_fields(&text).any(|(name, value)| {
        name.eq_ignore_ascii_case("accept-ranges") && value.eq_ignore_ascii_case("bytes")
    });
    accepts
}

/// Body following the blank line. When no header terminator is present the
/// whole input is returned (the peer did not send an HTTP response).
pub fn split_header_from_body(raw: &[u8]) -> &[u8] {
    match find_header_end(raw) {
        Some(pos) => &raw[pos + HEADER_END.len()..],
        None => raw,
    }
}
