//! Chunk descriptor: one byte range of the resource, fetched by one worker.

use serde::Serialize;

/// A single chunk: inclusive byte range `[range_start, range_end]` of the
/// resource at `host:port/path`.
///
/// `sequence_index` is the chunk's position in the resource; it travels
/// unchanged through the queue and the fetch so the sink can reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkDescriptor {
    pub host: String,
    pub path: String,
    pub port: u16,
    /// First byte (inclusive).
    pub range_start: u64,
    /// Last byte (inclusive).
    pub range_end: u64,
    pub sequence_index: usize,
}

impl ChunkDescriptor {
    /// Length of this chunk in bytes.
    pub fn len(&self) -> u64 {
        self.range_end - self.range_start + 1
    }

    /// HTTP Range header value: `bytes=start-end`.
    pub fn range_header_value(&self) -> String {
        format!("bytes={}-{}", self.range_start, self.range_end)
    }
}
