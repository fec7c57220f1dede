//! The fetch seam between workers and the network.

use crate::http::{FetchError, HttpClient};
use crate::planner::ChunkDescriptor;

/// Fetches one chunk's bytes. Implementations hold no per-chunk state; the
/// same fetcher is shared by every worker.
pub trait RangeFetcher: Send + Sync {
    fn fetch(&self, chunk: &ChunkDescriptor) -> Result<Vec<u8>, FetchError>;
}

impl RangeFetcher for HttpClient {
    fn fetch(&self, chunk: &ChunkDescriptor) -> Result<Vec<u8>, FetchError> {
        self.fetch_range(
            &chunk.host,
            &chunk.path,
            chunk.port,
            chunk.range_start,
            chunk.range_end,
        )
    }
}
