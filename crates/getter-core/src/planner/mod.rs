//! Chunk planning from a HEAD probe.
//!
//! One probe per plan. The decision (how many chunks, how large) is a pure
//! function of the probe result and the worker count, in
//! [`DownloadPlan::from_probe`]. The chunk size is returned inside the plan;
//! nothing about a plan outlives the value.

mod chunk;

pub use chunk::ChunkDescriptor;

use serde::Serialize;
use thiserror::Error;

use crate::http::{split_url, FetchError, HeadResult, HttpClient, Target, UrlError};

/// Planning failed; no partial plan is produced.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Url(#[from] UrlError),
    /// The HEAD exchange itself failed (connect, write, read).
    #[error("probe request failed: {0}")]
    Probe(#[from] FetchError),
    /// The HEAD response was not 2xx.
    #[error("probe returned HTTP {0}")]
    ProbeStatus(u16),
    /// The HEAD response carried no usable size.
    #[error("probe response unusable: {0}")]
    ProbeParse(String),
    #[error("worker count must be at least 1")]
    WorkerCount,
}

/// How a resource is split into chunks.
///
/// Without range support the plan is one chunk of `total_size` bytes. With
/// it, `chunk_size = total_size / worker_count + 1` (rounded up so the
/// chunks always cover the resource); the last chunk is clipped to
/// `total_size - 1` and the count drops below `worker_count` when fewer
/// chunks already cover everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadPlan {
    pub target: Target,
    pub total_size: u64,
    pub accepts_ranges: bool,
    pub chunk_size: u64,
    pub chunk_count: usize,
}

impl DownloadPlan {
    /// Builds a plan from a probe result.
    pub fn from_probe(
        target: Target,
        head: &HeadResult,
        worker_count: usize,
    ) -> Result<Self, PlanError> {
        if worker_count == 0 {
            return Err(PlanError::WorkerCount);
        }
        if let Some(code) = head.status {
            if !(200..300).contains(&code) {
                return Err(PlanError::ProbeStatus(code));
            }
        }
        let total_size = match head.content_length {
            None => return Err(PlanError::ProbeParse("missing Content-Length".into())),
            Some(0) => return Err(PlanError::ProbeParse("Content-Length is 0".into())),
            Some(n) => n,
        };

        if !head.accepts_ranges {
            return Ok(Self {
                target,
                total_size,
                accepts_ranges: false,
                chunk_size: total_size,
                chunk_count: 1,
            });
        }

        let chunk_size = total_size / worker_count as u64 + 1;
        let needed = total_size.div_ceil(chunk_size);
        let chunk_count = (worker_count as u64).min(needed) as usize;

        Ok(Self {
            target,
            total_size,
            accepts_ranges: true,
            chunk_size,
            chunk_count,
        })
    }

    /// Descriptor for chunk `index` (`0..chunk_count`).
    pub fn chunk(&self, index: usize) -> ChunkDescriptor {
        let start = index as u64 * self.chunk_size;
        let end_excl = (start + self.chunk_size).min(self.total_size);
        ChunkDescriptor {
            host: self.target.host.clone(),
            path: self.target.path.clone(),
            port: self.target.port,
            range_start: start,
            range_end: end_excl - 1,
            sequence_index: index,
        }
    }

    /// All descriptors in `sequence_index` order.
    pub fn chunks(&self) -> Vec<ChunkDescriptor> {
        (0..self.chunk_count).map(|i| self.chunk(i)).collect()
    }
}

/// Probes `target` and plans it for `worker_count` workers.
pub fn plan_target(
    target: Target,
    worker_count: usize,
    client: &HttpClient,
) -> Result<DownloadPlan, PlanError> {
    if worker_count == 0 {
        return Err(PlanError::WorkerCount);
    }
    let head = client.probe(&target)?;
    let plan = DownloadPlan::from_probe(target, &head, worker_count)?;
    tracing::info!(
        resource = %plan.target,
        total_size = plan.total_size,
        accepts_ranges = plan.accepts_ranges,
        chunk_size = plan.chunk_size,
        chunk_count = plan.chunk_count,
        "download planned"
    );
    Ok(plan)
}

/// Splits `url`, probes it, and plans it for `worker_count` workers.
pub fn plan(url: &str, worker_count: usize, client: &HttpClient) -> Result<DownloadPlan, PlanError> {
    let target = split_url(url)?;
    plan_target(target, worker_count, client)
}
