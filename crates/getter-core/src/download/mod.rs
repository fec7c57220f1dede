//! Runs a plan: job queue, worker pool, result collection, shutdown.
//!
//! Order of events for one download:
//! 1. every chunk descriptor is put on the job queue (sized to the plan, so
//!    this never blocks);
//! 2. the worker pool starts;
//! 3. this thread takes exactly `chunk_count` outcomes off the result queue
//!    and hands each to the sink;
//! 4. one shutdown job per worker is queued and the pool is joined.
//!
//! On cancellation, or when a worker dies before every outcome is in, the
//! pool is stopped and the result queue drained until every worker has
//! exited, so no worker stays blocked on a full result queue.

mod sink;

pub use sink::{MemorySink, ResultSink, SinkError};

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::GetterConfig;
use crate::control::CancelToken;
use crate::http::HttpClient;
use crate::planner::{plan, DownloadPlan, PlanError};
use crate::pool::{Job, PoolError, RangeFetcher, WorkerPool};
use crate::queue::{BoundedQueue, QueueError};

/// How often the collector re-checks cancellation and worker liveness.
const COLLECT_POLL: Duration = Duration::from_millis(50);
const DRAIN_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("worker count must be at least 1")]
    WorkerCount,
    #[error("download cancelled")]
    Cancelled,
    /// Workers exited before every chunk outcome was received.
    #[error("workers exited after {received} of {expected} chunk outcome(s)")]
    Incomplete { received: usize, expected: usize },
}

/// Runtime knobs for one download.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Worker threads; also the planner's target chunk count.
    pub worker_count: usize,
    /// Capacity of the result queue (defaults to `worker_count`).
    pub result_queue_capacity: Option<usize>,
    pub cancel: CancelToken,
}

impl DownloadOptions {
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count,
            result_queue_capacity: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn from_config(cfg: &GetterConfig) -> Self {
        Self {
            worker_count: cfg.worker_count,
            result_queue_capacity: cfg.result_queue_capacity,
            cancel: CancelToken::new(),
        }
    }

    fn result_capacity(&self) -> usize {
        self.result_queue_capacity
            .unwrap_or(self.worker_count)
            .max(1)
    }
}

/// Summary of a finished download.
#[derive(Debug, Clone, Default)]
pub struct DownloadReport {
    pub chunk_count: usize,
    /// Chunks fetched successfully.
    pub fetched: usize,
    /// `sequence_index` of every chunk whose fetch failed.
    pub failed: Vec<usize>,
    /// Payload bytes received across all successful chunks.
    pub bytes: u64,
    pub elapsed: Duration,
}

impl DownloadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.fetched == self.chunk_count
    }

    /// Average payload rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.bytes as f64 / secs
    }
}

/// Fetches every chunk of `plan` with `options.worker_count` workers and
/// passes each outcome to `sink`.
///
/// A failed chunk does not stop the others; it is listed in
/// [`DownloadReport::failed`] and its error is handed to the sink.
pub fn run_download(
    plan: &DownloadPlan,
    fetcher: Arc<dyn RangeFetcher>,
    sink: &mut dyn ResultSink,
    options: &DownloadOptions,
) -> Result<DownloadReport, DownloadError> {
    if options.worker_count == 0 {
        return Err(DownloadError::WorkerCount);
    }
    let started = Instant::now();

    let jobs = Arc::new(BoundedQueue::new(plan.chunk_count)?);
    for chunk in plan.chunks() {
        jobs.put(Job::Fetch(chunk));
    }
    let results = Arc::new(BoundedQueue::new(options.result_capacity())?);

    let mut pool = WorkerPool::spawn(
        options.worker_count,
        Arc::clone(&jobs),
        Arc::clone(&results),
        fetcher,
        options.cancel.clone(),
    )?;

    let mut report = DownloadReport {
        chunk_count: plan.chunk_count,
        ..DownloadReport::default()
    };
    let mut received = 0;
    while received < plan.chunk_count {
        if options.cancel.is_cancelled() {
            break;
        }
        let Some(outcome) = results.get_timeout(COLLECT_POLL) else {
            // No worker exits on its own before shutdown; one that has is
            // dead and its chunk will never be reported.
            if pool.any_exited() {
                break;
            }
            continue;
        };
        received += 1;
        match &outcome.result {
            Ok(bytes) => {
                report.fetched += 1;
                report.bytes += bytes.len() as u64;
            }
            Err(_) => report.failed.push(outcome.sequence_index()),
        }
        sink.accept(outcome);
    }

    if received < plan.chunk_count {
        // Workers may be parked on a full result queue; keep it moving
        // until all of them have seen the stop.
        pool.stop();
        while !pool.is_finished() {
            let _ = results.get_timeout(DRAIN_POLL);
        }
        pool.join()?;
        if options.cancel.is_cancelled() {
            tracing::info!(
                fetched = report.fetched,
                chunk_count = report.chunk_count,
                "download cancelled"
            );
            return Err(DownloadError::Cancelled);
        }
        return Err(DownloadError::Incomplete {
            received,
            expected: plan.chunk_count,
        });
    }

    pool.shutdown();
    pool.join()?;

    report.elapsed = started.elapsed();
    if report.failed.is_empty() {
        tracing::info!(
            chunks = report.chunk_count,
            bytes = report.bytes,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "download finished"
        );
    } else {
        tracing::warn!(
            failed = ?report.failed,
            chunks = report.chunk_count,
            "download finished with failed chunks"
        );
    }
    Ok(report)
}

/// Plans `url` and downloads it with `client`, returning the plan and report.
pub fn download(
    url: &str,
    client: &HttpClient,
    sink: &mut dyn ResultSink,
    options: &DownloadOptions,
) -> Result<(DownloadPlan, DownloadReport), DownloadError> {
    let plan = plan(url, options.worker_count, client)?;
    let fetcher: Arc<dyn RangeFetcher> = Arc::new(client.clone());
    let report = run_download(&plan, fetcher, sink, options)?;
    Ok((plan, report))
}
