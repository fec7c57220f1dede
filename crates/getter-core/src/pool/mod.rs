//! Fixed pool of fetch workers fed from a bounded job queue.
//!
//! Each worker loops: take a [`Job`], fetch the chunk, put a
//! [`ChunkOutcome`] on the result queue. Workers have no affinity to chunks
//! and keep no state besides their queue handles.
//!
//! Termination contract: once the owner has received one outcome per
//! planned chunk, it calls [`WorkerPool::shutdown`], which enqueues exactly
//! one [`Job::Shutdown`] per worker, and then [`WorkerPool::join`]. Because
//! every real job precedes the shutdown jobs in the FIFO, no worker exits
//! with work still queued. A triggered [`CancelToken`], or
//! [`WorkerPool::stop`], also ends the loop at the next wait.
//!
//! A panic inside a fetch is caught and reported as that chunk's
//! [`FetchError::Panicked`]; the worker carries on with the next job.

mod fetcher;

pub use fetcher::RangeFetcher;

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::control::CancelToken;
use crate::http::FetchError;
use crate::planner::ChunkDescriptor;
use crate::queue::BoundedQueue;

/// Item carried by the job queue.
#[derive(Debug, Clone)]
pub enum Job {
    Fetch(ChunkDescriptor),
    /// Poison pill: the worker that takes it exits.
    Shutdown,
}

/// Result of fetching one chunk, tagged with its descriptor.
#[derive(Debug)]
pub struct ChunkOutcome {
    pub descriptor: ChunkDescriptor,
    pub result: Result<Vec<u8>, FetchError>,
}

impl ChunkOutcome {
    pub fn sequence_index(&self) -> usize {
        self.descriptor.sequence_index
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("spawn worker thread: {0}")]
    Spawn(#[source] io::Error),
    #[error("worker {0} panicked")]
    WorkerPanicked(usize),
}

/// Handles to the running workers plus the job queue used to stop them.
pub struct WorkerPool {
    jobs: Arc<BoundedQueue<Job>>,
    handles: Vec<JoinHandle<()>>,
    /// Child of the caller's token; stopping the pool leaves the caller's
    /// token as it was.
    stop: CancelToken,
    shutdown_sent: bool,
}

impl WorkerPool {
    /// Starts `worker_count` threads draining `jobs` into `results`.
    ///
    /// Workers also exit when `cancel` fires. If a spawn fails, the
    /// workers already started are stopped and joined before the error is
    /// returned; `cancel` itself is not touched.
    pub fn spawn(
        worker_count: usize,
        jobs: Arc<BoundedQueue<Job>>,
        results: Arc<BoundedQueue<ChunkOutcome>>,
        fetcher: Arc<dyn RangeFetcher>,
        cancel: CancelToken,
    ) -> Result<Self, PoolError> {
        let mut pool = Self {
            jobs: Arc::clone(&jobs),
            handles: Vec::with_capacity(worker_count),
            stop: cancel.child(),
            shutdown_sent: false,
        };
        for id in 0..worker_count {
            let jobs = Arc::clone(&jobs);
            let results = Arc::clone(&results);
            let fetcher = Arc::clone(&fetcher);
            let worker_cancel = pool.stop.clone();
            let spawned = thread::Builder::new()
                .name(format!("getter-worker-{id}"))
                .spawn(move || {
                    worker_loop(id, &jobs, &results, fetcher.as_ref(), &worker_cancel)
                });
            match spawned {
                Ok(handle) => pool.handles.push(handle),
                Err(e) => {
                    pool.stop();
                    let _ = pool.join();
                    return Err(PoolError::Spawn(e));
                }
            }
        }
        tracing::debug!(workers = worker_count, "worker pool started");
        Ok(pool)
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// True once every worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handles.iter().all(JoinHandle::is_finished)
    }

    /// True if at least one worker thread has exited. Before shutdown and
    /// without cancellation this means a worker died.
    pub fn any_exited(&self) -> bool {
        self.handles.iter().any(JoinHandle::is_finished)
    }

    /// Makes every worker exit at its next wait, without queueing anything.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// Enqueues one shutdown job per worker. Call only after every real job
    /// has been consumed or is ahead in the queue, and not after the workers
    /// were cancelled (nobody would drain the pills). Idempotent.
    pub fn shutdown(&mut self) {
        if self.shutdown_sent {
            return;
        }
        self.shutdown_sent = true;
        for _ in 0..self.handles.len() {
            self.jobs.put(Job::Shutdown);
        }
    }

    /// Waits for every worker to exit. Reports the first panicked worker.
    pub fn join(mut self) -> Result<(), PoolError> {
        let mut first_err = None;
        for (id, handle) in self.handles.drain(..).enumerate() {
            if handle.join().is_err() && first_err.is_none() {
                first_err = Some(PoolError::WorkerPanicked(id));
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn worker_loop(
    id: usize,
    jobs: &BoundedQueue<Job>,
    results: &BoundedQueue<ChunkOutcome>,
    fetcher: &dyn RangeFetcher,
    cancel: &CancelToken,
) {
    loop {
        if cancel.is_cancelled() {
            tracing::debug!(worker = id, "worker cancelled");
            break;
        }
        let descriptor = match jobs.get_cancellable(cancel) {
            Some(Job::Fetch(d)) => d,
            Some(Job::Shutdown) => break,
            None => {
                tracing::debug!(worker = id, "worker cancelled while waiting");
                break;
            }
        };
        let result = panic::catch_unwind(AssertUnwindSafe(|| fetcher.fetch(&descriptor)))
            .unwrap_or_else(|payload| Err(FetchError::Panicked(panic_message(payload.as_ref()))));
        match &result {
            Ok(body) => tracing::debug!(
                worker = id,
                chunk = descriptor.sequence_index,
                bytes = body.len(),
                "chunk fetched"
            ),
            Err(e) => tracing::warn!(
                worker = id,
                chunk = descriptor.sequence_index,
                range = %descriptor.range_header_value(),
                "chunk fetch failed: {}",
                e
            ),
        }
        results.put(ChunkOutcome { descriptor, result });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Returns the chunk's bytes from a fixed body; fails chunks listed in `fail`.
    struct FakeFetcher {
        body: Vec<u8>,
        fail: Vec<usize>,
        calls: Mutex<Vec<(u64, u64)>>,
    }

    impl RangeFetcher for FakeFetcher {
        fn fetch(&self, chunk: &ChunkDescriptor) -> Result<Vec<u8>, FetchError> {
            self.calls
                .lock()
                .unwrap()
                .push((chunk.range_start, chunk.range_end));
            if self.fail.contains(&chunk.sequence_index) {
                return Err(FetchError::Read(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "reset",
                )));
            }
            Ok(self.body[chunk.range_start as usize..=chunk.range_end as usize].to_vec())
        }
    }

    fn descriptor(i: usize, start: u64, end: u64) -> ChunkDescriptor {
        ChunkDescriptor {
            host: "h".into(),
            path: "p".into(),
            port: 80,
            range_start: start,
            range_end: end,
            sequence_index: i,
        }
    }

    fn run(fetcher: Arc<FakeFetcher>, chunks: Vec<ChunkDescriptor>, workers: usize) -> Vec<ChunkOutcome> {
        let jobs = Arc::new(BoundedQueue::new(chunks.len()).unwrap());
        let results = Arc::new(BoundedQueue::new(2).unwrap());
        let n = chunks.len();
        for c in chunks {
            jobs.put(Job::Fetch(c));
        }
        let mut pool = WorkerPool::spawn(
            workers,
            Arc::clone(&jobs),
            Arc::clone(&results),
            fetcher,
            CancelToken::new(),
        )
        .unwrap();
        assert_eq!(pool.worker_count(), workers);
        let outcomes: Vec<_> = (0..n).map(|_| results.get()).collect();
        pool.shutdown();
        pool.join().unwrap();
        assert!(jobs.is_empty());
        outcomes
    }

    #[test]
    fn every_chunk_fetched_exactly_once() {
        let fetcher = Arc::new(FakeFetcher {
            body: (0u8..=99).collect(),
            fail: vec![],
            calls: Mutex::new(Vec::new()),
        });
        let chunks: Vec<_> = (0..10).map(|i| descriptor(i, i as u64 * 10, i as u64 * 10 + 9)).collect();
        let mut outcomes = run(Arc::clone(&fetcher), chunks, 3);

        outcomes.sort_by_key(|o| o.sequence_index());
        let joined: Vec<u8> = outcomes
            .into_iter()
            .flat_map(|o| o.result.unwrap())
            .collect();
        assert_eq!(joined, (0u8..=99).collect::<Vec<_>>());

        let mut calls = fetcher.calls.lock().unwrap().clone();
        calls.sort_unstable();
        assert_eq!(calls.len(), 10);
        calls.dedup();
        assert_eq!(calls.len(), 10);
    }

    #[test]
    fn failed_chunk_is_reported_and_siblings_complete() {
        let fetcher = Arc::new(FakeFetcher {
            body: vec![7; 40],
            fail: vec![2],
            calls: Mutex::new(Vec::new()),
        });
        let chunks: Vec<_> = (0..4).map(|i| descriptor(i, i as u64 * 10, i as u64 * 10 + 9)).collect();
        let outcomes = run(fetcher, chunks, 2);

        assert_eq!(outcomes.len(), 4);
        for o in &outcomes {
            if o.sequence_index() == 2 {
                assert!(matches!(o.result, Err(FetchError::Read(_))));
            } else {
                assert_eq!(o.result.as_ref().unwrap().len(), 10);
            }
        }
    }

    #[test]
    fn more_workers_than_chunks_still_terminates() {
        let fetcher = Arc::new(FakeFetcher {
            body: vec![1; 5],
            fail: vec![],
            calls: Mutex::new(Vec::new()),
        });
        let outcomes = run(fetcher, vec![descriptor(0, 0, 4)], 6);
        assert_eq!(outcomes.len(), 1);
    }

    #[test]
    fn cancel_stops_idle_workers() {
        let jobs = Arc::new(BoundedQueue::<Job>::new(1).unwrap());
        let results = Arc::new(BoundedQueue::new(1).unwrap());
        let cancel = CancelToken::new();
        let fetcher = Arc::new(FakeFetcher {
            body: vec![],
            fail: vec![],
            calls: Mutex::new(Vec::new()),
        });
        let pool = WorkerPool::spawn(3, jobs, results, fetcher, cancel.clone()).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        cancel.cancel();
        pool.join().unwrap();
    }

    /// Panics on the chunk listed in `panic_on`, succeeds on the rest.
    struct PanickyFetcher {
        panic_on: usize,
    }

    impl RangeFetcher for PanickyFetcher {
        fn fetch(&self, chunk: &ChunkDescriptor) -> Result<Vec<u8>, FetchError> {
            if chunk.sequence_index == self.panic_on {
                panic!("bad chunk {}", chunk.sequence_index);
            }
            Ok(vec![0; chunk.len() as usize])
        }
    }

    #[test]
    fn panicking_fetch_becomes_chunk_error() {
        let jobs = Arc::new(BoundedQueue::new(4).unwrap());
        let results = Arc::new(BoundedQueue::new(4).unwrap());
        for i in 0..4 {
            jobs.put(Job::Fetch(descriptor(i, i as u64 * 10, i as u64 * 10 + 9)));
        }
        // One worker, so the panic would strand every later chunk if it
        // killed the thread.
        let mut pool = WorkerPool::spawn(
            1,
            Arc::clone(&jobs),
            Arc::clone(&results),
            Arc::new(PanickyFetcher { panic_on: 1 }),
            CancelToken::new(),
        )
        .unwrap();

        let mut outcomes: Vec<ChunkOutcome> = (0..4).map(|_| results.get()).collect();
        outcomes.sort_by_key(|o| o.sequence_index());
        pool.shutdown();
        pool.join().unwrap();

        match &outcomes[1].result {
            Err(FetchError::Panicked(msg)) => assert_eq!(msg, "bad chunk 1"),
            other => panic!("expected Panicked, got {other:?}"),
        }
        for i in [0, 2, 3] {
            assert_eq!(outcomes[i].result.as_ref().unwrap().len(), 10);
        }
    }

    #[test]
    fn join_reports_panicked_worker() {
        let pool = WorkerPool {
            jobs: Arc::new(BoundedQueue::new(1).unwrap()),
            handles: vec![
                thread::spawn(|| {}),
                thread::spawn(|| panic!("worker died")),
            ],
            stop: CancelToken::new(),
            shutdown_sent: false,
        };
        while !pool.is_finished() {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(pool.any_exited());
        assert!(matches!(pool.join(), Err(PoolError::WorkerPanicked(1))));
    }

    #[test]
    fn stop_leaves_callers_token_alone() {
        let jobs = Arc::new(BoundedQueue::<Job>::new(1).unwrap());
        let results = Arc::new(BoundedQueue::new(1).unwrap());
        let caller = CancelToken::new();
        let fetcher = Arc::new(FakeFetcher {
            body: vec![],
            fail: vec![],
            calls: Mutex::new(Vec::new()),
        });
        let pool = WorkerPool::spawn(2, jobs, results, fetcher, caller.clone()).unwrap();
        assert!(!pool.any_exited());
        pool.stop();
        pool.join().unwrap();
        assert!(!caller.is_cancelled());
    }
}
