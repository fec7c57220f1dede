pub mod config;
pub mod logging;

pub mod checksum;
pub mod control;
pub mod download;
pub mod http;
pub mod planner;
pub mod pool;
pub mod queue;

pub use control::CancelToken;
pub use download::{download, run_download, DownloadError, DownloadOptions, DownloadReport};
pub use planner::{plan, ChunkDescriptor, DownloadPlan, PlanError};
pub use queue::{BoundedQueue, QueueError};
