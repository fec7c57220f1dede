//! CLI command handlers, one per file.

mod checksum;
mod fetch;
mod probe;

pub use checksum::run_checksum;
pub use fetch::{run_fetch, FetchArgs};
pub use probe::run_probe;
