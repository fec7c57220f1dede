//! `getter fetch` – plan, download in parallel, write the file.

use anyhow::{bail, Context, Result};
use getter_core::checksum;
use getter_core::config::GetterConfig;
use getter_core::download::{run_download, DownloadOptions, MemorySink};
use getter_core::http::{split_url_with_port, HttpClient};
use getter_core::planner::plan_target;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const FALLBACK_FILE_NAME: &str = "download.bin";

/// Arguments of `getter fetch`, already parsed.
#[derive(Debug)]
pub struct FetchArgs {
    pub url: String,
    pub output: Option<PathBuf>,
    pub workers: Option<usize>,
    pub sha256: bool,
}

/// Local file name for a remote path: its last segment without the query.
pub(crate) fn default_file_name(remote_path: &str) -> &str {
    let without_query = remote_path.split(['?', '#']).next().unwrap_or("");
    match without_query.rsplit('/').next() {
        Some(name) if !name.is_empty() && name != "." && name != ".." => name,
        _ => FALLBACK_FILE_NAME,
    }
}

pub fn run_fetch(cfg: &GetterConfig, args: &FetchArgs) -> Result<()> {
    let workers = args.workers.unwrap_or(cfg.worker_count);
    let client = HttpClient::from_config(cfg);
    let target = split_url_with_port(&args.url, cfg.port)?;
    let plan = plan_target(target, workers, &client)
        .with_context(|| format!("plan {}", args.url))?;

    println!(
        "{}: {} bytes, {} chunk(s) of up to {} bytes{}",
        plan.target,
        plan.total_size,
        plan.chunk_count,
        plan.chunk_size,
        if plan.accepts_ranges {
            ""
        } else {
            " (server ignores ranges)"
        }
    );

    let options = DownloadOptions {
        worker_count: workers,
        ..DownloadOptions::from_config(cfg)
    };
    let mut sink = MemorySink::new(plan.chunk_count);
    let report = run_download(&plan, Arc::new(client), &mut sink, &options)?;

    for (index, err) in sink.errors() {
        eprintln!("  chunk {} failed: {}", index, err);
    }
    if !report.is_complete() {
        bail!(
            "{} of {} chunk(s) failed; nothing written",
            report.failed.len(),
            report.chunk_count
        );
    }

    let path = match &args.output {
        Some(p) => p.clone(),
        None => PathBuf::from(default_file_name(&plan.target.path)),
    };
    let written = sink.write_to(&path)?;
    println!(
        "wrote {} bytes to {} in {:.2}s ({:.2} MiB/s)",
        written,
        path.display(),
        report.elapsed.as_secs_f64(),
        report.bytes_per_sec() / 1_048_576.0
    );

    if args.sha256 {
        print_digest(&path)?;
    }
    Ok(())
}

fn print_digest(path: &Path) -> Result<()> {
    let digest = checksum::sha256_path(path)?;
    println!("{}  {}", digest, path.display());
    Ok(())
}
