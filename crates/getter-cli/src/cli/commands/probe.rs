//! `getter probe` – HEAD the resource and print the chunk plan.

use anyhow::{Context, Result};
use getter_core::config::GetterConfig;
use getter_core::http::{split_url_with_port, HttpClient};
use getter_core::planner::plan_target;

pub fn run_probe(cfg: &GetterConfig, url: &str, workers: Option<usize>, json: bool) -> Result<()> {
    let workers = workers.unwrap_or(cfg.worker_count);
    let client = HttpClient::from_config(cfg);
    let target = split_url_with_port(url, cfg.port)?;
    let plan = plan_target(target, workers, &client).with_context(|| format!("plan {}", url))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("resource:       {}", plan.target);
    println!("total size:     {} bytes", plan.total_size);
    println!("accepts ranges: {}", if plan.accepts_ranges { "yes" } else { "no" });
    println!("chunk size:     {} bytes", plan.chunk_size);
    println!("chunks:         {}", plan.chunk_count);
    for chunk in plan.chunks() {
        println!(
            "  #{:<3} {} ({} bytes)",
            chunk.sequence_index,
            chunk.range_header_value(),
            chunk.len()
        );
    }
    Ok(())
}
