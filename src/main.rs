use anyhow::{bail, Result};
use futures::{stream::FuturesUnordered, StreamExt};
use graphcsv::{config::load_jobs, init_logging, pipeline::run_job};
use reqwest::Client;
use std::{env, path::PathBuf};
use tracing::{error, info};

/// Jobs in flight at once; the public endpoint throttles aggressive clients.
const MAX_CONCURRENCY: usize = 2;

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    init_logging();
    info!("startup");

    // ─── 2) load jobs ────────────────────────────────────────────────
    let jobs_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("jobs"));
    let jobs = load_jobs(&jobs_dir)?;
    info!("{} jobs in {}", jobs.len(), jobs_dir.display());

    // ─── 3) run them, a few at a time ────────────────────────────────
    let client = Client::new();
    let mut pending = jobs.iter();
    let mut tasks = FuturesUnordered::new();
    let mut failed = Vec::new();

    loop {
        while tasks.len() < MAX_CONCURRENCY {
            match pending.next() {
                Some(job) => {
                    let client = &client;
                    tasks.push(async move { (job.name.as_str(), run_job(client, job).await) })
                }
                None => break,
            }
        }

        match tasks.next().await {
            Some((_, Ok(report))) => {
                info!(
                    job = %report.name,
                    rows = report.rows,
                    output = %report.output.display(),
                    "wrote"
                );
            }
            Some((name, Err(e))) => {
                error!(job = %name, "failed: {:#}", e);
                failed.push(name);
            }
            None => break,
        }
    }

    if !failed.is_empty() {
        bail!("{} job(s) failed: {}", failed.len(), failed.join(", "));
    }
    info!("all done");
    Ok(())
}
