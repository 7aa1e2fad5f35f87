use anyhow::{Context, Result};
use graphcsv::{config::JobConfig, fetch, init_logging, pipeline::table_for_job};
use reqwest::Client;
use std::{env, io};

/// Run one job and print its table as CSV instead of writing the output file.
#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <job.yaml>", args[0]);
        std::process::exit(1);
    }
    let job = JobConfig::load(&args[1])?;

    let response = fetch::fetch_results(&Client::new(), &job.source).await?;
    let table = table_for_job(&job, &response)?;

    let mut wtr = csv::Writer::from_writer(io::stdout().lock());
    wtr.write_record(&table.headers)?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
    }
    wtr.flush().context("flushing stdout")?;
    Ok(())
}
