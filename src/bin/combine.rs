// src/bin/combine.rs

use anyhow::Result;
use graphcsv::{config::CombineConfig, init_logging, pipeline::run_combine};
use std::{env, path::PathBuf};
use tracing::info;

fn main() -> Result<()> {
    init_logging();

    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("combine.yaml"));
    let cfg = CombineConfig::load(&config_path)?;

    let table = run_combine(&cfg)?;
    info!(
        "wrote {} rows to {} with columns {:?}",
        table.num_rows(),
        cfg.output.display(),
        table.headers
    );
    Ok(())
}
