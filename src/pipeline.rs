use anyhow::{Context, Result};
use reqwest::Client;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

use crate::config::{CombineConfig, JobConfig};
use crate::fetch::{self, QueryResponse};
use crate::process::{self, merge_tables, project_derived_columns, Table};
use crate::store;

/// What a finished job produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    pub output: PathBuf,
}

/// Shape a decoded response per `job`: declared fields (or the response's own
/// variables) checked against `head.vars`, then projected.
pub fn table_for_job(job: &JobConfig, response: &QueryResponse) -> Result<Table> {
    let spec = match &job.fields {
        Some(spec) => spec.clone(),
        None => response.vars_field_spec(),
    };
    response.check_vars(&spec)?;
    let table = process::project_with_mode(response.bindings(), &spec, job.mode)?;
    Ok(table)
}

/// Fetch, project and write one job.
#[instrument(level = "info", skip_all, fields(job = %job.name))]
pub async fn run_job(client: &Client, job: &JobConfig) -> Result<JobReport> {
    let response = fetch::fetch_results(client, &job.source).await?;
    let table = table_for_job(job, &response)
        .with_context(|| format!("projecting results of `{}`", job.name))?;
    store::write_csv(&table, &job.output, job.write_index)?;

    info!(
        rows = table.num_rows(),
        columns = table.num_columns(),
        output = %job.output.display(),
        "job done"
    );
    Ok(JobReport {
        name: job.name.clone(),
        rows: table.num_rows(),
        columns: table.num_columns(),
        output: job.output.clone(),
    })
}

/// Merge every CSV matched by `cfg.input`, then derive, rename and drop.
/// The output file is never read back as an input.
#[instrument(level = "info", skip_all, fields(input = %cfg.input))]
pub fn combine(cfg: &CombineConfig) -> Result<Table> {
    let output = cfg.output.canonicalize().ok();
    let mut tables = Vec::new();
    for path in store::discover(&cfg.input)? {
        if output.is_some() && path.canonicalize().ok() == output {
            warn!(path = %path.display(), "skipping previous output");
            continue;
        }
        info!(path = %path.display(), "reading");
        tables.push(store::read_csv(&path)?);
    }

    let mut table = merge_tables(tables, cfg.index_column.as_deref())
        .with_context(|| format!("merging {}", cfg.input))?;
    project_derived_columns(&mut table, &cfg.derive)?;
    table.rename_columns(&cfg.rename)?;
    table.drop_columns(&cfg.drop)?;

    info!(
        rows = table.num_rows(),
        columns = ?table.headers,
        "combined"
    );
    Ok(table)
}

/// [`combine`] and write the result to `cfg.output`.
pub fn run_combine(cfg: &CombineConfig) -> Result<Table> {
    let table = combine(cfg)?;
    store::write_csv(&table, &cfg.output, cfg.write_index)?;
    Ok(table)
}
