//! YAML job files: what to query, where, and how to shape the output.

use anyhow::{anyhow, bail, Context, Result};
use glob::glob;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;
use url::Url;

use crate::process::DeriveRule;
use crate::schema::{FieldSpec, ProjectionMode};

pub const WIKIDATA_ENDPOINT: &str = "https://query.wikidata.org/sparql";

fn default_endpoint() -> Url {
    Url::parse(WIKIDATA_ENDPOINT).expect("WIKIDATA_ENDPOINT is a valid URL")
}

fn default_true() -> bool {
    true
}

fn default_index_column() -> Option<String> {
    Some(String::new())
}

/// Who is asking; public endpoints want this in the User-Agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(alias = "project-name")]
    pub project_name: String,
    pub website: String,
    #[serde(default)]
    pub email: String,
}

impl Contact {
    pub fn user_agent(&self) -> String {
        format!("{} ({}; {})", self.project_name, self.website, self.email)
    }
}

/// Fetch retry knobs, written at the top level of a job file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 500,
        }
    }
}

/// Endpoint, query text and contact for one fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySource {
    #[serde(default = "default_endpoint")]
    pub endpoint: Url,
    pub query: String,
    pub contact: Contact,
    #[serde(flatten)]
    pub retry: RetryPolicy,
}

/// One fetch-and-write job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    #[serde(flatten)]
    pub source: QuerySource,
    /// Columns to keep. When absent, the response's declared variables are
    /// used as plain fields.
    #[serde(default)]
    pub fields: Option<FieldSpec>,
    #[serde(default)]
    pub mode: ProjectionMode,
    pub output: PathBuf,
    /// Lead every row with its ordinal under an unnamed header.
    #[serde(default = "default_true")]
    pub write_index: bool,
}

impl JobConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let job: JobConfig = serde_yaml::from_str(text)?;
        job.validate()?;
        Ok(job)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        Self::from_yaml(&text).with_context(|| format!("parsing job {:?}", path))
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("job name is empty");
        }
        if self.source.query.trim().is_empty() {
            bail!("job `{}` has an empty query", self.name);
        }
        if matches!(&self.fields, Some(f) if f.is_empty()) {
            bail!("job `{}` declares an empty field list", self.name);
        }
        if self.output.as_os_str().is_empty() {
            bail!("job `{}` has no output path", self.name);
        }
        Ok(())
    }
}

/// Load every `*.yaml` job in `dir`, sorted by file name.
pub fn load_jobs<P: AsRef<Path>>(dir: P) -> Result<Vec<JobConfig>> {
    let dir = dir.as_ref();
    let pattern = format!("{}/*.yaml", dir.display());
    let mut paths: Vec<PathBuf> = glob(&pattern)
        .with_context(|| format!("bad job pattern {}", pattern))?
        .filter_map(|entry| entry.ok())
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(anyhow!("no job files in {:?}", dir));
    }

    paths
        .iter()
        .map(|p| {
            debug!(path = %p.display(), "loading job");
            JobConfig::load(p)
        })
        .collect()
}

/// Merge + reshape step over previously written CSVs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombineConfig {
    /// Glob of CSV files to merge, matched relative to the working directory.
    pub input: String,
    pub output: PathBuf,
    /// Row-ordinal column to drop from each input; `~` to keep everything.
    #[serde(default = "default_index_column")]
    pub index_column: Option<String>,
    #[serde(default)]
    pub derive: Vec<DeriveRule>,
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
    #[serde(default)]
    pub drop: Vec<String>,
    #[serde(default = "default_true")]
    pub write_index: bool,
}

impl CombineConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let cfg: CombineConfig = serde_yaml::from_str(text)?;
        if cfg.input.trim().is_empty() {
            bail!("combine input pattern is empty");
        }
        Ok(cfg)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        Self::from_yaml(&text).with_context(|| format!("parsing combine config {:?}", path))
    }
}
