use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::TableError;
use crate::schema::{FieldSpec, RawRecord};

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct Head {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct Results {
    #[serde(default)]
    pub bindings: Vec<RawRecord>,
}

/// Decoded body of a query response:
///
/// ```text
/// { "head":    { "vars": ["name", "nameLabel", ...] },
///   "results": { "bindings": [ { "name": { "type": "uri", "value": "..." }, ... }, ... ] } }
/// ```
#[derive(Debug, Deserialize, PartialEq)]
pub struct QueryResponse {
    #[serde(default)]
    pub head: Head,
    pub results: Results,
}

impl QueryResponse {
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body).context("decoding query results JSON")
    }

    pub fn vars(&self) -> &[String] {
        &self.head.vars
    }

    pub fn bindings(&self) -> &[RawRecord] {
        &self.results.bindings
    }

    /// Declared variables as plain fields, for jobs that keep every column.
    pub fn vars_field_spec(&self) -> FieldSpec {
        FieldSpec::plain(self.head.vars.iter().cloned())
    }

    /// Every variable `spec` reads must be one the query selects. Skipped when
    /// the endpoint sent no `head.vars`.
    pub fn check_vars(&self, spec: &FieldSpec) -> std::result::Result<(), TableError> {
        if self.head.vars.is_empty() {
            return Ok(());
        }
        let missing: Vec<String> = spec
            .variables()
            .into_iter()
            .filter(|v| !self.head.vars.contains(v))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TableError::SchemaMismatch(format!(
                "query does not select {:?}",
                missing
            )))
        }
    }
}
