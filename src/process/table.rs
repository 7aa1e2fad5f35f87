use crate::error::{Result, TableError};
use std::collections::{BTreeMap, HashSet};

/// A flat, string-typed table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    /// Column names, in output order.
    pub headers: Vec<String>,
    /// One entry per row, aligned to `headers`. `None` is a null cell.
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_rows(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == headers.len()));
        Self { headers, rows }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.headers.len()
    }

    pub fn push_row(&mut self, row: Vec<Option<String>>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))
    }

    /// Cell at `row` in column `name`; `None` for a null cell or unknown column.
    pub fn get(&self, row: usize, name: &str) -> Option<&str> {
        let idx = self.column_index(name)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// Row `i` keyed by column name.
    pub fn row_map(&self, i: usize) -> Option<BTreeMap<&str, Option<&str>>> {
        let row = self.rows.get(i)?;
        Some(
            self.headers
                .iter()
                .map(String::as_str)
                .zip(row.iter().map(Option::as_deref))
                .collect(),
        )
    }

    pub fn column_set(&self) -> HashSet<&str> {
        self.headers.iter().map(String::as_str).collect()
    }

    /// Remove column `name` and hand back its cells.
    pub fn take_column(&mut self, name: &str) -> Result<Vec<Option<String>>> {
        let idx = self.require_column(name)?;
        self.headers.remove(idx);
        Ok(self.rows.iter_mut().map(|r| r.remove(idx)).collect())
    }

    /// Write `values` into column `name`, replacing it in place if it exists
    /// or appending it otherwise.
    pub fn set_column(&mut self, name: &str, values: Vec<Option<String>>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_index(name) {
            Some(idx) => {
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row[idx] = v;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row.push(v);
                }
            }
        }
    }

    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        // all-or-nothing: check before touching anything
        for name in names {
            self.require_column(name.as_ref())?;
        }
        for name in names {
            // a name listed twice is already gone
            if self.column_index(name.as_ref()).is_some() {
                self.take_column(name.as_ref())?;
            }
        }
        Ok(())
    }

    /// Rename columns per `renames` (old → new). Fails if an old name is
    /// unknown or the result would hold two columns with one name.
    pub fn rename_columns(&mut self, renames: &BTreeMap<String, String>) -> Result<()> {
        for old in renames.keys() {
            self.require_column(old)?;
        }
        let renamed: Vec<String> = self
            .headers
            .iter()
            .map(|h| renames.get(h).cloned().unwrap_or_else(|| h.clone()))
            .collect();
        let mut seen = HashSet::with_capacity(renamed.len());
        for name in &renamed {
            if !seen.insert(name.as_str()) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }
        self.headers = renamed;
        Ok(())
    }
}
