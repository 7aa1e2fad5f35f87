// src/store/mod.rs

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use glob::glob;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

use crate::process::Table;

/// Write `table` as comma-separated UTF-8 with a header row. Null cells are
/// empty fields. With `write_index`, each row is led by its ordinal under an
/// unnamed header.
///
/// The file is written next to `path` and renamed into place; on failure the
/// partial file is removed and `path` is untouched.
#[instrument(level = "info", skip(table, path), fields(rows = table.num_rows(), path = %path.as_ref().display()))]
pub fn write_csv<P: AsRef<Path>>(table: &Table, path: P, write_index: bool) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }

    let file_name = path
        .file_name()
        .with_context(|| format!("{:?} has no file name", path))?
        .to_string_lossy();
    let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));

    let written = write_records(table, &tmp_path, write_index).and_then(|()| {
        fs::rename(&tmp_path, path)
            .with_context(|| format!("renaming {:?} -> {:?}", tmp_path, path))
    });
    if let Err(e) = written {
        if fs::remove_file(&tmp_path).is_ok() {
            debug!(tmp = %tmp_path.display(), "removed partial file");
        }
        return Err(e);
    }
    info!("wrote csv");
    Ok(())
}

fn write_records(table: &Table, tmp_path: &Path, write_index: bool) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .from_path(tmp_path)
        .with_context(|| format!("creating {:?}", tmp_path))?;

    let mut header: Vec<&str> = Vec::with_capacity(table.num_columns() + 1);
    if write_index {
        header.push("");
    }
    header.extend(table.headers.iter().map(String::as_str));
    wtr.write_record(&header)?;

    for (idx, row) in table.rows.iter().enumerate() {
        let ordinal = idx.to_string();
        let mut record: Vec<&str> = Vec::with_capacity(row.len() + 1);
        if write_index {
            record.push(&ordinal);
        }
        record.extend(row.iter().map(|c| c.as_deref().unwrap_or("")));
        wtr.write_record(&record)?;
    }
    wtr.flush().with_context(|| format!("flushing {:?}", tmp_path))?;
    Ok(())
}

/// Read a CSV with a header row back into a table. Empty fields become nulls.
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("opening {:?}", path))?;

    let headers: Vec<String> = rdr
        .headers()
        .with_context(|| format!("reading header of {:?}", path))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut table = Table::new(headers);
    for (idx, result) in rdr.records().enumerate() {
        let record =
            result.with_context(|| format!("CSV parse error in {:?} at record {}", path, idx))?;
        let row = record
            .iter()
            .map(|s| (!s.is_empty()).then(|| s.to_string()))
            .collect();
        table.push_row(row);
    }

    debug!(path = %path.display(), rows = table.num_rows(), "read csv");
    Ok(table)
}

/// Files matching `pattern`, sorted so merges are reproducible.
pub fn discover(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = glob(pattern)
        .with_context(|| format!("bad glob pattern {}", pattern))?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();
    paths.sort();
    Ok(paths)
}
