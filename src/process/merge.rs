use crate::error::{Result, TableError};
use crate::process::table::Table;
use std::collections::BTreeSet;
use tracing::debug;

/// Concatenate same-shaped tables in the given order.
///
/// `index_column`, when a table has it, is dropped first; it is the leftover
/// row-ordinal column of an earlier CSV write. Afterwards every table must
/// carry the same column set, each name once. Columns keep the first table's order and
/// later tables are realigned to it by name.
pub fn merge_tables(tables: Vec<Table>, index_column: Option<&str>) -> Result<Table> {
    let mut iter = tables.into_iter();
    let mut merged = iter.next().ok_or(TableError::NoTables)?;
    strip_index(&mut merged, index_column)?;
    let expected = header_set(&merged)?;

    for (pos, mut table) in iter.enumerate() {
        strip_index(&mut table, index_column)?;
        let got = header_set(&table)?;
        if got != expected {
            return Err(TableError::SchemaMismatch(format!(
                "table #{} has columns {:?}, expected {:?}",
                pos + 1,
                got,
                expected
            )));
        }

        // position in `table` of each merged column
        let order: Vec<usize> = merged
            .headers
            .iter()
            .map(|h| table.require_column(h))
            .collect::<Result<_>>()?;

        merged.rows.reserve(table.rows.len());
        for mut row in table.rows {
            let aligned = order.iter().map(|&i| row[i].take()).collect();
            merged.rows.push(aligned);
        }
    }

    debug!(
        rows = merged.num_rows(),
        columns = merged.num_columns(),
        "merged"
    );
    Ok(merged)
}

fn header_set(table: &Table) -> Result<BTreeSet<String>> {
    let mut set = BTreeSet::new();
    for h in &table.headers {
        if !set.insert(h.clone()) {
            return Err(TableError::DuplicateColumn(h.clone()));
        }
    }
    Ok(set)
}

fn strip_index(table: &mut Table, index_column: Option<&str>) -> Result<()> {
    if let Some(name) = index_column {
        if table.column_index(name).is_some() {
            table.take_column(name)?;
        }
    }
    Ok(())
}
