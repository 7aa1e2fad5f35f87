// src/process/mod.rs
pub mod derive;
pub mod merge;
pub mod table;
pub mod utils;

pub use derive::{project_derived_columns, DeriveRule, Transform};
pub use merge::merge_tables;
pub use table::Table;

use crate::error::{Result, TableError};
use crate::schema::{FieldSpec, ProjectionMode, RawRecord};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, trace};

/// Flatten one record into `<variable>.<attribute>` → scalar, the shape a
/// generic JSON normaliser produces for nested value objects.
pub fn flatten_record(record: &RawRecord) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (var, binding) in record {
        for (attr, value) in binding.attributes() {
            out.insert(format!("{}.{}", var, attr), value);
        }
    }
    out
}

/// Project `raw_results` onto `field_spec`, keeping raw and label columns
/// side by side.
pub fn project(raw_results: &[RawRecord], field_spec: &FieldSpec) -> Result<Table> {
    project_with_mode(raw_results, field_spec, ProjectionMode::KeepBoth)
}

/// Turn a result set into a table holding exactly the declared columns, in
/// declared order, one row per record.
///
/// A variable missing from a single record gives a null cell. A variable
/// missing from *every* record of a non-empty set means the query and the
/// field spec disagree, and fails with [`TableError::SchemaMismatch`].
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(records = raw_results.len(), fields = field_spec.fields().len(), mode = ?mode)
)]
pub fn project_with_mode(
    raw_results: &[RawRecord],
    field_spec: &FieldSpec,
    mode: ProjectionMode,
) -> Result<Table> {
    if field_spec.is_empty() {
        return Err(TableError::EmptyFieldSpec);
    }

    let columns = field_spec.columns(mode);
    let mut names = HashSet::with_capacity(columns.len());
    for col in &columns {
        if !names.insert(col.name.as_str()) {
            return Err(TableError::DuplicateColumn(col.name.clone()));
        }
    }

    let flat: Vec<BTreeMap<String, String>> = raw_results.iter().map(flatten_record).collect();

    if !flat.is_empty() {
        for col in &columns {
            let bound = flat
                .iter()
                .any(|rec| col.sources.iter().any(|key| rec.contains_key(key)));
            if !bound {
                debug!(column = %col.name, sources = ?col.sources, "never bound");
                return Err(TableError::SchemaMismatch(format!(
                    "`{}` is absent from all {} records",
                    col.sources.join("` / `"),
                    flat.len()
                )));
            }
        }
    }

    let mut table = Table::new(columns.iter().map(|c| c.name.clone()).collect());
    for (idx, rec) in flat.iter().enumerate() {
        let row: Vec<Option<String>> = columns
            .iter()
            .map(|c| c.sources.iter().find_map(|key| rec.get(key).cloned()))
            .collect();
        trace!(idx, nulls = row.iter().filter(|c| c.is_none()).count(), "row");
        table.push_row(row);
    }

    debug!(
        rows = table.num_rows(),
        columns = table.num_columns(),
        "projected"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Binding;
    use serde_json::json;

    fn records(v: serde_json::Value) -> Vec<RawRecord> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn batman_example() {
        let raw = records(json!([
            {"name": {"value": "Bruce"}, "nameLabel": {"value": "Batman"}}
        ]));
        let t = project(&raw, &FieldSpec::plain(["name", "nameLabel"])).unwrap();
        assert_eq!(t.headers, vec!["name", "nameLabel"]);
        assert_eq!(t.num_rows(), 1);
        let row = t.row_map(0).unwrap();
        assert_eq!(row["name"], Some("Bruce"));
        assert_eq!(row["nameLabel"], Some("Batman"));
    }

    #[test]
    fn missing_optional_field_is_null() {
        let raw = records(json!([
            {"name": {"value": "Bruce"}, "nameLabel": {"value": "Batman"}},
            {"name": {"value": "Clark"}}
        ]));
        let t = project(&raw, &FieldSpec::labelled(["name"])).unwrap();
        assert_eq!(t.num_rows(), 2);
        assert_eq!(t.rows[1], vec![Some("Clark".to_string()), None]);
    }

    #[test]
    fn column_order_ignores_record_key_order() {
        let raw = records(json!([
            {"z": {"value": "1"}, "a": {"value": "2"}, "m": {"value": "3"}}
        ]));
        let t = project(&raw, &FieldSpec::plain(["m", "z", "a"])).unwrap();
        assert_eq!(t.headers, vec!["m", "z", "a"]);
        assert_eq!(
            t.rows[0],
            vec![Some("3".into()), Some("1".into()), Some("2".into())]
        );
    }

    #[test]
    fn unrequested_variables_are_dropped() {
        let raw = records(json!([
            {"name": {"type": "uri", "value": "http://e/Q1"}, "extra": {"value": "x"}}
        ]));
        let t = project(&raw, &FieldSpec::plain(["name"])).unwrap();
        assert_eq!(t.headers, vec!["name"]);
        assert_eq!(t.get(0, "name"), Some("http://e/Q1"));
    }

    #[test]
    fn empty_spec_fails() {
        let raw = records(json!([{"name": {"value": "Bruce"}}]));
        assert_eq!(
            project(&raw, &FieldSpec::default()).unwrap_err(),
            TableError::EmptyFieldSpec
        );
    }

    #[test]
    fn field_absent_everywhere_is_a_mismatch() {
        let raw = records(json!([
            {"name": {"value": "Bruce"}},
            {"name": {"value": "Clark"}}
        ]));
        let err = project(&raw, &FieldSpec::plain(["name", "spouse"])).unwrap_err();
        assert!(matches!(err, TableError::SchemaMismatch(msg) if msg.contains("spouse.value")));
    }

    #[test]
    fn empty_result_set_yields_headers_only() {
        let t = project(&[], &FieldSpec::labelled(["name"])).unwrap();
        assert_eq!(t.headers, vec!["name", "nameLabel"]);
        assert_eq!(t.num_rows(), 0);
    }

    #[test]
    fn duplicate_declaration_is_rejected() {
        let spec = FieldSpec::labelled(["name"]).with_plain("nameLabel");
        let raw = records(json!([{"name": {"value": "a"}, "nameLabel": {"value": "b"}}]));
        assert_eq!(
            project(&raw, &spec).unwrap_err(),
            TableError::DuplicateColumn("nameLabel".into())
        );
    }

    #[test]
    fn prefer_label_falls_back_to_raw() {
        let raw = records(json!([
            {"creator": {"value": "http://e/Q5582"}, "creatorLabel": {"value": "Vincent van Gogh"}},
            {"creator": {"value": "http://e/Q999"}},
            {"pic": {"value": "p.jpg"}}
        ]));
        let spec = FieldSpec::labelled(["creator"]).with_plain("pic");
        let t = project_with_mode(&raw, &spec, ProjectionMode::PreferLabel).unwrap();
        assert_eq!(t.headers, vec!["creator", "pic"]);
        assert_eq!(t.get(0, "creator"), Some("Vincent van Gogh"));
        assert_eq!(t.get(1, "creator"), Some("http://e/Q999"));
        assert_eq!(t.get(2, "creator"), None);
        assert_eq!(t.get(2, "pic"), Some("p.jpg"));
    }

    #[test]
    fn prefer_label_mismatch_needs_both_unbound() {
        let raw = records(json!([
            {"pic": {"value": "a.jpg"}},
            {"pic": {"value": "b.jpg"}}
        ]));
        let spec = FieldSpec::labelled(["creator"]).with_plain("pic");
        let err = project_with_mode(&raw, &spec, ProjectionMode::PreferLabel).unwrap_err();
        assert!(
            matches!(&err, TableError::SchemaMismatch(msg)
                if msg.contains("creatorLabel.value") && msg.contains("creator.value")),
            "{:?}",
            err
        );
    }

    #[test]
    fn prefer_label_accepts_label_only() {
        let raw = records(json!([
            {"creatorLabel": {"value": "Rembrandt"}, "pic": {"value": "a.jpg"}}
        ]));
        let spec = FieldSpec::labelled(["creator"]).with_plain("pic");
        let t = project_with_mode(&raw, &spec, ProjectionMode::PreferLabel).unwrap();
        assert_eq!(t.get(0, "creator"), Some("Rembrandt"));

        // the same records in keep-both mode miss the raw variable entirely
        assert!(matches!(
            project(&raw, &spec),
            Err(TableError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn row_count_matches_input() {
        let mut raw = Vec::new();
        for i in 0..37 {
            let mut rec = RawRecord::new();
            rec.insert("n".into(), Binding::new(i.to_string()));
            if i % 3 == 0 {
                rec.insert("nLabel".into(), Binding::new(format!("label {}", i)));
            }
            raw.push(rec);
        }
        let t = project(&raw, &FieldSpec::labelled(["n"])).unwrap();
        assert_eq!(t.num_rows(), raw.len());
        assert!(t.rows.iter().all(|r| r.len() == 2));
        assert_eq!(t.get(3, "nLabel"), Some("label 3"));
        assert_eq!(t.get(4, "nLabel"), None);
    }

    #[test]
    fn flatten_joins_variable_and_attribute() {
        let raw = records(json!([
            {"dob": {"type": "literal", "value": "1939-05-01", "xml:lang": "en"}}
        ]));
        let flat = flatten_record(&raw[0]);
        assert_eq!(flat.get("dob.value").map(String::as_str), Some("1939-05-01"));
        assert_eq!(flat.get("dob.type").map(String::as_str), Some("literal"));
        assert_eq!(flat.get("dob.xml:lang").map(String::as_str), Some("en"));
    }
}
