use crate::error::Result;
use crate::process::table::Table;
use crate::process::utils::{last_path_segment, strip_chars};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Pure string transform applied cell by cell. Null cells stay null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// Strip any of these characters from both ends.
    StripChars(String),
    /// Keep the text after the final `/`.
    LastPathSegment,
    Identity,
}

impl Transform {
    pub fn apply(&self, raw: &str) -> String {
        match self {
            Transform::StripChars(chars) => strip_chars(raw, chars),
            Transform::LastPathSegment => last_path_segment(raw),
            Transform::Identity => raw.to_string(),
        }
    }
}

/// Read `source`, write `transform(source)` into `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeriveRule {
    pub source: String,
    pub target: String,
    pub transform: Transform,
    #[serde(default)]
    pub drop_source: bool,
}

impl DeriveRule {
    pub fn new(source: &str, target: &str, transform: Transform) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            transform,
            drop_source: false,
        }
    }

    pub fn dropping_source(mut self) -> Self {
        self.drop_source = true;
        self
    }
}

/// Apply `rules` in order. Each rule sees the columns written by the ones
/// before it. On error `table` is left exactly as it was.
pub fn project_derived_columns(table: &mut Table, rules: &[DeriveRule]) -> Result<()> {
    let mut work = table.clone();
    for rule in rules {
        let idx = work.require_column(&rule.source)?;
        let values: Vec<Option<String>> = work
            .rows
            .iter()
            .map(|row| row[idx].as_deref().map(|v| rule.transform.apply(v)))
            .collect();
        work.set_column(&rule.target, values);
        if rule.drop_source && rule.source != rule.target {
            work.take_column(&rule.source)?;
        }
        debug!(source = %rule.source, target = %rule.target, "derived column");
    }
    *table = work;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TableError;

    fn paintings() -> Table {
        Table::with_rows(
            vec!["artwork".into(), "widthLabel".into()],
            vec![
                vec![
                    Some("http://www.wikidata.org/entity/Q45585".into()),
                    Some("[200]".into()),
                ],
                vec![Some("http://www.wikidata.org/entity/Q12418".into()), None],
            ],
        )
    }

    #[test]
    fn strips_brackets_into_new_column() {
        let mut t = paintings();
        let rule = DeriveRule::new("widthLabel", "width", Transform::StripChars("[]".into()))
            .dropping_source();
        project_derived_columns(&mut t, &[rule]).unwrap();
        assert_eq!(t.headers, vec!["artwork", "width"]);
        assert_eq!(t.get(0, "width"), Some("200"));
        assert_eq!(t.get(1, "width"), None);
    }

    #[test]
    fn id_from_entity_url_keeps_source() {
        let mut t = paintings();
        let rule = DeriveRule::new("artwork", "id", Transform::LastPathSegment);
        project_derived_columns(&mut t, &[rule]).unwrap();
        assert_eq!(t.headers, vec!["artwork", "widthLabel", "id"]);
        assert_eq!(t.get(1, "id"), Some("Q12418"));
    }

    #[test]
    fn rules_chain() {
        let mut t = paintings();
        let rules = vec![
            DeriveRule::new("artwork", "id", Transform::LastPathSegment),
            DeriveRule::new("id", "qid", Transform::StripChars("Q".into())).dropping_source(),
        ];
        project_derived_columns(&mut t, &rules).unwrap();
        assert_eq!(t.get(0, "qid"), Some("45585"));
        assert!(t.column_index("id").is_none());
    }

    #[test]
    fn missing_source_fails() {
        let mut t = paintings();
        let rule = DeriveRule::new("heightLabel", "height", Transform::Identity);
        assert_eq!(
            project_derived_columns(&mut t, &[rule]).unwrap_err(),
            TableError::ColumnNotFound("heightLabel".into())
        );
    }

    #[test]
    fn failing_rule_leaves_table_untouched() {
        let mut t = paintings();
        let before = t.clone();
        let rules = vec![
            DeriveRule::new("artwork", "id", Transform::LastPathSegment).dropping_source(),
            DeriveRule::new("missing", "x", Transform::Identity),
        ];
        assert_eq!(
            project_derived_columns(&mut t, &rules).unwrap_err(),
            TableError::ColumnNotFound("missing".into())
        );
        assert_eq!(t, before);
    }

    #[test]
    fn rule_from_yaml() {
        let yaml = "source: widthLabel\ntarget: width\ntransform: !strip_chars \"[]\"\ndrop_source: true\n";
        let rule: DeriveRule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rule.transform, Transform::StripChars("[]".into()));
        assert!(rule.drop_source);
    }
}
