// src/schema/types.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute of a binding that holds the cell value.
pub const VALUE_SELECTOR: &str = "value";

/// Suffix the label service appends to a variable name for its display string.
pub const LABEL_SUFFIX: &str = "Label";

/// One variable's value object inside a result row.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq)]
pub struct Binding {
    /// `uri`, `literal` or `bnode`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// Anything else the endpoint attaches, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Binding {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            kind: None,
            value: value.into(),
            datatype: None,
            lang: None,
            extra: BTreeMap::new(),
        }
    }

    /// Every attribute of this binding as `(attribute, scalar)` pairs.
    pub fn attributes(&self) -> Vec<(&str, String)> {
        let mut out = Vec::with_capacity(4 + self.extra.len());
        if let Some(kind) = &self.kind {
            out.push(("type", kind.clone()));
        }
        out.push((VALUE_SELECTOR, self.value.clone()));
        if let Some(dt) = &self.datatype {
            out.push(("datatype", dt.clone()));
        }
        if let Some(lang) = &self.lang {
            out.push(("xml:lang", lang.clone()));
        }
        for (k, v) in &self.extra {
            let s = match v {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => continue,
                other => other.to_string(),
            };
            out.push((k.as_str(), s));
        }
        out
    }
}

/// One result row: variable name → binding. Unbound optional variables are
/// simply missing.
pub type RawRecord = BTreeMap<String, Binding>;

/// A logical field the caller wants in the output table.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq)]
pub struct Field {
    pub name: String,
    /// Whether a `<name>Label` variable is paired with this one.
    #[serde(default)]
    pub label: bool,
}

impl Field {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: false,
        }
    }

    pub fn labelled(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: true,
        }
    }

    pub fn label_variable(&self) -> Option<String> {
        self.label.then(|| format!("{}{}", self.name, LABEL_SUFFIX))
    }

    /// Query variables this field reads, raw first.
    pub fn variables(&self) -> Vec<String> {
        let mut vars = vec![self.name.clone()];
        vars.extend(self.label_variable());
        vars
    }
}

/// How labelled fields turn into output columns.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    /// One column per physical sub-field, `nameLabel` next to `name`.
    #[default]
    KeepBoth,
    /// One column per logical field holding the label, or the raw value
    /// when no label was bound.
    PreferLabel,
}

/// An output column and the flattened keys it is read from, in precedence
/// order.
#[derive(Debug, PartialEq, Clone, Eq)]
pub(crate) struct OutputColumn {
    pub(crate) name: String,
    pub(crate) sources: Vec<String>,
}

/// Ordered list of logical fields requested from a result set.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq, Default)]
#[serde(transparent)]
pub struct FieldSpec {
    fields: Vec<Field>,
}

impl FieldSpec {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Every name becomes a plain field.
    pub fn plain<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(Field::plain).collect())
    }

    /// Every name becomes a labelled field.
    pub fn labelled<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(Field::labelled).collect())
    }

    pub fn with_plain(mut self, name: impl Into<String>) -> Self {
        self.fields.push(Field::plain(name));
        self
    }

    pub fn with_labelled(mut self, name: impl Into<String>) -> Self {
        self.fields.push(Field::labelled(name));
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// All query variables these fields read, in declared order.
    pub fn variables(&self) -> Vec<String> {
        self.fields.iter().flat_map(Field::variables).collect()
    }

    /// Output columns for `mode`, in declared order. Names may repeat here;
    /// the projector rejects that.
    pub(crate) fn columns(&self, mode: ProjectionMode) -> Vec<OutputColumn> {
        let key = |var: &str| format!("{}.{}", var, VALUE_SELECTOR);
        let mut out = Vec::new();
        for field in &self.fields {
            match (mode, field.label_variable()) {
                (ProjectionMode::PreferLabel, Some(label)) => out.push(OutputColumn {
                    name: field.name.clone(),
                    sources: vec![key(label.as_str()), key(field.name.as_str())],
                }),
                _ => {
                    for var in field.variables() {
                        let path = key(var.as_str());
                        out.push(OutputColumn {
                            name: crate::process::utils::strip_value_suffix(&path).to_string(),
                            sources: vec![path],
                        });
                    }
                }
            }
        }
        out
    }
}
