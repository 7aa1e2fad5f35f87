pub mod types;

pub use types::{
    Binding, Field, FieldSpec, ProjectionMode, RawRecord, LABEL_SUFFIX,
    VALUE_SELECTOR,
};
