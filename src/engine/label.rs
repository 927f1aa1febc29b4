use super::group::GroupKey;
use crate::model::{Row, Value};

pub const DEFAULT_SEPARATOR: &str = "/";
pub const MISSING_PLACEHOLDER: &str = "--";

/// Builds the composite label of a row from its dimension values.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelJoiner {
    separator: String,
    placeholder: String,
}

impl Default for LabelJoiner {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR, MISSING_PLACEHOLDER)
    }
}

impl LabelJoiner {
    pub fn new<S: Into<String>, P: Into<String>>(separator: S, placeholder: P) -> Self {
        Self {
            separator: separator.into(),
            placeholder: placeholder.into(),
        }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn component(&self, value: Option<&Value>) -> String {
        match value {
            Some(Value::Null) | None => self.placeholder.clone(),
            Some(v) => v.to_string(),
        }
    }

    /// Missing components render as the placeholder, so every label of a
    /// series has the same arity.
    pub fn join<S: AsRef<str>>(&self, row: &Row, dimensions: &[S]) -> String {
        dimensions
            .iter()
            .map(|d| self.component(row.get(d.as_ref())))
            .collect::<Vec<_>>()
            .join(&self.separator)
    }

    /// Label of a group key, joined the same way as dimension labels.
    pub fn key_label(&self, key: &GroupKey) -> String {
        key.parts()
            .iter()
            .map(|part| self.component(Some(&part.to_value())))
            .collect::<Vec<_>>()
            .join(&self.separator)
    }
}

pub fn join_label<S: AsRef<str>>(row: &Row, dimensions: &[S]) -> String {
    LabelJoiner::default().join(row, dimensions)
}
