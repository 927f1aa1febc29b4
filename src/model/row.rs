use std::collections::HashMap;
use std::iter::FromIterator;

use serde::{Deserialize, Serialize};

use super::types::FieldName;
use super::value::Value;

/// One row of a stats query result: every requested field plus the grouped
/// dimension columns. Rows of the same query may carry different optional
/// fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: HashMap<FieldName, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<N, V>(mut self, name: N, value: V) -> Self
    where
        N: Into<FieldName>,
        V: Into<Value>,
    {
        self.insert(name, value);
        self
    }

    pub fn insert<N, V>(&mut self, name: N, value: V) -> Option<Value>
    where
        N: Into<FieldName>,
        V: Into<Value>,
    {
        self.fields.insert(name.into(), value.into())
    }

    /// Raw cell, `None` when the field is absent.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Cell with explicit `null` folded into absence.
    #[inline]
    pub fn present(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    #[inline]
    pub fn number(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(Value::as_f64)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<N, V> FromIterator<(N, V)> for Row
where
    N: Into<FieldName>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_folds_null() {
        let row = Row::new().with("city", "A").with("err", Value::Null);

        assert_eq!(row.present("city"), Some(&Value::from("A")));
        assert_eq!(row.get("err"), Some(&Value::Null));
        assert_eq!(row.present("err"), None);
        assert_eq!(row.present("missing"), None);
    }

    #[test]
    fn test_deserialize_row() -> std::result::Result<(), serde_json::Error> {
        let row: Row = serde_json::from_str(r#"{"city": "A", "total": 10, "err": null}"#)?;
        assert_eq!(row.len(), 3);
        assert_eq!(row.number("total"), Some(10.0));
        assert_eq!(row.number("err"), None);
        Ok(())
    }
}
