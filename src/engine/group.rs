use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::model::{Row, Value};

/// One component of a group key: the literal cell value, or `Missing` for
/// an absent or `null` cell. `Missing` never equals a literal, not even the
/// empty string.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum KeyPart {
    Missing,
    Bool(bool),
    /// Bit pattern of the number, with `-0` folded into `0`.
    Number(u64),
    Text(String),
}

impl KeyPart {
    pub fn of(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => KeyPart::Missing,
            Some(Value::Bool(b)) => KeyPart::Bool(*b),
            Some(Value::Number(n)) if n.is_nan() => KeyPart::Missing,
            Some(Value::Number(n)) => KeyPart::Number(if *n == 0.0 { 0 } else { n.to_bits() }),
            Some(Value::String(s)) => KeyPart::Text(s.clone()),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            KeyPart::Missing => Value::Null,
            KeyPart::Bool(b) => Value::Bool(*b),
            KeyPart::Number(bits) => Value::Number(f64::from_bits(*bits)),
            KeyPart::Text(s) => Value::String(s.clone()),
        }
    }
}

impl Serialize for KeyPart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Literal value tuple of the group-by fields of a row.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct GroupKey(Vec<KeyPart>);

impl GroupKey {
    pub fn new(parts: Vec<KeyPart>) -> Self {
        Self(parts)
    }

    pub fn of<S: AsRef<str>>(row: &Row, fields: &[S]) -> Self {
        Self(
            fields
                .iter()
                .map(|f| KeyPart::of(row.get(f.as_ref())))
                .collect(),
        )
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }
}

impl Serialize for GroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for part in &self.0 {
            seq.serialize_element(part)?;
        }
        seq.end()
    }
}

pub type Grouped<T> = IndexMap<GroupKey, T>;

/// Partitions `rows` by the values of `key_fields` and hands every bucket to
/// `builder`. Buckets come out in first-seen key order and keep the input
/// order of their rows. No aggregation happens here.
///
/// Panics if `key_fields` is empty: that is a broken widget declaration.
pub fn group_by<T, S, F>(rows: &[Row], key_fields: &[S], mut builder: F) -> Grouped<T>
where
    S: AsRef<str>,
    F: FnMut(&[&Row]) -> T,
{
    assert!(!key_fields.is_empty(), "group_by needs at least one key field");

    let mut buckets: IndexMap<GroupKey, Vec<&Row>> = IndexMap::new();
    for row in rows {
        buckets
            .entry(GroupKey::of(row, key_fields))
            .or_insert_with(Vec::new)
            .push(row);
    }

    buckets
        .into_iter()
        .map(|(key, bucket)| {
            let built = builder(&bucket);
            (key, built)
        })
        .collect()
}
