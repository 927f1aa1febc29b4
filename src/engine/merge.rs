use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeSeq, SerializeStruct, Serializer};

use super::group::{GroupKey, Grouped};

/// Contributions of every measure to one group, in measure declaration order.
pub type MeasureSlots<T> = IndexMap<String, T>;

/// Per-group bundles of all measures of a widget, assembled one measure at a
/// time from independently fetched results.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupedResult<T> {
    groups: IndexMap<GroupKey, MeasureSlots<T>>,
}

impl<T> Default for GroupedResult<T> {
    fn default() -> Self {
        Self {
            groups: IndexMap::new(),
        }
    }
}

impl<T> GroupedResult<T> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, key: &GroupKey) -> Option<&MeasureSlots<T>> {
        self.groups.get(key)
    }

    pub fn measure(&self, key: &GroupKey, measure: &str) -> Option<&T> {
        self.groups.get(key).and_then(|slots| slots.get(measure))
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.groups.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &MeasureSlots<T>)> {
        self.groups.iter()
    }

    pub(crate) fn slots_mut(&mut self) -> impl Iterator<Item = &mut MeasureSlots<T>> {
        self.groups.values_mut()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<T: Default> GroupedResult<T> {
    /// Folds the groups of one measure in. A key seen for the first time gets
    /// a default slot for every measure; for a known key only the slot of
    /// `measure` is replaced, so merging never clobbers another measure and
    /// merging the same groups twice changes nothing.
    ///
    /// Panics on malformed declarations: an empty `measure_names`, a
    /// `measure` outside of it, or a key whose arity doesn't match
    /// `key_fields`.
    pub fn merge<S: AsRef<str>>(
        &mut self,
        measure: &str,
        incoming: Grouped<T>,
        key_fields: &[S],
        measure_names: &[S],
    ) {
        assert!(!measure_names.is_empty(), "merge needs at least one measure");
        assert!(
            measure_names.iter().any(|m| m.as_ref() == measure),
            "measure '{}' is not one of the merged measures",
            measure
        );

        for (key, contribution) in incoming {
            assert_eq!(
                key.arity(),
                key_fields.len(),
                "group key {:?} doesn't match the group fields",
                key
            );

            let slots = self.groups.entry(key).or_insert_with(|| {
                measure_names
                    .iter()
                    .map(|m| (m.as_ref().to_owned(), T::default()))
                    .collect()
            });
            slots.insert(measure.to_owned(), contribution);
        }
    }
}

pub fn merge_groups<T, S>(
    mut accumulated: GroupedResult<T>,
    measure: &str,
    incoming: Grouped<T>,
    key_fields: &[S],
    measure_names: &[S],
) -> GroupedResult<T>
where
    T: Default,
    S: AsRef<str>,
{
    accumulated.merge(measure, incoming, key_fields, measure_names);
    accumulated
}

struct Entry<'a, T> {
    key: &'a GroupKey,
    measures: &'a MeasureSlots<T>,
}

impl<'a, T: Serialize> Serialize for Entry<'a, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut entry = serializer.serialize_struct("Group", 2)?;
        entry.serialize_field("key", self.key)?;
        entry.serialize_field("measures", self.measures)?;
        entry.end()
    }
}

impl<T: Serialize> Serialize for GroupedResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.groups.len()))?;
        for (key, measures) in self.groups.iter() {
            seq.serialize_element(&Entry { key, measures })?;
        }
        seq.end()
    }
}
