use std::collections::HashSet;

use tracing::debug;

use crate::model::Schema;

/// Requested metrics split by role, each side in request order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Classification {
    pub dimensions: Vec<String>,
    pub measures: Vec<String>,
}

impl Classification {
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty() && self.measures.is_empty()
    }
}

/// Stable partition of `requested` into dimensions and measures. Names the
/// schema doesn't know are dropped: saved dashboards outlive schema changes.
pub fn classify<S: AsRef<str>>(requested: &[S], schema: &Schema) -> Classification {
    let mut seen = HashSet::new();
    let mut classification = Classification::default();

    for name in requested.iter().map(AsRef::as_ref) {
        let metric = match schema.get(name) {
            Some(metric) => metric,
            None => {
                debug!(metric = name, "dropping unknown metric");
                continue;
            }
        };

        if !seen.insert(name) {
            continue;
        }

        if metric.is_dimension() {
            classification.dimensions.push(name.to_owned());
        } else {
            classification.measures.push(name.to_owned());
        }
    }

    classification
}
