use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use tracing::debug;

use crate::common::time::{Period, PeriodSelector};
use crate::error::Result;
use crate::model::{FieldMatcher, MatchOp};

pub const DEFAULT_OPTION_TTL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_CAPACITY: u64 = 1024;

/// Relative selectors are keyed as written, not by the window they resolve
/// to, so every `Last(15m)` lookup shares one entry until it expires. The
/// system period only matters for the `System` selector.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
struct OptionKey {
    field: String,
    selector: PeriodSelector,
    system: Option<Period>,
    filter: Vec<(String, MatchOp, String)>,
}

impl OptionKey {
    fn new(
        field: &str,
        selector: &PeriodSelector,
        system: Option<&Period>,
        filter: &[FieldMatcher],
    ) -> Self {
        Self {
            field: field.to_owned(),
            selector: *selector,
            system: match selector {
                PeriodSelector::System => system.copied(),
                _ => None,
            },
            filter: filter
                .iter()
                .map(|m| (m.field().to_owned(), m.match_op(), m.value().to_owned()))
                .collect(),
        }
    }
}

/// TTL cache of the distinct values a dimension takes over a period. Shared
/// between requests; failed fetches are never cached.
#[derive(Clone)]
pub struct OptionCache {
    inner: Cache<OptionKey, Arc<Vec<String>>>,
}

impl OptionCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn get_or_fetch<F>(
        &self,
        field: &str,
        selector: &PeriodSelector,
        system: Option<&Period>,
        filter: &[FieldMatcher],
        fetch: F,
    ) -> Result<Arc<Vec<String>>>
    where
        F: FnOnce() -> Result<Vec<String>>,
    {
        let key = OptionKey::new(field, selector, system, filter);
        if let Some(options) = self.inner.get(&key) {
            debug!(field, "dimension options served from cache");
            return Ok(options);
        }

        let options = Arc::new(fetch()?);
        self.inner.insert(key, Arc::clone(&options));
        Ok(options)
    }
}

impl Default for OptionCache {
    fn default() -> Self {
        Self::new(DEFAULT_OPTION_TTL)
    }
}
