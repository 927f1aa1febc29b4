use std::convert::TryFrom;
use std::time::Duration;

use chrono::prelude::*;

// Unix timestamp in milliseconds.
pub type Timestamp = i64;

pub trait TimestampTrait {
    fn add(&self, d: Duration) -> Self;
    fn sub(&self, d: Duration) -> Self;
    fn to_string_millis(&self) -> String;
}

#[inline]
fn millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

impl TimestampTrait for Timestamp {
    #[inline]
    fn add(&self, d: Duration) -> Self {
        self.saturating_add(millis(d))
    }

    #[inline]
    fn sub(&self, d: Duration) -> Self {
        self.saturating_sub(millis(d))
    }

    fn to_string_millis(&self) -> String {
        match Utc.timestamp_millis_opt(*self).single() {
            Some(ts) => ts.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
            None => self.to_string(),
        }
    }
}
