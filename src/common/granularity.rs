use std::time::Duration;

use crate::error::{Error, Result};
use crate::parser::format_duration;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// One row of the span to bucket-width table: spans up to and including
/// `max_span` are bucketed by `bucket`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GranularityStep {
    pub max_span: Duration,
    pub bucket: Duration,
}

impl GranularityStep {
    pub fn new(max_span: Duration, bucket: Duration) -> Self {
        Self { max_span, bucket }
    }
}

/// Monotonic mapping from the length of a time window to the width of the
/// chart buckets used to query it.
#[derive(Clone, Debug, PartialEq)]
pub struct GranularityTable {
    steps: Vec<GranularityStep>,
    fallback: Duration,
}

impl GranularityTable {
    pub fn new(steps: Vec<GranularityStep>, fallback: Duration) -> Result<Self> {
        let mut prev: Option<&GranularityStep> = None;
        for step in &steps {
            if step.bucket == Duration::from_millis(0) {
                return Err(Error::invalid_argument("granularity bucket must be positive"));
            }
            if let Some(prev) = prev {
                if step.max_span <= prev.max_span {
                    return Err(Error::invalid_argument(&format!(
                        "granularity spans must strictly increase ({} after {})",
                        format_duration(step.max_span),
                        format_duration(prev.max_span)
                    )));
                }
                if step.bucket < prev.bucket {
                    return Err(Error::invalid_argument(&format!(
                        "granularity buckets must not decrease ({} after {})",
                        format_duration(step.bucket),
                        format_duration(prev.bucket)
                    )));
                }
            }
            prev = Some(step);
        }

        if let Some(last) = steps.last() {
            if fallback < last.bucket {
                return Err(Error::invalid_argument(
                    "fallback granularity is finer than the last step",
                ));
            }
        }
        if fallback == Duration::from_millis(0) {
            return Err(Error::invalid_argument("fallback granularity must be positive"));
        }

        Ok(Self { steps, fallback })
    }

    pub fn granularity_for(&self, span: Duration) -> Duration {
        self.steps
            .iter()
            .find(|step| span <= step.max_span)
            .map_or(self.fallback, |step| step.bucket)
    }

    pub fn steps(&self) -> &[GranularityStep] {
        &self.steps
    }

    pub fn fallback(&self) -> Duration {
        self.fallback
    }
}

impl Default for GranularityTable {
    /// Minute buckets for up to an hour, hour buckets for up to a week and
    /// day buckets beyond.
    fn default() -> Self {
        let secs = Duration::from_secs;
        Self {
            steps: vec![
                GranularityStep::new(secs(HOUR), secs(MINUTE)),
                GranularityStep::new(secs(6 * HOUR), secs(5 * MINUTE)),
                GranularityStep::new(secs(DAY), secs(15 * MINUTE)),
                GranularityStep::new(secs(7 * DAY), secs(HOUR)),
            ],
            fallback: secs(DAY),
        }
    }
}
