use std::convert::TryFrom;
use std::str::FromStr;
use std::time::Duration;

use chrono::prelude::*;
use serde::Serialize;
use tracing::debug;

use super::granularity::GranularityTable;
use crate::error::{Error, Result};
use crate::model::{Timestamp, TimestampTrait};
use crate::parser::{format_duration, parse_duration};

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(30 * 60);

/// Concrete `[start, end]` window in epoch milliseconds together with the
/// bucket width used to query it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub struct Period {
    start: Timestamp,
    end: Timestamp,
    granularity: u64,
}

impl Period {
    pub fn new(start: Timestamp, end: Timestamp, granularity: Duration) -> Result<Self> {
        if start >= end {
            return Err(Error::invalid_range(&format!(
                "period start {} is not before end {}",
                start, end
            )));
        }
        Ok(Self {
            start,
            end,
            granularity: u64::try_from(granularity.as_millis()).unwrap_or(u64::MAX),
        })
    }

    #[inline]
    pub fn start(&self) -> Timestamp {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Timestamp {
        self.end
    }

    #[inline]
    pub fn span(&self) -> Duration {
        Duration::from_millis((self.end - self.start) as u64)
    }

    #[inline]
    pub fn granularity(&self) -> Duration {
        Duration::from_millis(self.granularity)
    }

    /// The immediately preceding period of the same length and granularity.
    pub fn previous(&self) -> Self {
        let span = self.end - self.start;
        Self {
            start: self.start - span,
            end: self.start,
            granularity: self.granularity,
        }
    }
}

pub fn previous_period(period: &Period) -> Period {
    period.previous()
}

/// What the caller asked for before it is pinned to a clock.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PeriodSelector {
    /// The last `d` up to now.
    Last(Duration),
    Range { start: Timestamp, end: Timestamp },
    /// The dashboard-wide period.
    System,
}

impl FromStr for PeriodSelector {
    type Err = Error;

    /// Accepts `system`, a duration such as `15m`, or `START..END` where both
    /// ends are RFC 3339 or epoch timestamps.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("system") {
            return Ok(PeriodSelector::System);
        }

        if let Some(pos) = s.find("..") {
            let (start, end) = (s[..pos].trim(), s[pos + 2..].trim());
            let parse = |t: &str| {
                try_parse_time(t)
                    .ok_or_else(|| Error::invalid_argument(&format!("couldn't parse timestamp '{}'", t)))
            };
            return Ok(PeriodSelector::Range {
                start: parse(start)?,
                end: parse(end)?,
            });
        }

        Ok(PeriodSelector::Last(parse_duration(s)?))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PeriodResolver {
    table: GranularityTable,
    default_window: Duration,
}

impl Default for PeriodResolver {
    fn default() -> Self {
        Self::new(GranularityTable::default(), DEFAULT_WINDOW)
    }
}

impl PeriodResolver {
    pub fn new(table: GranularityTable, default_window: Duration) -> Self {
        Self {
            table,
            default_window,
        }
    }

    pub fn table(&self) -> &GranularityTable {
        &self.table
    }

    pub fn resolve(&self, selector: &PeriodSelector, system: Option<&Period>) -> Result<Period> {
        self.resolve_at(selector, system, Utc::now().timestamp_millis())
    }

    pub fn resolve_at(
        &self,
        selector: &PeriodSelector,
        system: Option<&Period>,
        now: Timestamp,
    ) -> Result<Period> {
        let (start, end) = match *selector {
            PeriodSelector::Last(d) => (now.sub(d), now),
            PeriodSelector::Range { start, end } => (start, end),
            PeriodSelector::System => match system {
                Some(p) => (p.start(), p.end()),
                None => {
                    debug!(
                        window = %format_duration(self.default_window),
                        "no system period, using the default window"
                    );
                    (now.sub(self.default_window), now)
                }
            },
        };

        self.period(start, end)
    }

    fn period(&self, start: Timestamp, end: Timestamp) -> Result<Period> {
        if start >= end {
            return Err(Error::invalid_range(&format!(
                "period start {} is not before end {}",
                start, end
            )));
        }

        let span = Duration::from_millis((end - start) as u64);
        let period = Period::new(start, end, self.table.granularity_for(span))?;
        debug!(
            start = period.start(),
            end = period.end(),
            granularity = %format_duration(period.granularity()),
            "resolved period"
        );
        Ok(period)
    }
}

pub fn parse_iso_time(s: &str) -> Result<Timestamp> {
    s.parse::<DateTime<Utc>>()
        .map(|t| t.timestamp_millis())
        .map_err(|e| Error::from(("timestamp parsing failed", e)))
}

pub fn try_parse_time(s: &str) -> Option<Timestamp> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc().timestamp_millis());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.and_utc().timestamp_millis());
    }

    // UNIX timestamp
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        let n = s.parse::<i64>().ok()?;
        return match s.len() {
            10 => Some(n * 1000),
            13 => Some(n),
            _ => None,
        };
    }

    None
}
