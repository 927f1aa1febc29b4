use std::convert::TryFrom;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::common::granularity::{GranularityStep, GranularityTable};
use crate::common::time::{PeriodResolver, DEFAULT_WINDOW};
use crate::engine::{LabelJoiner, DEFAULT_SEPARATOR, MISSING_PLACEHOLDER};
use crate::error::{Error, ErrorKind, Result};
use crate::parser::parse_duration;
use crate::query::{OptionCache, DEFAULT_OPTION_TTL};

/// Deployment knobs. Durations are written the same way as on the command
/// line, e.g. `"90s"` or `"1h30m"`.
///
/// ```json
/// {
///   "granularity": [{"max_span": "1h", "bucket": "1m"}, {"max_span": "1d", "bucket": "15m"}],
///   "fallback": "1d",
///   "default_window": "30m",
///   "label_separator": " / ",
///   "option_ttl": "5m"
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawConfig")]
pub struct Config {
    pub granularity: GranularityTable,
    pub default_window: Duration,
    pub label_separator: String,
    pub placeholder: String,
    pub option_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            granularity: GranularityTable::default(),
            default_window: DEFAULT_WINDOW,
            label_separator: DEFAULT_SEPARATOR.to_owned(),
            placeholder: MISSING_PLACEHOLDER.to_owned(),
            option_ttl: DEFAULT_OPTION_TTL,
        }
    }
}

impl Config {
    pub fn from_json(buf: &[u8]) -> Result<Self> {
        serde_json::from_slice(buf)
            .map_err(|e| Error::from(("config decoding failed", e)).into_kind(ErrorKind::Decode))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let buf = fs::read(path.as_ref()).map_err(|e| {
            Error::from((format!("couldn't read config {}", path.as_ref().display()), e))
                .into_kind(ErrorKind::Io)
        })?;
        Self::from_json(&buf)
    }

    pub fn resolver(&self) -> PeriodResolver {
        PeriodResolver::new(self.granularity.clone(), self.default_window)
    }

    pub fn joiner(&self) -> LabelJoiner {
        LabelJoiner::new(self.label_separator.as_str(), self.placeholder.as_str())
    }

    pub fn option_cache(&self) -> OptionCache {
        OptionCache::new(self.option_ttl)
    }
}

#[derive(Deserialize)]
struct RawStep {
    max_span: String,
    bucket: String,
}

#[derive(Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    granularity: Option<Vec<RawStep>>,
    fallback: Option<String>,
    default_window: Option<String>,
    label_separator: Option<String>,
    placeholder: Option<String>,
    option_ttl: Option<String>,
}

impl TryFrom<RawConfig> for Config {
    type Error = Error;

    fn try_from(raw: RawConfig) -> Result<Self> {
        let defaults = Config::default();

        let granularity = match (raw.granularity, raw.fallback) {
            (None, None) => defaults.granularity,
            (steps, fallback) => {
                let steps = match steps {
                    Some(steps) => steps
                        .iter()
                        .map(|s| -> Result<GranularityStep> {
                            Ok(GranularityStep::new(
                                parse_duration(&s.max_span)?,
                                parse_duration(&s.bucket)?,
                            ))
                        })
                        .collect::<Result<Vec<_>>>()?,
                    None => defaults.granularity.steps().to_vec(),
                };
                let fallback = match fallback {
                    Some(f) => parse_duration(&f)?,
                    None => defaults.granularity.fallback(),
                };
                GranularityTable::new(steps, fallback)?
            }
        };

        let default_window = match raw.default_window {
            Some(w) => parse_duration(&w)?,
            None => defaults.default_window,
        };
        if default_window == Duration::from_millis(0) {
            return Err(Error::invalid_argument("default window must be positive"));
        }

        let option_ttl = match raw.option_ttl {
            Some(ttl) => parse_duration(&ttl)?,
            None => defaults.option_ttl,
        };

        Ok(Self {
            granularity,
            default_window,
            label_separator: raw.label_separator.unwrap_or(defaults.label_separator),
            placeholder: raw.placeholder.unwrap_or(defaults.placeholder),
            option_ttl,
        })
    }
}
