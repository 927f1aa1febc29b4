use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::model::{MetricDescriptor, MetricKind};

/// Per-metric overrides of the kind's formatting rule.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormatHint {
    pub unit: Option<String>,
    pub precision: Option<u8>,
}

impl From<&MetricDescriptor> for FormatHint {
    fn from(metric: &MetricDescriptor) -> Self {
        Self {
            unit: metric.unit.clone(),
            precision: metric.precision,
        }
    }
}

struct Step {
    at_least: f64,
    divisor: f64,
    suffix: &'static str,
}

struct FormatRule {
    /// Applied to the raw backend value before anything else.
    scale: f64,
    precision: u8,
    /// Clamp applied to a requested precision.
    max_precision: u8,
    min_precision: u8,
    /// Keep trailing zeros (`1.50%`).
    fixed: bool,
    /// Largest first; the last step must accept every magnitude.
    steps: &'static [Step],
}

const PLAIN: &[Step] = &[Step {
    at_least: 0.0,
    divisor: 1.0,
    suffix: "",
}];

const PERCENT: &[Step] = &[Step {
    at_least: 0.0,
    divisor: 1.0,
    suffix: "%",
}];

const MILLIS: &[Step] = &[
    Step {
        at_least: 60_000.0,
        divisor: 60_000.0,
        suffix: "min",
    },
    Step {
        at_least: 1_000.0,
        divisor: 1_000.0,
        suffix: "s",
    },
    Step {
        at_least: 0.0,
        divisor: 1.0,
        suffix: "ms",
    },
];

const BYTES: &[Step] = &[
    Step {
        at_least: 1_073_741_824.0,
        divisor: 1_073_741_824.0,
        suffix: "GB",
    },
    Step {
        at_least: 1_048_576.0,
        divisor: 1_048_576.0,
        suffix: "MB",
    },
    Step {
        at_least: 1_024.0,
        divisor: 1_024.0,
        suffix: "KB",
    },
    Step {
        at_least: 0.0,
        divisor: 1.0,
        suffix: "B",
    },
];

lazy_static! {
    static ref FORMATTERS: HashMap<MetricKind, FormatRule> = {
        let mut table = HashMap::new();
        table.insert(
            MetricKind::Count,
            FormatRule {
                scale: 1.0,
                precision: 2,
                min_precision: 0,
                max_precision: 6,
                fixed: false,
                steps: PLAIN,
            },
        );
        table.insert(
            MetricKind::Rate,
            FormatRule {
                scale: 100.0,
                precision: 2,
                min_precision: 1,
                max_precision: 2,
                fixed: true,
                steps: PERCENT,
            },
        );
        table.insert(
            MetricKind::Duration,
            FormatRule {
                scale: 1.0,
                precision: 2,
                min_precision: 0,
                max_precision: 6,
                fixed: false,
                steps: MILLIS,
            },
        );
        table.insert(
            MetricKind::Bytes,
            FormatRule {
                scale: 1.0,
                precision: 2,
                min_precision: 0,
                max_precision: 6,
                fixed: false,
                steps: BYTES,
            },
        );
        table
    };
}

fn rule(kind: MetricKind) -> &'static FormatRule {
    // Every kind is registered above.
    &FORMATTERS[&kind]
}

fn precision(kind: MetricKind, hint: &FormatHint) -> u8 {
    let rule = rule(kind);
    hint.precision
        .unwrap_or(rule.precision)
        .max(rule.min_precision)
        .min(rule.max_precision)
}

pub(crate) fn round_to(v: f64, precision: u8) -> f64 {
    let m = 10f64.powi(i32::from(precision));
    let rounded = (v * m).round() / m;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Raw backend value converted into chart axis units: rates become
/// percentages rounded to the display precision, other kinds pass through.
pub(crate) fn scale(kind: MetricKind, hint: &FormatHint, raw: f64) -> f64 {
    let rule = rule(kind);
    if rule.scale == 1.0 {
        raw
    } else {
        round_to(raw * rule.scale, precision(kind, hint))
    }
}

/// Unit suffix reported next to a series.
pub fn unit(kind: MetricKind, hint: &FormatHint) -> Option<String> {
    if hint.unit.is_some() {
        return hint.unit.clone();
    }
    let steps = rule(kind).steps;
    steps
        .last()
        .map(|step| step.suffix)
        .filter(|suffix| !suffix.is_empty())
        .map(str::to_owned)
}

/// Display rendering of a value already in axis units (see `scale`).
pub fn display(kind: MetricKind, hint: &FormatHint, value: f64) -> String {
    let rule = rule(kind);
    let precision = precision(kind, hint);

    let (value, suffix) = match &hint.unit {
        Some(unit) => (value, unit.as_str()),
        None => {
            let magnitude = value.abs();
            let step = rule
                .steps
                .iter()
                .find(|step| magnitude >= step.at_least)
                .unwrap_or(&rule.steps[rule.steps.len() - 1]);
            (value / step.divisor, step.suffix)
        }
    };

    let value = round_to(value, precision);
    if rule.fixed {
        format!("{:.*}{}", usize::from(precision), value, suffix)
    } else {
        format!("{}{}", crate::model::format_number(value), suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hint(unit: Option<&str>, precision: Option<u8>) -> FormatHint {
        FormatHint {
            unit: unit.map(str::to_owned),
            precision,
        }
    }

    #[test]
    fn test_display_table() {
        #[rustfmt::skip]
        let tests = [
            (MetricKind::Count,    hint(None, None),        1234.0,       "1234"),
            (MetricKind::Count,    hint(None, None),        2.0 / 3.0,    "0.67"),
            (MetricKind::Count,    hint(Some(" req"), None), 12.0,        "12 req"),
            (MetricKind::Rate,     hint(None, None),        12.3,         "12.30%"),
            (MetricKind::Rate,     hint(None, Some(1)),     1.2,          "1.2%"),
            (MetricKind::Rate,     hint(None, Some(5)),     1.23456,      "1.23%"),
            (MetricKind::Rate,     hint(None, Some(0)),     0.0,          "0.0%"),
            (MetricKind::Duration, hint(None, None),        12.5,         "12.5ms"),
            (MetricKind::Duration, hint(None, None),        1250.0,       "1.25s"),
            (MetricKind::Duration, hint(None, None),        150_000.0,    "2.5min"),
            (MetricKind::Duration, hint(Some("ms"), None),  150_000.0,    "150000ms"),
            (MetricKind::Bytes,    hint(None, None),        512.0,        "512B"),
            (MetricKind::Bytes,    hint(None, None),        1536.0,       "1.5KB"),
            (MetricKind::Bytes,    hint(None, Some(1)),     3_221_225_472.0, "3GB"),
        ];

        for (kind, hint, value, expected) in &tests {
            assert_eq!(
                display(*kind, hint, *value),
                *expected,
                "while formatting {} as {:?}",
                value,
                kind
            );
        }
    }

    #[test]
    fn test_scale() {
        assert_eq!(scale(MetricKind::Rate, &FormatHint::default(), 0.01234), 1.23);
        assert_eq!(scale(MetricKind::Rate, &hint(None, Some(1)), 0.0123), 1.2);
        assert_eq!(scale(MetricKind::Duration, &FormatHint::default(), 12.345), 12.345);
    }

    #[test]
    fn test_unit() {
        assert_eq!(unit(MetricKind::Count, &FormatHint::default()), None);
        assert_eq!(unit(MetricKind::Rate, &FormatHint::default()).as_deref(), Some("%"));
        assert_eq!(unit(MetricKind::Duration, &FormatHint::default()).as_deref(), Some("ms"));
        assert_eq!(unit(MetricKind::Bytes, &hint(Some("bit"), None)).as_deref(), Some("bit"));
    }
}
