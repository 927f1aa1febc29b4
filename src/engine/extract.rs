use serde::Serialize;

use super::format::{self, FormatHint};
use crate::model::{MetricDescriptor, MetricKind, Row};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => Some(*n),
            MetricValue::Text(_) => None,
        }
    }
}

/// Measure value of `row` in chart axis units. Absent, `null`, `NaN` and
/// non-numeric cells count as zero: measures are additive, and a chart
/// can't draw `NaN`.
pub fn normalize(row: &Row, measure: &str, kind: MetricKind, hint: &FormatHint) -> f64 {
    let raw = row.number(measure).unwrap_or(0.0);
    format::scale(kind, hint, raw)
}

pub fn extract(
    row: &Row,
    measure: &str,
    kind: MetricKind,
    hint: &FormatHint,
    want_display: bool,
) -> MetricValue {
    let value = normalize(row, measure, kind, hint);
    if want_display {
        MetricValue::Text(format::display(kind, hint, value))
    } else {
        MetricValue::Number(value)
    }
}

pub fn extract_metric(row: &Row, metric: &MetricDescriptor, want_display: bool) -> MetricValue {
    extract(
        row,
        &metric.name,
        metric.kind,
        &FormatHint::from(metric),
        want_display,
    )
}

/// True when at least one of `metrics` is non-zero in `row`. All-zero rows
/// only add noise to a chart shared by several measures.
pub fn is_nontrivial(row: &Row, metrics: &[&MetricDescriptor]) -> bool {
    metrics.iter().any(|metric| {
        normalize(row, &metric.name, metric.kind, &FormatHint::from(*metric)) != 0.0
    })
}
