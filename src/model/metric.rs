use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::MetricName;
use crate::error::{Error, ErrorKind, Result};

/// Whether a metric partitions rows or is measured per partition.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricRole {
    Dimension,
    Measure,
}

impl Default for MetricRole {
    fn default() -> Self {
        MetricRole::Measure
    }
}

/// Value family of a measure. Selects scaling and display rules.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Count,
    /// Fraction in `0..1`, shown as a percentage.
    Rate,
    /// Milliseconds.
    Duration,
    Bytes,
}

impl Default for MetricKind {
    fn default() -> Self {
        MetricKind::Count
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricDescriptor {
    pub name: MetricName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<MetricRole>,
    #[serde(default)]
    pub kind: MetricKind,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u8>,
}

impl MetricDescriptor {
    pub fn dimension<N: Into<MetricName>, L: Into<String>>(name: N, label: L) -> Self {
        Self {
            name: name.into(),
            role: Some(MetricRole::Dimension),
            kind: MetricKind::Count,
            label: label.into(),
            unit: None,
            precision: None,
        }
    }

    pub fn measure<N: Into<MetricName>, L: Into<String>>(name: N, kind: MetricKind, label: L) -> Self {
        Self {
            name: name.into(),
            role: Some(MetricRole::Measure),
            kind,
            label: label.into(),
            unit: None,
            precision: None,
        }
    }

    pub fn with_unit<U: Into<String>>(mut self, unit: U) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_precision(mut self, precision: u8) -> Self {
        self.precision = Some(precision);
        self
    }

    #[inline]
    pub fn role(&self) -> MetricRole {
        self.role.unwrap_or_default()
    }

    #[inline]
    pub fn is_dimension(&self) -> bool {
        self.role() == MetricRole::Dimension
    }

    /// Label shown on charts, falling back to the metric name.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }
}

/// Static metric catalog of a widget, looked up by name.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    metrics: Vec<MetricDescriptor>,
    index: HashMap<MetricName, usize>,
}

impl Schema {
    pub fn new(metrics: Vec<MetricDescriptor>) -> Result<Self> {
        let mut index = HashMap::with_capacity(metrics.len());
        for (pos, metric) in metrics.iter().enumerate() {
            if metric.name.is_empty() {
                return Err(Error::invalid_argument("metric name must not be empty"));
            }
            if index.insert(metric.name.clone(), pos).is_some() {
                return Err(Error::invalid_argument(&format!(
                    "metric '{}' is declared more than once",
                    metric.name
                )));
            }
        }
        Ok(Self { metrics, index })
    }

    pub fn from_json(buf: &[u8]) -> Result<Self> {
        let metrics: Vec<MetricDescriptor> = serde_json::from_slice(buf)
            .map_err(|e| Error::from(("schema decoding failed", e)).into_kind(ErrorKind::Decode))?;
        Self::new(metrics)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let buf = fs::read(path.as_ref()).map_err(|e| {
            Error::from((format!("couldn't read schema {}", path.as_ref().display()), e))
                .into_kind(ErrorKind::Io)
        })?;
        Self::from_json(&buf)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&MetricDescriptor> {
        self.index.get(name).map(|&pos| &self.metrics[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricDescriptor> {
        self.metrics.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_from_json() -> Result<()> {
        let schema = Schema::from_json(
            br#"[
                {"name": "city", "role": "dimension", "label": "City"},
                {"name": "err_rate", "kind": "rate", "label": "Error rate", "precision": 1},
                {"name": "total"}
            ]"#,
        )?;

        assert_eq!(schema.len(), 3);
        assert!(schema.get("city").map_or(false, |m| m.is_dimension()));

        let rate = schema.get("err_rate").ok_or("err_rate is missing")?;
        assert_eq!(rate.kind, MetricKind::Rate);
        assert_eq!(rate.precision, Some(1));

        let total = schema.get("total").ok_or("total is missing")?;
        assert_eq!(total.role(), MetricRole::Measure);
        assert_eq!(total.kind, MetricKind::Count);
        assert_eq!(total.display_label(), "total");
        Ok(())
    }

    #[test]
    fn test_schema_rejects_duplicates() {
        let err = Schema::new(vec![
            MetricDescriptor::dimension("city", "City"),
            MetricDescriptor::measure("city", MetricKind::Count, "City count"),
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_schema_rejects_bad_json() {
        let err = Schema::from_json(b"{\"name\": \"city\"}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
