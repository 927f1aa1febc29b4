use super::encoder::Encoder;
use crate::engine::LabelJoiner;
use crate::error::Result;
use crate::model::{format_number, SeriesBundle, TimestampTrait};
use crate::parser::format_duration;
use crate::query::{NamedSeries, WidgetPayload};

/// Plain text rendering for terminals: one header line for the period, one
/// line per chart point. Group headers are labelled with `joiner`.
pub struct HumanReadableEncoder {
    joiner: LabelJoiner,
}

impl HumanReadableEncoder {
    pub fn new(joiner: LabelJoiner) -> Self {
        Self { joiner }
    }

    fn encode_points(&self, series: &SeriesBundle, indent: &str, lines: &mut Vec<String>) {
        for (i, (name, value)) in series.names.iter().zip(&series.data).enumerate() {
            let shown = match series.show_value.as_ref().and_then(|sv| sv.get(i)) {
                Some(shown) => shown.clone(),
                None => format!(
                    "{}{}",
                    format_number(*value),
                    series.unit.as_deref().unwrap_or("")
                ),
            };
            lines.push(format!("{}{}\t{}", indent, name, shown));
        }
    }

    fn encode_named(&self, series: &NamedSeries, suffix: &str, lines: &mut Vec<String>) {
        lines.push(format!("[{}{}] {}", series.measure, suffix, series.label));
        self.encode_points(&series.series, "  ", lines);
    }
}

impl Default for HumanReadableEncoder {
    fn default() -> Self {
        Self::new(LabelJoiner::default())
    }
}

impl Encoder for HumanReadableEncoder {
    fn encode(&self, payload: &WidgetPayload) -> Result<Vec<u8>> {
        let period = &payload.period;
        let mut lines = vec![format!(
            "period {}..{} step {}",
            period.start().to_string_millis(),
            period.end().to_string_millis(),
            format_duration(period.granularity())
        )];

        for series in &payload.series {
            self.encode_named(series, "", &mut lines);
        }

        if let Some(groups) = &payload.groups {
            for (key, slots) in groups.iter() {
                lines.push(format!("<{}>", self.joiner.key_label(key)));
                for (measure, series) in slots.iter() {
                    lines.push(format!("  [{}]", measure));
                    self.encode_points(series, "    ", &mut lines);
                }
            }
        }

        for series in &payload.previous {
            self.encode_named(series, "@previous", &mut lines);
        }

        for failed in &payload.failed {
            lines.push(format!(
                "failed: {} ({}): {}",
                failed.measure, failed.period, failed.reason
            ));
        }

        Ok(String::into_bytes(lines.join("\n")))
    }
}
