use super::extract::normalize;
use super::format::{self, FormatHint};
use super::label::LabelJoiner;
use super::merge::GroupedResult;
use crate::model::{MetricDescriptor, Row, SeriesBundle};

/// Turns the rows of one measure into a chart series: one point per row,
/// named by the row's dimension label.
pub struct SeriesBuilder<'a> {
    metric: &'a MetricDescriptor,
    hint: FormatHint,
    dimensions: &'a [String],
    joiner: &'a LabelJoiner,
    want_display: bool,
}

impl<'a> SeriesBuilder<'a> {
    pub fn new(metric: &'a MetricDescriptor, dimensions: &'a [String], joiner: &'a LabelJoiner) -> Self {
        Self {
            metric,
            hint: FormatHint::from(metric),
            dimensions,
            joiner,
            want_display: false,
        }
    }

    pub fn with_display(mut self, want_display: bool) -> Self {
        self.want_display = want_display;
        self
    }

    pub fn unit(&self) -> Option<String> {
        format::unit(self.metric.kind, &self.hint)
    }

    /// Display rendering of a missing point, when display values are on.
    pub fn zero_display(&self) -> Option<String> {
        if self.want_display {
            Some(format::display(self.metric.kind, &self.hint, 0.0))
        } else {
            None
        }
    }

    pub fn gap_fill(&self) -> GapFill {
        GapFill {
            unit: self.unit(),
            zero_display: self.zero_display(),
        }
    }

    pub fn build(&self, rows: &[&Row]) -> SeriesBundle {
        let mut bundle = SeriesBundle::new(self.unit(), self.want_display);

        for row in rows {
            let value = normalize(row, &self.metric.name, self.metric.kind, &self.hint);
            let display = if self.want_display {
                Some(format::display(self.metric.kind, &self.hint, value))
            } else {
                None
            };
            bundle.push(self.joiner.join(row, self.dimensions), value, display);
        }

        bundle
    }

    pub fn build_all(&self, rows: &[Row]) -> SeriesBundle {
        self.build(&rows.iter().collect::<Vec<_>>())
    }
}

/// How a measure renders a point it has no data for.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GapFill {
    pub unit: Option<String>,
    pub zero_display: Option<String>,
}

impl GroupedResult<SeriesBundle> {
    /// Aligns every bundle of every group to the union of all series names,
    /// in first-seen order, so each group slices the same combinations. Points
    /// a bundle lacks, including every point of a measure that had no rows
    /// for the group, become zero. Points sharing a label are matched up by
    /// occurrence and none of them is dropped.
    pub fn fill_gaps<F>(&mut self, fill: F)
    where
        F: Fn(&str) -> GapFill,
    {
        let names = SeriesBundle::union_names(self.iter().flat_map(|(_, slots)| slots.values()));

        for slots in self.slots_mut() {
            for (measure, bundle) in slots.iter_mut() {
                let gap = fill(measure.as_str());
                *bundle = bundle.aligned(&names, gap.unit, gap.zero_display.as_deref());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::group::{group_by, GroupKey, KeyPart};
    use crate::model::{MetricKind, Value};

    fn rate() -> MetricDescriptor {
        MetricDescriptor::measure("err_rate", MetricKind::Rate, "Error rate").with_precision(1)
    }

    #[test]
    fn test_build_with_display() {
        let metric = rate();
        let dims = vec!["app".to_owned(), "zone".to_owned()];
        let joiner = LabelJoiner::default();
        let rows = vec![
            Row::new().with("app", "web").with("zone", "eu").with("err_rate", 0.0123),
            Row::new().with("app", "api").with("err_rate", Value::Null),
        ];

        let bundle = SeriesBuilder::new(&metric, &dims, &joiner)
            .with_display(true)
            .build_all(&rows);

        assert_eq!(bundle.names, vec!["web/eu", "api/--"]);
        assert_eq!(bundle.data, vec![1.2, 0.0]);
        assert_eq!(bundle.unit.as_deref(), Some("%"));
        assert_eq!(
            bundle.show_value,
            Some(vec!["1.2%".to_owned(), "0.0%".to_owned()])
        );
    }

    #[test]
    fn test_fill_gaps_keeps_points_with_equal_labels() {
        let total = MetricDescriptor::measure("total", MetricKind::Count, "Requests");
        let err = MetricDescriptor::measure("err", MetricKind::Count, "Errors");
        let dims = vec!["region".to_owned()];
        let fields = vec!["city".to_owned()];
        let measures = vec!["total".to_owned(), "err".to_owned()];
        let joiner = LabelJoiner::default();

        // Number 500 and string "500" render to the same label.
        let total_rows = vec![
            Row::new().with("city", "A").with("region", 500).with("total", 10),
            Row::new().with("city", "A").with("region", "500").with("total", 7),
        ];
        let err_rows = vec![Row::new().with("city", "A").with("region", 500).with("err", 1)];

        let total_builder = SeriesBuilder::new(&total, &dims, &joiner);
        let err_builder = SeriesBuilder::new(&err, &dims, &joiner);

        let mut result = GroupedResult::new();
        result.merge(
            "total",
            group_by(&total_rows, &fields, |b| total_builder.build(b)),
            &fields,
            &measures,
        );
        result.merge(
            "err",
            group_by(&err_rows, &fields, |b| err_builder.build(b)),
            &fields,
            &measures,
        );
        result.fill_gaps(|_| GapFill::default());

        let a = GroupKey::new(vec![KeyPart::Text("A".into())]);
        let a_total = result.measure(&a, "total").cloned().unwrap_or_default();
        let a_err = result.measure(&a, "err").cloned().unwrap_or_default();

        assert_eq!(a_total.names, vec!["500", "500"]);
        assert_eq!(a_total.data, vec![10.0, 7.0]);
        assert_eq!(a_err.names, vec!["500", "500"]);
        assert_eq!(a_err.data, vec![1.0, 0.0]);
    }

    #[test]
    fn test_fill_gaps() {
        let total = MetricDescriptor::measure("total", MetricKind::Count, "Requests");
        let err = MetricDescriptor::measure("err", MetricKind::Count, "Errors");
        let dims = vec!["region".to_owned()];
        let fields = vec!["city".to_owned()];
        let measures = vec!["total".to_owned(), "err".to_owned()];
        let joiner = LabelJoiner::default();

        let total_rows = vec![
            Row::new().with("city", "A").with("region", "north").with("total", 10),
            Row::new().with("city", "A").with("region", "south").with("total", 7),
            Row::new().with("city", "B").with("region", "north").with("total", 5),
        ];
        let err_rows = vec![Row::new().with("city", "A").with("region", "north").with("err", 2)];

        let total_builder = SeriesBuilder::new(&total, &dims, &joiner);
        let err_builder = SeriesBuilder::new(&err, &dims, &joiner);

        let mut result = GroupedResult::new();
        result.merge(
            "total",
            group_by(&total_rows, &fields, |b| total_builder.build(b)),
            &fields,
            &measures,
        );
        result.merge(
            "err",
            group_by(&err_rows, &fields, |b| err_builder.build(b)),
            &fields,
            &measures,
        );
        result.fill_gaps(|_| GapFill::default());

        let b = GroupKey::new(vec![KeyPart::Text("B".into())]);
        let b_total = result.measure(&b, "total").cloned().unwrap_or_default();
        let b_err = result.measure(&b, "err").cloned().unwrap_or_default();

        assert_eq!(b_total.names, vec!["north", "south"]);
        assert_eq!(b_total.data, vec![5.0, 0.0]);
        assert_eq!(b_err.names, vec!["north", "south"]);
        assert_eq!(b_err.data, vec![0.0, 0.0]);

        for (_, slots) in result.iter() {
            for bundle in slots.values() {
                assert_eq!(bundle.names, vec!["north", "south"]);
            }
        }
    }
}
