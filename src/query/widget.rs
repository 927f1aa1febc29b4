use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::cache::OptionCache;
use super::source::{PeriodTag, QueryResponse, Sort, StatsQuery, StatsSource};
use crate::common::time::{Period, PeriodResolver, PeriodSelector};
use crate::engine::{
    classify, group_by, is_nontrivial, Classification, GapFill, GroupKey, Grouped,
    GroupedResult, LabelJoiner, SeriesBuilder,
};
use crate::error::{Error, Result};
use crate::model::{FieldMatcher, MetricDescriptor, Row, Schema, SeriesBundle, Timestamp};

/// What a dashboard widget asks for.
#[derive(Clone, Debug)]
pub struct WidgetRequest {
    /// Dimensions and measures, in display order.
    pub metrics: Vec<String>,
    /// Fields to split the widget into one chart per value tuple.
    pub group_by: Vec<String>,
    pub selector: PeriodSelector,
    pub filter: Vec<FieldMatcher>,
    pub limit: Option<usize>,
    pub want_display: bool,
    /// Drop combinations for which every measure is zero.
    pub skip_zero: bool,
    pub compare_previous: bool,
}

impl WidgetRequest {
    pub fn new(metrics: Vec<String>, selector: PeriodSelector) -> Self {
        Self {
            metrics,
            group_by: vec![],
            selector,
            filter: vec![],
            limit: None,
            want_display: false,
            skip_zero: false,
            compare_previous: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NamedSeries {
    pub measure: String,
    pub label: String,
    #[serde(flatten)]
    pub series: SeriesBundle,
}

impl NamedSeries {
    fn new(metric: &MetricDescriptor, series: SeriesBundle) -> Self {
        Self {
            measure: metric.name.clone(),
            label: metric.display_label().to_owned(),
            series,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FailedQuery {
    pub measure: String,
    pub period: PeriodTag,
    pub reason: String,
}

/// Chart-ready result of one widget request.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetPayload {
    pub period: Period,
    pub dimensions: Vec<String>,
    pub measures: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub series: Vec<NamedSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<GroupedResult<SeriesBundle>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub previous: Vec<NamedSeries>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<FailedQuery>,
}

impl WidgetPayload {
    fn new(period: Period, classification: Classification) -> Self {
        Self {
            period,
            dimensions: classification.dimensions,
            measures: classification.measures,
            series: vec![],
            groups: None,
            previous: vec![],
            failed: vec![],
        }
    }
}

/// Fans a widget request out into one stats query per measure and folds the
/// answers back into chart series.
pub struct Widget {
    schema: Schema,
    resolver: PeriodResolver,
    joiner: LabelJoiner,
}

impl Widget {
    pub fn new(schema: Schema, resolver: PeriodResolver, joiner: LabelJoiner) -> Self {
        Self {
            schema,
            resolver,
            joiner,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn execute(
        &self,
        request: &WidgetRequest,
        source: &dyn StatsSource,
        system: Option<&Period>,
    ) -> Result<WidgetPayload> {
        let period = self.resolver.resolve(&request.selector, system)?;
        self.execute_period(request, source, period)
    }

    pub fn execute_at(
        &self,
        request: &WidgetRequest,
        source: &dyn StatsSource,
        system: Option<&Period>,
        now: Timestamp,
    ) -> Result<WidgetPayload> {
        let period = self.resolver.resolve_at(&request.selector, system, now)?;
        self.execute_period(request, source, period)
    }

    fn execute_period(
        &self,
        request: &WidgetRequest,
        source: &dyn StatsSource,
        period: Period,
    ) -> Result<WidgetPayload> {
        let classification = classify(&request.metrics, &self.schema);
        let dimensions = classification.dimensions.clone();
        let measure_names = classification.measures.clone();
        let metrics: Vec<&MetricDescriptor> = measure_names
            .iter()
            .filter_map(|name| self.schema.get(name))
            .collect();

        let mut payload = WidgetPayload::new(period, classification);
        if metrics.is_empty() {
            debug!("widget requests no known measure");
        }

        let builders: Vec<SeriesBuilder> = metrics
            .iter()
            .map(|&metric| {
                SeriesBuilder::new(metric, &dimensions, &self.joiner)
                    .with_display(request.want_display)
            })
            .collect();

        let mut current = Vec::with_capacity(metrics.len());
        let mut previous = Vec::new();
        for metric in &metrics {
            let query = self.query_for(request, metric, &dimensions, period);
            current.push(self.fetch(source, &query, PeriodTag::Current, &mut payload.failed));

            if request.compare_previous {
                let query = StatsQuery {
                    period: period.previous(),
                    ..query
                };
                previous.push(self.fetch(source, &query, PeriodTag::Previous, &mut payload.failed));
            }
        }

        if request.skip_zero {
            self.drop_trivial(&mut current, &metrics, &request.group_by, &dimensions);
            self.drop_trivial(&mut previous, &metrics, &request.group_by, &dimensions);
        }

        // Without group_by the widget is a single group under the empty key.
        let whole = GroupKey::new(vec![]);
        let mut grouped = GroupedResult::new();
        for ((metric, builder), rows) in metrics.iter().zip(&builders).zip(&current) {
            let incoming = if request.group_by.is_empty() {
                let mut incoming = Grouped::new();
                incoming.insert(whole.clone(), builder.build_all(rows));
                incoming
            } else {
                group_by(rows, &request.group_by, |bucket| builder.build(bucket))
            };
            grouped.merge(&metric.name, incoming, &request.group_by, &measure_names);
        }

        let fills: HashMap<&str, GapFill> = metrics
            .iter()
            .zip(&builders)
            .map(|(metric, builder)| (metric.name.as_str(), builder.gap_fill()))
            .collect();
        grouped.fill_gaps(|measure| fills.get(measure).cloned().unwrap_or_default());

        if request.group_by.is_empty() {
            if let Some(slots) = grouped.get(&whole) {
                payload.series = metrics
                    .iter()
                    .filter_map(|metric| {
                        let series = slots.get(&metric.name)?;
                        Some(NamedSeries::new(metric, series.clone()))
                    })
                    .collect();
            }
        } else {
            payload.groups = Some(grouped);
        }

        payload.previous = metrics
            .iter()
            .zip(&builders)
            .zip(&previous)
            .map(|((metric, builder), rows)| NamedSeries::new(metric, builder.build_all(rows)))
            .collect();

        Ok(payload)
    }

    /// Distinct values `field` takes over the selected period, for filter
    /// drop-downs. Served from `cache` when possible.
    pub fn dimension_options(
        &self,
        field: &str,
        selector: &PeriodSelector,
        filter: &[FieldMatcher],
        source: &dyn StatsSource,
        cache: &OptionCache,
        system: Option<&Period>,
    ) -> Result<Arc<Vec<String>>> {
        match self.schema.get(field) {
            Some(metric) if metric.is_dimension() => (),
            _ => {
                return Err(Error::invalid_argument(&format!(
                    "'{}' is not a dimension",
                    field
                )))
            }
        }

        cache.get_or_fetch(field, selector, system, filter, || {
            let period = self.resolver.resolve(selector, system)?;
            let mut query = StatsQuery::new(field, period);
            query.fields = vec![field.to_owned()];
            query.group_by = vec![field.to_owned()];
            query.filter = filter.to_vec();

            let rows = source.query(&query).and_then(QueryResponse::into_rows)?;
            let mut seen = HashSet::new();
            Ok(rows
                .iter()
                .map(|row| self.joiner.component(row.get(field)))
                .filter(|option| seen.insert(option.clone()))
                .collect())
        })
    }

    fn query_for(
        &self,
        request: &WidgetRequest,
        metric: &MetricDescriptor,
        dimensions: &[String],
        period: Period,
    ) -> StatsQuery {
        let mut group_fields: Vec<String> = Vec::new();
        for field in dimensions.iter().chain(&request.group_by) {
            if !group_fields.contains(field) {
                group_fields.push(field.clone());
            }
        }

        let mut fields = group_fields.clone();
        fields.push(metric.name.clone());

        StatsQuery {
            measure: metric.name.clone(),
            period,
            granularity: None,
            fields,
            group_by: group_fields,
            filter: request.filter.clone(),
            sort: Some(Sort::desc(metric.name.as_str())),
            limit: request.limit,
            skip: 0,
        }
    }

    /// Drops the rows of every combination for which all measures are zero.
    /// A combination is a group key plus a dimension label, and each measure
    /// answers it with rows of its own.
    fn drop_trivial(
        &self,
        rows: &mut [Vec<Row>],
        metrics: &[&MetricDescriptor],
        group_fields: &[String],
        dimensions: &[String],
    ) {
        let combination =
            |row: &Row| (GroupKey::of(row, group_fields), self.joiner.join(row, dimensions));

        let live: HashSet<(GroupKey, String)> = rows
            .iter()
            .flatten()
            .filter(|row| is_nontrivial(row, metrics))
            .map(|row| combination(row))
            .collect();

        for measure_rows in rows.iter_mut() {
            let before = measure_rows.len();
            measure_rows.retain(|row| live.contains(&combination(row)));
            if measure_rows.len() < before {
                debug!(dropped = before - measure_rows.len(), "skipped all-zero rows");
            }
        }
    }

    /// Rows of `query`, or none when the query fails. The failure is logged
    /// and recorded; sibling measures are unaffected.
    fn fetch(
        &self,
        source: &dyn StatsSource,
        query: &StatsQuery,
        tag: PeriodTag,
        failed: &mut Vec<FailedQuery>,
    ) -> Vec<Row> {
        match source.query(query).and_then(QueryResponse::into_rows) {
            Ok(rows) => rows,
            Err(err) => {
                warn!(
                    measure = %query.measure,
                    period = ?tag,
                    error = %err,
                    "measure query failed, charting zeros"
                );
                failed.push(FailedQuery {
                    measure: query.measure.clone(),
                    period: tag,
                    reason: err.to_string(),
                });
                vec![]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::time::Duration;

    use super::*;
    use crate::engine::{GroupKey, KeyPart};
    use crate::error::ErrorKind;
    use crate::model::{MetricKind, Value};
    use crate::query::{QueryStatus, RecordedResponse, RecordedSource};

    const START: Timestamp = 1609459200000;
    const HOUR_MS: i64 = 3600 * 1000;

    fn widget() -> Widget {
        let schema = Schema::new(vec![
            MetricDescriptor::dimension("city", "City"),
            MetricDescriptor::dimension("region", "Region"),
            MetricDescriptor::measure("total", MetricKind::Count, "Requests"),
            MetricDescriptor::measure("err", MetricKind::Count, "Errors"),
        ])
        .unwrap();
        Widget::new(schema, PeriodResolver::default(), LabelJoiner::default())
    }

    fn range() -> PeriodSelector {
        PeriodSelector::Range {
            start: START,
            end: START + HOUR_MS,
        }
    }

    fn current() -> Period {
        Period::new(START, START + HOUR_MS, Duration::from_secs(60)).unwrap()
    }

    fn recorded(measure: &str, period: PeriodTag, rows: Vec<Row>) -> RecordedResponse {
        RecordedResponse {
            measure: measure.to_owned(),
            period,
            response: QueryResponse::ok(rows),
        }
    }

    fn failing(measure: &str) -> RecordedResponse {
        RecordedResponse {
            measure: measure.to_owned(),
            period: PeriodTag::Current,
            response: QueryResponse {
                result: QueryStatus::Error("backend timeout".into()),
                data: vec![],
            },
        }
    }

    fn totals() -> RecordedResponse {
        recorded(
            "total",
            PeriodTag::Current,
            vec![
                Row::new().with("city", "A").with("region", "north").with("total", 10),
                Row::new().with("city", "B").with("region", "north").with("total", 5),
            ],
        )
    }

    #[test]
    fn test_plain_series() -> Result<()> {
        let source = RecordedSource::new(vec![totals()], current());
        let request = WidgetRequest::new(vec!["city".into(), "total".into(), "nope".into()], range());

        let payload = widget().execute_at(&request, &source, None, START)?;

        assert_eq!(payload.dimensions, vec!["city"]);
        assert_eq!(payload.measures, vec!["total"]);
        assert_eq!(payload.series.len(), 1);
        assert_eq!(payload.series[0].label, "Requests");
        assert_eq!(payload.series[0].series.names, vec!["A", "B"]);
        assert_eq!(payload.series[0].series.data, vec![10.0, 5.0]);
        assert!(payload.groups.is_none());
        assert!(payload.failed.is_empty());
        Ok(())
    }

    #[test]
    fn test_plain_series_share_names() -> Result<()> {
        let source = RecordedSource::new(
            vec![
                totals(),
                recorded(
                    "err",
                    PeriodTag::Current,
                    vec![Row::new().with("city", "A").with("err", 2)],
                ),
            ],
            current(),
        );
        let request = WidgetRequest::new(
            vec!["city".into(), "total".into(), "err".into()],
            range(),
        );

        let payload = widget().execute_at(&request, &source, None, START)?;

        assert_eq!(payload.series.len(), 2);
        assert_eq!(payload.series[0].measure, "total");
        assert_eq!(payload.series[0].series.names, vec!["A", "B"]);
        assert_eq!(payload.series[0].series.data, vec![10.0, 5.0]);
        assert_eq!(payload.series[1].measure, "err");
        assert_eq!(payload.series[1].series.names, vec!["A", "B"]);
        assert_eq!(payload.series[1].series.data, vec![2.0, 0.0]);
        Ok(())
    }

    #[test]
    fn test_skip_zero_looks_at_every_measure() -> Result<()> {
        let source = RecordedSource::new(
            vec![
                recorded(
                    "total",
                    PeriodTag::Current,
                    vec![
                        Row::new().with("city", "A").with("total", 0),
                        Row::new().with("city", "B").with("total", 5),
                        Row::new().with("city", "C").with("total", 0),
                    ],
                ),
                recorded(
                    "err",
                    PeriodTag::Current,
                    vec![
                        Row::new().with("city", "A").with("err", 3),
                        Row::new().with("city", "C").with("err", Value::Null),
                    ],
                ),
            ],
            current(),
        );
        let mut request = WidgetRequest::new(
            vec!["city".into(), "total".into(), "err".into()],
            range(),
        );
        request.skip_zero = true;

        let payload = widget().execute_at(&request, &source, None, START)?;

        // Rows come back sorted by the measure, largest first.
        let total = &payload.series[0].series;
        let err = &payload.series[1].series;
        assert_eq!(total.names, vec!["B", "A"]);
        assert_eq!(total.data, vec![5.0, 0.0]);
        assert_eq!(err.names, vec!["B", "A"]);
        assert_eq!(err.data, vec![0.0, 3.0]);
        Ok(())
    }

    #[test]
    fn test_failed_measure_charts_zeros() -> Result<()> {
        let source = RecordedSource::new(vec![totals(), failing("err")], current());
        let mut request = WidgetRequest::new(
            vec!["region".into(), "total".into(), "err".into()],
            range(),
        );
        request.group_by = vec!["city".into()];

        let payload = widget().execute_at(&request, &source, None, START)?;
        let groups = payload.groups.unwrap_or_default();

        let a = GroupKey::new(vec![KeyPart::Text("A".into())]);
        let total = groups.measure(&a, "total").cloned().unwrap_or_default();
        let err = groups.measure(&a, "err").cloned().unwrap_or_default();

        assert_eq!(total.names, vec!["north"]);
        assert_eq!(total.data, vec![10.0]);
        assert_eq!(err.names, vec!["north"]);
        assert_eq!(err.data, vec![0.0]);
        assert_eq!(
            payload.failed,
            vec![FailedQuery {
                measure: "err".into(),
                period: PeriodTag::Current,
                reason: "backend timeout".into(),
            }]
        );
        Ok(())
    }

    #[test]
    fn test_previous_period() -> Result<()> {
        let source = RecordedSource::new(
            vec![
                totals(),
                recorded(
                    "total",
                    PeriodTag::Previous,
                    vec![Row::new().with("city", "A").with("total", Value::Null)],
                ),
            ],
            current(),
        );
        let mut request = WidgetRequest::new(vec!["city".into(), "total".into()], range());
        request.compare_previous = true;

        let payload = widget().execute_at(&request, &source, None, START)?;

        assert_eq!(payload.previous.len(), 1);
        assert_eq!(payload.previous[0].series.names, vec!["A"]);
        assert_eq!(payload.previous[0].series.data, vec![0.0]);
        Ok(())
    }

    #[test]
    fn test_invalid_range() {
        let source = RecordedSource::new(vec![], current());
        let request = WidgetRequest::new(
            vec!["total".into()],
            PeriodSelector::Range {
                start: START,
                end: START,
            },
        );

        let err = widget().execute_at(&request, &source, None, START).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::InvalidRange));
    }

    struct CountingSource<'a> {
        inner: RecordedSource,
        calls: &'a Cell<usize>,
    }

    impl<'a> StatsSource for CountingSource<'a> {
        fn query(&self, query: &StatsQuery) -> Result<QueryResponse> {
            self.calls.set(self.calls.get() + 1);
            self.inner.query(query)
        }
    }

    #[test]
    fn test_dimension_options() -> Result<()> {
        let calls = Cell::new(0);
        let source = CountingSource {
            inner: RecordedSource::new(
                vec![recorded(
                    "city",
                    PeriodTag::Current,
                    vec![
                        Row::new().with("city", "A"),
                        Row::new().with("city", "B"),
                        Row::new().with("city", "A"),
                        Row::new(),
                    ],
                )],
                current(),
            ),
            calls: &calls,
        };
        let cache = OptionCache::default();
        let system = current();
        let widget = widget();

        for _ in 0..2 {
            let options = widget.dimension_options(
                "city",
                &PeriodSelector::System,
                &[],
                &source,
                &cache,
                Some(&system),
            )?;
            assert_eq!(*options, vec!["A", "B", "--"]);
        }
        assert_eq!(calls.get(), 1);

        let err = widget
            .dimension_options("total", &PeriodSelector::System, &[], &source, &cache, Some(&system))
            .err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::InvalidArgument));
        Ok(())
    }

    struct AnySource<'a> {
        calls: &'a Cell<usize>,
    }

    impl<'a> StatsSource for AnySource<'a> {
        fn query(&self, _: &StatsQuery) -> Result<QueryResponse> {
            self.calls.set(self.calls.get() + 1);
            Ok(QueryResponse::ok(vec![Row::new().with("city", "A")]))
        }
    }

    #[test]
    fn test_dimension_options_for_relative_window() -> Result<()> {
        let calls = Cell::new(0);
        let source = AnySource { calls: &calls };
        let cache = OptionCache::default();
        let widget = widget();
        let last = PeriodSelector::Last(Duration::from_secs(15 * 60));

        for _ in 0..3 {
            let options = widget.dimension_options("city", &last, &[], &source, &cache, None)?;
            assert_eq!(*options, vec!["A"]);
        }
        assert_eq!(calls.get(), 1);
        Ok(())
    }
}
