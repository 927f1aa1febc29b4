use std::cmp::Ordering;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::time::Period;
use crate::error::{Error, Result};
use crate::input::{Decoder, Reader};
use crate::model::{FieldMatcher, FieldName, Row};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sort {
    pub field: FieldName,
    pub order: SortOrder,
}

impl Sort {
    pub fn desc<N: Into<FieldName>>(field: N) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

/// One per-measure request to the stats backend.
#[derive(Clone, Debug)]
pub struct StatsQuery {
    pub measure: FieldName,
    pub period: Period,
    /// Bucket width override. `None` queries at the period granularity.
    pub granularity: Option<Duration>,
    pub fields: Vec<FieldName>,
    pub group_by: Vec<FieldName>,
    pub filter: Vec<FieldMatcher>,
    pub sort: Option<Sort>,
    pub limit: Option<usize>,
    pub skip: usize,
}

impl StatsQuery {
    pub fn new<N: Into<FieldName>>(measure: N, period: Period) -> Self {
        Self {
            measure: measure.into(),
            period,
            granularity: None,
            fields: vec![],
            group_by: vec![],
            filter: vec![],
            sort: None,
            limit: None,
            skip: 0,
        }
    }

    pub fn granularity(&self) -> Duration {
        self.granularity.unwrap_or_else(|| self.period.granularity())
    }
}

/// Backend verdict: the literal `"ok"` or an error description.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QueryStatus {
    Ok,
    Error(String),
}

impl Default for QueryStatus {
    fn default() -> Self {
        QueryStatus::Ok
    }
}

impl From<String> for QueryStatus {
    fn from(s: String) -> Self {
        if s == "ok" {
            QueryStatus::Ok
        } else {
            QueryStatus::Error(s)
        }
    }
}

impl From<QueryStatus> for String {
    fn from(status: QueryStatus) -> Self {
        match status {
            QueryStatus::Ok => "ok".to_owned(),
            QueryStatus::Error(reason) => reason,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub result: QueryStatus,
    #[serde(default)]
    pub data: Vec<Row>,
}

impl QueryResponse {
    pub fn ok(data: Vec<Row>) -> Self {
        Self {
            result: QueryStatus::Ok,
            data,
        }
    }

    pub fn into_rows(self) -> Result<Vec<Row>> {
        match self.result {
            QueryStatus::Ok => Ok(self.data),
            QueryStatus::Error(reason) => Err(Error::query(&reason)),
        }
    }
}

pub trait StatsSource {
    fn query(&self, query: &StatsQuery) -> Result<QueryResponse>;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodTag {
    Current,
    Previous,
}

impl Default for PeriodTag {
    fn default() -> Self {
        PeriodTag::Current
    }
}

impl fmt::Display for PeriodTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PeriodTag::Current => write!(f, "current"),
            PeriodTag::Previous => write!(f, "previous"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedResponse {
    pub measure: FieldName,
    #[serde(default)]
    pub period: PeriodTag,
    #[serde(flatten)]
    pub response: QueryResponse,
}

/// Replays captured backend responses. Each response answers the queries of
/// one measure for either the current period or any period before it. The
/// query's filter, sort, skip and limit are applied to the replayed rows the
/// way the backend would.
pub struct RecordedSource {
    responses: Vec<RecordedResponse>,
    current: Period,
}

impl RecordedSource {
    pub fn new(responses: Vec<RecordedResponse>, current: Period) -> Self {
        Self { responses, current }
    }

    /// Decodes one response per non-blank line.
    pub fn from_reader(
        reader: &mut dyn Reader,
        decoder: &dyn Decoder,
        current: Period,
    ) -> Result<Self> {
        let mut responses = Vec::new();
        let mut line_no = 0;

        loop {
            let mut buf = Vec::new();
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(_) => line_no += 1,
                Err(e) => return Err(Error::from(("reader failed", e))),
            }

            if buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let response = decoder.decode(&buf).map_err(|e| {
                let kind = e.kind();
                Error::from(format!("line {}: {}", line_no, e)).into_kind(kind)
            })?;
            responses.push(response);
        }

        debug!(responses = responses.len(), "loaded recorded responses");
        Ok(Self::new(responses, current))
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    fn tag_of(&self, period: &Period) -> Option<PeriodTag> {
        if *period == self.current {
            Some(PeriodTag::Current)
        } else if period.end() <= self.current.start() {
            Some(PeriodTag::Previous)
        } else {
            None
        }
    }
}

impl StatsSource for RecordedSource {
    fn query(&self, query: &StatsQuery) -> Result<QueryResponse> {
        let recorded = self
            .tag_of(&query.period)
            .and_then(|tag| {
                self.responses
                    .iter()
                    .find(|r| r.measure == query.measure && r.period == tag)
            })
            .ok_or_else(|| {
                Error::query(&format!(
                    "no recorded response for measure '{}'",
                    query.measure
                ))
            })?;

        let mut rows = recorded.response.clone().into_rows()?;
        rows.retain(|row| query.filter.iter().all(|m| m.matches_row(row)));

        if let Some(sort) = &query.sort {
            rows.sort_by(|a, b| {
                let (a, b) = (
                    a.number(&sort.field).unwrap_or(0.0),
                    b.number(&sort.field).unwrap_or(0.0),
                );
                let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
                match sort.order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }

        let rows = rows
            .into_iter()
            .skip(query.skip)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();

        Ok(QueryResponse::ok(rows))
    }
}
