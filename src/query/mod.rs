mod cache;
mod source;
mod widget;

pub use cache::{OptionCache, DEFAULT_OPTION_TTL};
pub use source::{
    PeriodTag, QueryResponse, QueryStatus, RecordedResponse, RecordedSource, Sort, SortOrder,
    StatsQuery, StatsSource,
};
pub use widget::{FailedQuery, NamedSeries, Widget, WidgetPayload, WidgetRequest};
