mod matcher;
mod metric;
mod row;
mod series;
mod timestamp;
mod types;
mod value;

pub use matcher::{FieldMatcher, MatchOp};
pub use metric::{MetricDescriptor, MetricKind, MetricRole, Schema};
pub use row::Row;
pub use series::SeriesBundle;
pub use timestamp::{Timestamp, TimestampTrait};
pub use types::{FieldName, MetricName};
pub use value::Value;

pub(crate) use value::format_number;
