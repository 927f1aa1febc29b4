mod classify;
mod extract;
mod format;
mod group;
mod label;
mod merge;
mod series;

pub use classify::{classify, Classification};
pub use extract::{extract, extract_metric, is_nontrivial, normalize, MetricValue};
pub use format::{display, unit, FormatHint};
pub use group::{group_by, GroupKey, Grouped, KeyPart};
pub use label::{join_label, LabelJoiner, DEFAULT_SEPARATOR, MISSING_PLACEHOLDER};
pub use merge::{merge_groups, GroupedResult, MeasureSlots};
pub use series::{GapFill, SeriesBuilder};
