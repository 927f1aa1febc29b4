/// Name of a column in a stats query row.
pub type FieldName = String;

/// Name of a metric declared in a widget schema.
pub type MetricName = String;
