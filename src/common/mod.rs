pub mod granularity;
pub mod time;
