use std::path::PathBuf;
use std::time::Duration;

use structopt::StructOpt;

use crate::common::time::{parse_iso_time, PeriodSelector};
use crate::error::{Error, Result};
use crate::model::{FieldMatcher, Timestamp};
use crate::parser::parse_duration;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "statsfold",
    about = "Folds per-measure stats responses read from stdin into dashboard chart series"
)]
pub struct CliOpt {
    /// JSON array of metric descriptors.
    #[structopt(long = "schema", short = "S", parse(from_os_str))]
    pub schema: PathBuf,

    /// Dimensions and measures to chart, e.g. `app,total,err`.
    #[structopt(long = "metrics", short = "m", use_delimiter = true, required = true)]
    pub metrics: Vec<String>,

    /// Fields to split the widget by, one chart per value tuple.
    #[structopt(long = "group-by", short = "g", use_delimiter = true)]
    pub group_by: Vec<String>,

    #[structopt(long = "last", short = "l", parse(try_from_str = parse_duration))]
    pub last: Option<Duration>,

    #[structopt(long = "since", short = "s", parse(try_from_str = parse_iso_time))]
    pub since: Option<Timestamp>,

    #[structopt(long = "until", short = "u", parse(try_from_str = parse_iso_time))]
    pub until: Option<Timestamp>,

    /// Row filter such as `app!=api` or `city=~"B.*"`. Repeatable.
    #[structopt(
        long = "filter",
        short = "f",
        number_of_values = 1,
        parse(try_from_str = FieldMatcher::parse)
    )]
    pub filter: Vec<FieldMatcher>,

    #[structopt(long = "limit")]
    pub limit: Option<usize>,

    /// Also render display strings (`1.2%`, `1.25s`, ...).
    #[structopt(long = "display", short = "d")]
    pub display: bool,

    /// Drop label combinations for which every requested measure is zero.
    #[structopt(long = "skip-zero", short = "z")]
    pub skip_zero: bool,

    /// Fetch the preceding period as well.
    #[structopt(long = "previous", short = "p")]
    pub previous: bool,

    #[structopt(long = "config", short = "c", parse(from_os_str))]
    pub config: Option<PathBuf>,

    /// Output encoding: JSON by default, `h` for human readable.
    #[structopt(long = "encode", short = "e")]
    pub encode: Option<String>,

    #[structopt(short = "v", parse(from_occurrences))]
    pub verbose: u8,
}

impl CliOpt {
    pub fn selector(&self) -> Result<PeriodSelector> {
        match (self.last, self.since, self.until) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(Error::invalid_argument(
                "--last can't be combined with --since or --until",
            )),
            (Some(last), None, None) => Ok(PeriodSelector::Last(last)),
            (None, Some(start), Some(end)) => Ok(PeriodSelector::Range { start, end }),
            (None, Some(start), None) => Ok(PeriodSelector::Range {
                start,
                end: chrono::Utc::now().timestamp_millis(),
            }),
            (None, None, Some(_)) => Err(Error::invalid_argument("--until requires --since")),
            (None, None, None) => Ok(PeriodSelector::System),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn opt(args: &[&str]) -> CliOpt {
        let mut argv = vec!["statsfold", "--schema", "schema.json", "--metrics", "app,total"];
        argv.extend_from_slice(args);
        CliOpt::from_iter(argv)
    }

    #[test]
    fn test_parse() {
        let opt = opt(&["-g", "city,zone", "-f", "app!=api", "-f", "zone=eu", "-dvv"]);

        assert_eq!(opt.metrics, vec!["app", "total"]);
        assert_eq!(opt.group_by, vec!["city", "zone"]);
        assert_eq!(opt.filter.len(), 2);
        assert!(opt.display);
        assert_eq!(opt.verbose, 2);
    }

    #[test]
    fn test_selector() -> Result<()> {
        assert_eq!(opt(&[]).selector()?, PeriodSelector::System);
        assert_eq!(
            opt(&["--last", "15m"]).selector()?,
            PeriodSelector::Last(Duration::from_secs(900))
        );
        assert_eq!(
            opt(&["--since", "2021-01-01T00:00:00Z", "--until", "2021-01-01T01:00:00Z"]).selector()?,
            PeriodSelector::Range {
                start: 1609459200000,
                end: 1609462800000
            }
        );

        #[rustfmt::skip]
        let invalid = [
            vec!["--until", "2021-01-01T01:00:00Z"],
            vec!["--last", "1h", "--since", "2021-01-01T00:00:00Z"],
        ];
        for args in &invalid {
            let err = opt(args).selector().err();
            assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::InvalidArgument));
        }
        Ok(())
    }
}
