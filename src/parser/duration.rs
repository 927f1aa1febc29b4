use std::time::Duration;

use nom::{
    branch::alt, bytes::complete::tag, character::complete::digit1, combinator::value,
};

use super::result::{IResult, ParseError, Span};
use crate::error::{Error, Result};

pub fn parse_duration(s: &str) -> Result<Duration> {
    match duration(Span::new(s.trim())) {
        Ok((rest, d)) if rest.fragment().is_empty() => Ok(d),
        Ok((rest, _)) => Err(Error::invalid_argument(&format!(
            "unexpected input '{}' after duration",
            rest.fragment()
        ))),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(Error::invalid_argument(e.message()))
        }
        Err(nom::Err::Incomplete(_)) => Err(Error::invalid_argument("incomplete duration literal")),
    }
}

/// Renders a duration with the same unit letters `parse_duration` accepts,
/// e.g. `1h30m`.
pub fn format_duration(d: Duration) -> String {
    let mut rest = d.as_millis();
    if rest == 0 {
        return "0ms".to_owned();
    }

    let mut out = String::new();
    let mut unit = Some(Unit::Year);
    while let Some(u) = unit {
        let ms = u128::from(u.milliseconds());
        if rest >= ms {
            out.push_str(&format!("{}{}", rest / ms, u.suffix()));
            rest %= ms;
        }
        unit = u.descendant();
    }
    out
}

/// Parse Go-like duration string: `2s`, `1y3w5d7h9m`.
/// - Only positive durations.
/// - No fractional units.
/// - Units are always ordered from longest to shortest.
pub(super) fn duration(input: Span) -> IResult<Duration> {
    let (rest, duration) = duration_inner(input, Unit::Year)?;

    if duration.eq(&Duration::from_millis(0)) {
        return Err(nom::Err::Failure(ParseError::new(
            "duration must be greater than 0".to_owned(),
            input,
        )));
    }

    Ok((rest, duration))
}

#[derive(Copy, Clone)]
enum Unit {
    Millisecond,
    Second, // 1000 milliseconds
    Minute, // 60 seconds
    Hour,   // 60 minutes
    Day,    // 24 hours
    Week,   // 7 days
    Year,   // 365 days, always
}

impl Unit {
    fn milliseconds(&self) -> u64 {
        use Unit::*;
        match self {
            Millisecond => 1,
            Second => 1000,
            Minute => 60 * 1000,
            Hour => 60 * 60 * 1000,
            Day => 24 * 60 * 60 * 1000,
            Week => 7 * 24 * 60 * 60 * 1000,
            Year => 365 * 24 * 60 * 60 * 1000,
        }
    }

    fn suffix(&self) -> &'static str {
        use Unit::*;
        match self {
            Millisecond => "ms",
            Second => "s",
            Minute => "m",
            Hour => "h",
            Day => "d",
            Week => "w",
            Year => "y",
        }
    }

    fn descendant(&self) -> Option<Self> {
        use Unit::*;
        match self {
            Millisecond => None,
            Second => Some(Millisecond),
            Minute => Some(Second),
            Day => Some(Hour),
            Hour => Some(Minute),
            Week => Some(Day),
            Year => Some(Week),
        }
    }
}

fn unit(input: Span) -> IResult<Unit> {
    alt((
        value(Unit::Millisecond, tag("ms")),
        value(Unit::Second, tag("s")),
        value(Unit::Minute, tag("m")),
        value(Unit::Hour, tag("h")),
        value(Unit::Day, tag("d")),
        value(Unit::Week, tag("w")),
        value(Unit::Year, tag("y")),
    ))(input)
}

fn duration_inner(input: Span, max_allowed_unit: Unit) -> IResult<Duration> {
    let (rest, multiplier) = digit1(input)?;
    let (rest, unit) = unit(rest)?;

    if unit.milliseconds() > max_allowed_unit.milliseconds() {
        return Err(nom::Err::Failure(ParseError::new(
            "invalid duration literal".to_owned(),
            input,
        )));
    }

    let overflow = || nom::Err::Failure(ParseError::new("duration overflow".to_owned(), input));

    let multiplier = multiplier.fragment().parse::<u32>().map_err(|_| overflow())?;
    let duration = Duration::from_millis(unit.milliseconds())
        .checked_mul(multiplier)
        .ok_or_else(overflow)?;

    if let Some(next_unit) = unit.descendant() {
        let (rest, more_duration) = match duration_inner(rest, next_unit) {
            Ok((rest, more_duration)) => (rest, more_duration),
            Err(nom::Err::Error(_)) => (rest, Duration::from_millis(0)),
            Err(e) => return Err(e),
        };
        Ok((rest, duration.checked_add(more_duration).ok_or_else(overflow)?))
    } else {
        Ok((rest, duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: u64 = 1000;
    const MINUTE: u64 = 60 * 1000;
    const HOUR: u64 = 60 * 60 * 1000;
    const DAY: u64 = 24 * 60 * 60 * 1000;
    const WEEK: u64 = 7 * 24 * 60 * 60 * 1000;
    const YEAR: u64 = 365 * 24 * 60 * 60 * 1000;

    #[test]
    fn test_valid_duration() -> Result<()> {
        #[rustfmt::skip]
        let tests = [
            ("1ms", Duration::from_millis(1)),
            ("15m", Duration::from_millis(15 * MINUTE)),
            (" 1d12h ", Duration::from_millis(DAY + 12 * HOUR)),
            ("0s500ms", Duration::from_millis(500)),
            ("1y2w3d4h5m6s7ms", Duration::from_millis(YEAR + 2 * WEEK + 3 * DAY + 4 * HOUR + 5 * MINUTE + 6 * SECOND + 7)),
        ];

        for (input, expected_duration) in &tests {
            let actual_duration = parse_duration(input)?;
            assert_eq!(
                expected_duration, &actual_duration,
                "while parsing {}",
                input
            );
        }
        Ok(())
    }

    #[test]
    fn test_invalid_duration() {
        #[rustfmt::skip]
        let tests = [
            "foo",
            "0",
            "0ms",
            "1ns",
            "0s0ms",
            "10m2h",
            "1h ago",
            "99999999999s",
        ];

        for input in &tests {
            let ret = parse_duration(input);
            assert!(
                ret.is_err(),
                "Expected error, got {:?} while parsing {}",
                ret,
                input
            );
        }
    }

    #[test]
    fn test_format_duration() {
        #[rustfmt::skip]
        let tests = [
            (Duration::from_millis(0),                 "0ms"),
            (Duration::from_millis(MINUTE),            "1m"),
            (Duration::from_millis(HOUR + 30 * MINUTE), "1h30m"),
            (Duration::from_millis(DAY + 1500),        "1d1s500ms"),
        ];

        for (input, expected) in &tests {
            assert_eq!(format_duration(*input), *expected);
        }
    }
}
