use std::convert::TryFrom;

use lazy_static::lazy_static;
use regex::Regex;

use super::row::Row;
use super::types::FieldName;
use crate::error::{Error, Result};

/// Row filter forwarded to the stats backend, e.g. `city!=B` or
/// `app=~"web.*"`. An absent or `null` field compares as the empty string.
#[derive(Clone, Debug)]
pub struct FieldMatcher {
    field: FieldName,
    match_op: MatchOp,
    value: String,
    re: Option<Regex>,
}

impl FieldMatcher {
    pub fn new<N, V>(field: N, match_op: MatchOp, value: V) -> Result<Self>
    where
        N: Into<FieldName>,
        V: Into<String>,
    {
        let field = field.into();
        let value = value.into();

        if field.is_empty() {
            return Err(Error::invalid_argument("matcher field must not be empty"));
        }

        let re = match match_op {
            MatchOp::EqlRe | MatchOp::NeqRe => Some(
                Regex::new(&format!("^(?:{})$", value))
                    .map_err(|e| Error::from(("invalid matcher regex", e)))?,
            ),
            _ => None,
        };

        Ok(Self {
            field,
            match_op,
            value,
            re,
        })
    }

    /// Parses `field<op>value` where `<op>` is one of `=`, `!=`, `=~`, `!~`.
    /// The value may be wrapped in double quotes.
    pub fn parse(s: &str) -> Result<Self> {
        lazy_static! {
            static ref RE: Regex =
                Regex::new(r#"^\s*([a-zA-Z_][a-zA-Z0-9_.]*)\s*(=~|!~|!=|=)\s*(.*?)\s*$"#).unwrap();
        }

        let caps = RE
            .captures(s)
            .ok_or_else(|| Error::invalid_argument(&format!("malformed filter '{}'", s)))?;

        let value = caps[3].trim_matches('"');
        Self::new(&caps[1], MatchOp::try_from(&caps[2])?, value)
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn match_op(&self) -> MatchOp {
        self.match_op
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn matches(&self, v: &str) -> bool {
        match self.match_op {
            MatchOp::Eql => self.value == v,
            MatchOp::Neq => self.value != v,
            MatchOp::EqlRe => self.re.as_ref().map_or(false, |re| re.is_match(v)),
            MatchOp::NeqRe => !self.re.as_ref().map_or(false, |re| re.is_match(v)),
        }
    }

    pub fn matches_row(&self, row: &Row) -> bool {
        match row.present(&self.field) {
            Some(v) => self.matches(&v.to_string()),
            None => self.matches(""),
        }
    }
}

impl PartialEq for FieldMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.match_op == other.match_op && self.value == other.value
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MatchOp {
    Eql,
    Neq,
    EqlRe,
    NeqRe,
}

impl TryFrom<&str> for MatchOp {
    type Error = Error;

    fn try_from(op: &str) -> Result<Self> {
        match op {
            "=" => Ok(MatchOp::Eql),
            "!=" => Ok(MatchOp::Neq),
            "=~" => Ok(MatchOp::EqlRe),
            "!~" => Ok(MatchOp::NeqRe),
            _ => Err(Error::invalid_argument("Unexpected match op literal")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() -> Result<()> {
        #[rustfmt::skip]
        let tests = [
            ("city=A",          "city", MatchOp::Eql,   "A"),
            ("city != B",       "city", MatchOp::Neq,   "B"),
            (r#"app=~"web.*""#, "app",  MatchOp::EqlRe, "web.*"),
            ("app!~api",        "app",  MatchOp::NeqRe, "api"),
        ];

        for (input, field, op, value) in &tests {
            let matcher = FieldMatcher::parse(input)?;
            assert_eq!(matcher.field(), *field, "while parsing {}", input);
            assert_eq!(matcher.match_op(), *op, "while parsing {}", input);
            assert_eq!(matcher.value(), *value, "while parsing {}", input);
        }
        Ok(())
    }

    #[test]
    fn test_parse_invalid() {
        for input in &["", "=A", "city", "9city=A", "app=~(("] {
            assert!(FieldMatcher::parse(input).is_err(), "expected error for {}", input);
        }
    }

    #[test]
    fn test_matches_row() -> Result<()> {
        let row = Row::new().with("app", "web-1").with("code", 500);

        assert!(FieldMatcher::parse("app=~web.*")?.matches_row(&row));
        assert!(FieldMatcher::parse("code=500")?.matches_row(&row));
        assert!(!FieldMatcher::parse("app!~web.*")?.matches_row(&row));
        assert!(FieldMatcher::parse("region=")?.matches_row(&row));
        assert!(FieldMatcher::parse("region!=north")?.matches_row(&row));
        Ok(())
    }
}
