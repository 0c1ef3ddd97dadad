//! Cookie lifetimes and their resolution to an absolute expiration.
//!
//! A lifetime is relative seconds, an absolute instant or a textual date expression. Resolution
//! yields Unix seconds, with `0` reserved for session cookies.

use crate::error::CookieError;
use chrono::{
    DateTime, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc,
};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Seconds in the five years used by [`crate::Cookie::clear`] and [`crate::Cookie::never`].
pub const FIVE_YEARS: i64 = 60 * 60 * 24 * 365 * 5;

/// How long a cookie should live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifetime {
    /// Seconds from now. `0` is a session cookie.
    Seconds(i64),
    /// A fixed instant.
    At(DateTime<Utc>),
    /// A date expression such as `"+1 week"`, `"tomorrow"` or `"2030-01-01"`.
    Expression(String),
}

impl Lifetime {
    pub const SESSION: Self = Self::Seconds(0);

    /// Reads a lifetime out of an untyped value.
    ///
    /// Integers and numeric strings are seconds, other strings are date expressions.
    ///
    /// # Errors
    /// Returns [`CookieError::UnsupportedLifetime`] for floats, booleans, arrays, objects and null.
    pub fn from_value(value: &Value) -> Result<Self, CookieError> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Seconds).ok_or_else(|| {
                unsupported(format!("number {n} is not a whole count of seconds"))
            }),
            Value::String(s) => Ok(Self::from_text(s)),
            other => Err(unsupported(format!("{} value", kind_of(other)))),
        }
    }

    /// Interprets text: integer strings become [`Lifetime::Seconds`], anything else an expression.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        text.trim()
            .parse::<i64>()
            .map_or_else(|_| Self::Expression(text.to_owned()), Self::Seconds)
    }

    /// Resolves this lifetime against `now` into Unix seconds, `0` meaning session.
    ///
    /// # Errors
    /// Returns [`CookieError::Parse`] if an expression cannot be resolved.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<i64, CookieError> {
        match self {
            Self::Seconds(0) => Ok(0),
            Self::Seconds(seconds) => Ok(now.timestamp().saturating_add(*seconds)),
            Self::At(at) => Ok(at.timestamp()),
            Self::Expression(text) => parse_expression(text, now).map(|at| at.timestamp()),
        }
    }
}

impl Default for Lifetime {
    fn default() -> Self {
        Self::SESSION
    }
}

impl From<i64> for Lifetime {
    fn from(seconds: i64) -> Self {
        Self::Seconds(seconds)
    }
}

impl From<i32> for Lifetime {
    fn from(seconds: i32) -> Self {
        Self::Seconds(i64::from(seconds))
    }
}

impl From<u32> for Lifetime {
    fn from(seconds: u32) -> Self {
        Self::Seconds(i64::from(seconds))
    }
}

impl From<std::time::Duration> for Lifetime {
    fn from(duration: std::time::Duration) -> Self {
        Self::Seconds(i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
    }
}

impl From<DateTime<Utc>> for Lifetime {
    fn from(at: DateTime<Utc>) -> Self {
        Self::At(at)
    }
}

impl From<&str> for Lifetime {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl From<String> for Lifetime {
    fn from(text: String) -> Self {
        Self::from_text(&text)
    }
}

struct LifetimeVisitor;

impl Visitor<'_> for LifetimeVisitor {
    type Value = Lifetime;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("seconds as an integer, or a textual date expression")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Lifetime, E> {
        Ok(Lifetime::Seconds(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Lifetime, E> {
        i64::try_from(v)
            .map(Lifetime::Seconds)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Lifetime, E> {
        Ok(Lifetime::from_text(v))
    }
}

impl<'de> Deserialize<'de> for Lifetime {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_any(LifetimeVisitor)
    }
}

fn unsupported(message: String) -> CookieError {
    CookieError::UnsupportedLifetime {
        message: message.into(),
        context: Some("expected seconds, a date expression or an instant".into()),
    }
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_error(text: &str) -> CookieError {
    CookieError::Parse {
        message: format!("'{text}' could not be parsed into a Unix timestamp").into(),
        context: None,
    }
}

/// Resolves a textual date expression relative to `now`.
///
/// Absolute forms: `@<epoch>`, RFC 3339, RFC 2822, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]`.
/// Keywords: `now`, `today`, `midnight`, `tomorrow`, `yesterday`.
/// Relative forms: signed amounts followed by a unit, optionally chained and optionally ending in
/// `ago` (`+1 day`, `2 weeks 3 hours`, `-30 min`, `3 days ago`, `next month`, `last year`).
///
/// # Errors
/// Returns [`CookieError::Parse`] when nothing in the expression is recognised.
pub fn parse_expression(text: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, CookieError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(parse_error(text));
    }

    if let Some(at) = parse_absolute(trimmed) {
        return Ok(at);
    }

    let lowered = trimmed.to_ascii_lowercase();
    let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    match lowered.as_str() {
        "now" => return Ok(now),
        "today" | "midnight" => return Ok(midnight),
        "tomorrow" => return Ok(midnight + TimeDelta::days(1)),
        "yesterday" => return Ok(midnight - TimeDelta::days(1)),
        _ => {}
    }

    parse_relative(&lowered, now).ok_or_else(|| parse_error(text))
}

fn parse_absolute(text: &str) -> Option<DateTime<Utc>> {
    if let Some(epoch) = text.strip_prefix('@') {
        return epoch.trim().parse::<i64>().ok().and_then(|s| Utc.timestamp_opt(s, 0).single());
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.with_timezone(&Utc));
    }
    if let Ok(at) = DateTime::parse_from_rfc2822(text) {
        return Some(at.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(text, format) {
            return Some(at.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

fn parse_relative(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    let ago = tokens.last() == Some(&"ago");
    if ago {
        tokens.pop();
    }

    let mut at = now;
    let mut applied = false;
    let mut iter = tokens.into_iter();

    while let Some(token) = iter.next() {
        let (amount, unit) = match token {
            "next" => (1, iter.next()?),
            "last" => (-1, iter.next()?),
            _ => split_amount(token, &mut iter)?,
        };
        let amount = if ago { amount.checked_neg()? } else { amount };
        at = shift(at, amount, unit)?;
        applied = true;
    }

    applied.then_some(at)
}

/// Accepts `+3 days`, `+3days` and `3 days`.
fn split_amount<'a>(
    token: &'a str,
    rest: &mut impl Iterator<Item = &'a str>,
) -> Option<(i64, &'a str)> {
    let digits_end = token
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '+' || c == '-'))))
        .map_or(token.len(), |(i, _)| i);

    let (number, unit) = token.split_at(digits_end);
    let amount = number.parse::<i64>().ok()?;
    let unit = if unit.is_empty() { rest.next()? } else { unit };
    Some((amount, unit))
}

fn shift(at: DateTime<Utc>, amount: i64, unit: &str) -> Option<DateTime<Utc>> {
    let seconds_per_unit = match unit.trim_end_matches(',') {
        "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hour" | "hours" => 3_600,
        "day" | "days" => 86_400,
        "week" | "weeks" => 604_800,
        "fortnight" | "fortnights" => 1_209_600,
        "month" | "months" => return shift_months(at, amount),
        "year" | "years" => return shift_months(at, amount.checked_mul(12)?),
        _ => return None,
    };

    let delta = TimeDelta::try_seconds(amount.checked_mul(seconds_per_unit)?)?;
    at.checked_add_signed(delta)
}

fn shift_months(at: DateTime<Utc>, months: i64) -> Option<DateTime<Utc>> {
    let span = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 { at.checked_add_months(span) } else { at.checked_sub_months(span) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_session_resolves_to_zero() {
        assert_eq!(Lifetime::SESSION.resolve(fixed_now()).unwrap(), 0);
        assert_eq!(Lifetime::from_text("0").resolve(fixed_now()).unwrap(), 0);
    }

    #[test]
    fn test_seconds_are_relative() {
        let now = fixed_now();
        assert_eq!(Lifetime::Seconds(3600).resolve(now).unwrap(), now.timestamp() + 3600);
        assert_eq!(Lifetime::from_text("60").resolve(now).unwrap(), now.timestamp() + 60);
    }

    #[test]
    fn test_instants_are_absolute() {
        let at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(Lifetime::At(at).resolve(fixed_now()).unwrap(), at.timestamp());
    }

    #[test]
    fn test_absolute_expressions() {
        let now = fixed_now();
        let new_year = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

        for text in ["2030-01-01", "2030-01-01 00:00:00", "2030-01-01T00:00:00Z", "@1893456000"] {
            assert_eq!(parse_expression(text, now).unwrap(), new_year, "{text}");
        }
        assert_eq!(
            parse_expression("Tue, 1 Jan 2030 00:00:00 +0000", now).unwrap(),
            new_year
        );
    }

    #[test]
    fn test_keywords() {
        let now = fixed_now();
        let midnight = Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap();

        assert_eq!(parse_expression("now", now).unwrap(), now);
        assert_eq!(parse_expression("Today", now).unwrap(), midnight);
        assert_eq!(parse_expression("tomorrow", now).unwrap(), midnight + TimeDelta::days(1));
        assert_eq!(parse_expression("yesterday", now).unwrap(), midnight - TimeDelta::days(1));
    }

    #[test]
    fn test_relative_expressions() {
        let now = fixed_now();

        assert_eq!(parse_expression("+1 day", now).unwrap(), now + TimeDelta::days(1));
        assert_eq!(parse_expression("+1day", now).unwrap(), now + TimeDelta::days(1));
        assert_eq!(parse_expression("-30 minutes", now).unwrap(), now - TimeDelta::minutes(30));
        assert_eq!(
            parse_expression("2 weeks 3 hours", now).unwrap(),
            now + TimeDelta::weeks(2) + TimeDelta::hours(3)
        );
        assert_eq!(parse_expression("3 days ago", now).unwrap(), now - TimeDelta::days(3));
        assert_eq!(
            parse_expression("next month", now).unwrap(),
            Utc.with_ymd_and_hms(2026, 4, 15, 12, 30, 0).unwrap()
        );
        assert_eq!(
            parse_expression("+1 year", now).unwrap(),
            Utc.with_ymd_and_hms(2027, 3, 15, 12, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_unparseable_expressions() {
        let now = fixed_now();
        for text in ["", "invalid-date-text", "+1 parsec", "next", "1.5 days", "soon"] {
            let err = parse_expression(text, now).unwrap_err();
            assert!(matches!(err, CookieError::Parse { .. }), "{text}");
        }
    }

    #[test]
    fn test_from_value() {
        assert_eq!(Lifetime::from_value(&json!(3600)).unwrap(), Lifetime::Seconds(3600));
        assert_eq!(Lifetime::from_value(&json!("3600")).unwrap(), Lifetime::Seconds(3600));
        assert_eq!(
            Lifetime::from_value(&json!("+1 week")).unwrap(),
            Lifetime::Expression("+1 week".to_owned())
        );

        for value in [json!(1.5), json!(true), json!(null), json!([1]), json!({"s": 1})] {
            let err = Lifetime::from_value(&value).unwrap_err();
            assert!(matches!(err, CookieError::UnsupportedLifetime { .. }), "{value}");
        }
    }

    #[test]
    fn test_deserialize() {
        let seconds: Lifetime = serde_json::from_value(json!(60)).unwrap();
        let text: Lifetime = serde_json::from_value(json!("tomorrow")).unwrap();

        assert_eq!(seconds, Lifetime::Seconds(60));
        assert_eq!(text, Lifetime::Expression("tomorrow".to_owned()));
        assert!(serde_json::from_value::<Lifetime>(json!(false)).is_err());
    }
}
