//! Permissive boolean parsing.
//!
//! Cookie settings arrive both as real booleans and as strings (environment variables, form
//! posted configuration, TOML written by hand). Both spellings must behave identically, so every
//! flag goes through [`parse_flag`] with one fixed set of accepted literals.

use serde::Deserializer;
use serde::de::{self, Visitor};
use std::fmt;

/// Literals read as `true`, compared case-insensitively after trimming.
pub const TRUE_LITERALS: [&str; 4] = ["1", "true", "on", "yes"];

/// Parses a textual flag. Anything outside [`TRUE_LITERALS`] is `false`.
///
/// ```rust
/// use crumb_cookie::filter::parse_flag;
///
/// assert!(parse_flag("TRUE"));
/// assert!(parse_flag(" 1 "));
/// assert!(!parse_flag("off"));
/// assert!(!parse_flag(""));
/// ```
#[must_use]
pub fn parse_flag(raw: &str) -> bool {
    let raw = raw.trim();
    TRUE_LITERALS.iter().any(|literal| raw.eq_ignore_ascii_case(literal))
}

struct FlagVisitor;

impl<'de> Visitor<'de> for FlagVisitor {
    type Value = Option<bool>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a boolean, an integer or a boolean-like string")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v == 1))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v == 1))
    }

    #[allow(clippy::float_cmp)]
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Some(v == 1.0))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Some(parse_flag(v)))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
        d.deserialize_any(Self)
    }
}

/// `deserialize_with` helper for `Option<bool>` fields.
///
/// # Errors
/// Fails for maps, sequences and other non-scalar input.
pub fn optional_flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    d.deserialize_any(FlagVisitor)
}

/// `deserialize_with` helper for `bool` fields; an explicit null reads as `false`.
///
/// # Errors
/// Fails for maps, sequences and other non-scalar input.
pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    optional_flag(d).map(Option::unwrap_or_default)
}
