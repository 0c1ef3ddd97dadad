use crate::error::CookieError;
use crate::filter::optional_flag;
use crate::lifetime::Lifetime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumString};
use typed_builder::TypedBuilder;

/// The `SameSite` directive of a cookie.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(try_from = "String")]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl TryFrom<String> for SameSite {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(value.trim())
    }
}

impl From<SameSite> for cookie::SameSite {
    fn from(value: SameSite) -> Self {
        match value {
            SameSite::Strict => Self::Strict,
            SameSite::Lax => Self::Lax,
            SameSite::None => Self::None,
        }
    }
}

/// A literal prefix for the outgoing value.
///
/// Loosely typed configuration may carry `false` to mean "no prefix". A `true` flag has no
/// meaningful prefix text and is rejected once there is a value to prefix.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Prefix {
    Text(String),
    Flag(bool),
}

impl Prefix {
    /// Returns the prefix text, or `None` when no prefix applies.
    ///
    /// # Errors
    /// Returns [`CookieError::Config`] for a `true` flag.
    pub fn resolve(&self) -> Result<Option<&str>, CookieError> {
        match self {
            Self::Text(text) if text.is_empty() => Ok(None),
            Self::Text(text) => Ok(Some(text)),
            Self::Flag(false) => Ok(None),
            Self::Flag(true) => Err(CookieError::Config {
                message: "Cookie could not prefix cookie value".into(),
                context: Some("prefix must be a string".into()),
            }),
        }
    }
}

impl From<&str> for Prefix {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Prefix {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<bool> for Prefix {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

/// Per-cookie settings for [`crate::CookieJar::make`].
///
/// Every field is optional. Anything left unset falls back to the jar: `lifetime`, `salt` and the
/// attribute defaults. `encrypted` defaults to `false`, `name` to the alias.
///
/// ```rust
/// use crumb_cookie::prelude::*;
/// use serde_json::json;
///
/// let options = CookieOptions::builder()
///     .value(json!({"uid": 42}))
///     .lifetime(3600)
///     .same_site(SameSite::Lax)
///     .build();
///
/// let from_config: CookieOptions = serde_json::from_value(json!({
///     "value": {"uid": 42},
///     "expire": 3600,
///     "sameSite": "lax",
///     "httpOnly": "false",
/// }))
/// .unwrap();
///
/// assert_eq!(options.value, from_config.value);
/// assert_eq!(options.lifetime, from_config.lifetime);
/// assert_eq!(from_config.http_only, Some(false));
/// ```
#[derive(Debug, Clone, Default, PartialEq, TypedBuilder, Deserialize)]
#[builder(field_defaults(default, setter(strip_option, into)))]
#[serde(default, rename_all = "camelCase")]
pub struct CookieOptions {
    pub name: Option<String>,
    pub value: Option<Value>,
    #[serde(alias = "expire")]
    pub lifetime: Option<Lifetime>,
    pub path: Option<String>,
    pub domain: Option<String>,
    #[serde(deserialize_with = "optional_flag")]
    pub secure: Option<bool>,
    #[serde(alias = "http_only", deserialize_with = "optional_flag")]
    pub http_only: Option<bool>,
    #[serde(deserialize_with = "optional_flag")]
    pub raw: Option<bool>,
    #[serde(alias = "same_site")]
    pub same_site: Option<SameSite>,
    pub salt: Option<String>,
    #[serde(deserialize_with = "optional_flag")]
    pub encrypted: Option<bool>,
    pub prefix: Option<Prefix>,
}

impl CookieOptions {
    /// Replaces the value with the JSON form of any serializable value.
    ///
    /// # Errors
    /// Returns [`CookieError::Encoding`] if the value cannot be represented as JSON.
    pub fn with_value<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, CookieError> {
        let value = serde_json::to_value(value).map_err(|e| CookieError::Encoding {
            message: "Cookie could not encode the value in JSON".into(),
            context: Some(e.to_string().into()),
        })?;
        self.value = Some(value);
        Ok(self)
    }
}
