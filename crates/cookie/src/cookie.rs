use crate::error::CookieError;
use crate::jar::{CookieAttributes, CookieJar};
use crate::lifetime::FIVE_YEARS;
use crate::options::{CookieOptions, Prefix, SameSite};
use crate::source::CookieSource;
use chrono::Utc;
use crumb_cipher::prelude::{Aes, Cipher};
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use tracing::{debug, trace};

/// Length of the hex key every cookie derives from its alias.
const KEY_LEN: usize = 16;

/// Value sent in place of an absent one, so clients drop the cookie.
const DELETED: &str = "deleted";

/// One named cookie: an application value, how it is transformed on the wire, and whether it is
/// waiting to be emitted.
///
/// Values go through a fixed pipeline on write and its exact inverse on read:
///
/// ```text
/// write: value -> JSON (unless already a string) -> encrypt? -> prefix?
/// read:  raw -> percent-decode (unless raw) -> strip prefix? -> decrypt? -> JSON (unless numeric)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    alias: String,
    name: String,
    value: Option<String>,
    wire_value: Option<String>,
    expires: i64,
    attributes: CookieAttributes,
    encrypted: bool,
    prefix: Option<Prefix>,
    queued: bool,
}

impl Cookie {
    /// Builds a cookie for `alias`, filling every unset option from the jar.
    ///
    /// # Errors
    /// * [`CookieError::Encoding`] if the value cannot be turned into its wire form.
    /// * [`CookieError::Config`] if a value is set and the prefix is a `true` flag.
    /// * [`CookieError::UnsupportedLifetime`] or [`CookieError::Parse`] for a bad lifetime.
    /// * [`CookieError::Cipher`] if the per-alias cipher cannot be set up.
    pub fn new(
        alias: impl Into<String>,
        options: CookieOptions,
        jar: &CookieJar,
    ) -> Result<Self, CookieError> {
        let alias = alias.into();
        let CookieOptions {
            name,
            value,
            lifetime,
            path,
            domain,
            secure,
            http_only,
            raw,
            same_site,
            salt,
            encrypted,
            prefix,
        } = options;

        let name = wire_name(name.as_deref().unwrap_or(&alias), salt.as_deref().or(jar.salt()));
        let expires = jar.get_availability(lifetime.as_ref())?;
        let attributes = jar.get_defaults(
            path.as_deref(),
            domain.as_deref(),
            secure,
            http_only,
            raw,
            same_site,
        );

        let mut cookie = Self {
            alias,
            name,
            value: None,
            wire_value: None,
            expires,
            attributes,
            encrypted: encrypted.unwrap_or(false),
            prefix,
            queued: false,
        };
        cookie.set_value(value)?;

        debug!(
            alias = %cookie.alias,
            name = %cookie.name,
            encrypted = cookie.encrypted,
            expires = cookie.expires,
            "Cookie built"
        );
        Ok(cookie)
    }

    /// Replaces the application value and recomputes the wire value.
    ///
    /// # Errors
    /// Returns [`CookieError::Encoding`] or [`CookieError::Cipher`] if the pipeline fails.
    pub fn set_value(&mut self, value: Option<Value>) -> Result<&mut Self, CookieError> {
        let plain = to_plain(value)?;
        let wire = plain.as_deref().map(|plain| self.encode(plain)).transpose()?;

        self.value = plain;
        self.wire_value = wire;
        Ok(self)
    }

    fn encode(&self, plain: &str) -> Result<String, CookieError> {
        let body = if self.encrypted { Cow::Owned(self.encrypt(plain)?) } else { plain.into() };

        Ok(match self.prefix.as_ref().map(Prefix::resolve).transpose()?.flatten() {
            Some(prefix) => format!("{prefix}{body}"),
            None => body.into_owned(),
        })
    }

    /// The key every cookie with this alias encrypts with: the first 16 hex characters of the
    /// SHA-256 digest of the alias.
    #[must_use]
    pub fn encryption_key(alias: &str) -> String {
        let mut key = hex::encode(Sha256::digest(alias.as_bytes()));
        key.truncate(KEY_LEN);
        key
    }

    fn cipher(&self) -> Result<Cipher<Aes>, CookieError> {
        let cipher = Cipher::<Aes>::builder()
            .context(self.alias.as_bytes())
            .key(Self::encryption_key(&self.alias))?
            .build()?;
        Ok(cipher)
    }

    /// Encrypts a plaintext with this alias' key.
    ///
    /// # Errors
    /// Returns [`CookieError::Cipher`] if the cipher cannot be set up or sealing fails.
    pub fn encrypt(&self, plain: &str) -> Result<String, CookieError> {
        Ok(self.cipher()?.encrypt(plain)?)
    }

    /// Decrypts a value produced by [`Cookie::encrypt`] for the same alias.
    ///
    /// # Errors
    /// Returns [`CookieError::Decoding`] if the value was tampered with or belongs to another
    /// alias.
    pub fn decrypt(&self, hashed: &str) -> Result<String, CookieError> {
        self.cipher()?.decrypt(hashed).map_err(|e| CookieError::Decoding {
            message: "Cookie could not decrypt the value".into(),
            context: Some(format!("alias={}: {e}", self.alias).into()),
        })
    }

    /// Reads this cookie back out of a request, reversing the write pipeline.
    ///
    /// Returns `Ok(None)` when the request does not carry the cookie, carries an empty value or
    /// carries a JSON `null`.
    ///
    /// # Errors
    /// Returns [`CookieError::Decoding`] if the value cannot be percent-decoded or decrypted.
    pub fn http_value(&self, source: &impl CookieSource) -> Result<Option<Value>, CookieError> {
        let Some(raw) = source.cookie(&self.name).filter(|raw| !raw.is_empty()) else {
            trace!(name = %self.name, "Cookie absent from request");
            return Ok(None);
        };

        let decoded = if self.attributes.raw {
            raw
        } else {
            let decoded = percent_decode_str(&raw).decode_utf8().map_err(|e| {
                CookieError::Decoding {
                    message: "Cookie value is not valid percent-encoded UTF-8".into(),
                    context: Some(e.to_string().into()),
                }
            })?;
            Cow::Owned(decoded.into_owned())
        };

        let unprefixed = match self.prefix() {
            Some(prefix) => decoded.get(prefix.len()..).unwrap_or_default(),
            None => decoded.as_ref(),
        };

        let plain = if self.encrypted {
            Cow::Owned(self.decrypt(unprefixed)?)
        } else {
            Cow::Borrowed(unprefixed)
        };

        trace!(name = %self.name, "Cookie read from request");
        Ok(Some(interpret(&plain)).filter(|value| !value.is_null()))
    }

    /// Reads this cookie back out of a request into a typed value.
    ///
    /// # Errors
    /// Returns [`CookieError::Decoding`] if reading fails or the value does not fit `T`.
    pub fn http_value_as<T: DeserializeOwned>(
        &self,
        source: &impl CookieSource,
    ) -> Result<Option<T>, CookieError> {
        self.http_value(source)?
            .map(|value| {
                serde_json::from_value(value).map_err(|e| CookieError::Decoding {
                    message: "Cookie could not decode the value from JSON".into(),
                    context: Some(e.to_string().into()),
                })
            })
            .transpose()
    }

    /// Checks the request value against `expected`, or against this cookie's own value.
    ///
    /// Both sides are compared in their read-back form, so `42` matches a request carrying `42`
    /// even though it travels as the string `"42"`. An absent request value never matches.
    ///
    /// # Errors
    /// Propagates failures of [`Cookie::http_value`] and of encoding `expected`.
    pub fn check_request_value(
        &self,
        source: &impl CookieSource,
        expected: Option<&Value>,
    ) -> Result<bool, CookieError> {
        let Some(actual) = self.http_value(source)? else {
            return Ok(false);
        };

        let expected = match expected {
            Some(value) => to_plain(Some(value.clone()))?,
            None => self.value.clone(),
        };

        Ok(expected.is_some_and(|expected| interpret(&expected) == actual))
    }

    /// Drops the value and moves the expiration five years into the past.
    pub fn clear(&mut self) -> &mut Self {
        self.value = None;
        self.wire_value = None;
        self.expires = Utc::now().timestamp() - FIVE_YEARS;
        self
    }

    /// Moves the expiration five years into the future.
    pub fn never(&mut self) -> &mut Self {
        self.expires = Utc::now().timestamp() + FIVE_YEARS;
        self
    }

    pub fn queue(&mut self) -> &mut Self {
        self.queued = true;
        self
    }

    pub fn unqueue(&mut self) -> &mut Self {
        self.queued = false;
        self
    }

    #[must_use]
    pub const fn is_queued(&self) -> bool {
        self.queued
    }

    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The name sent on the wire: the alias (or explicit name) plus salt.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The application value in string form, before encryption and prefixing.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The value as it is sent: encrypted and prefixed, not yet percent-encoded.
    #[must_use]
    pub fn wire_value(&self) -> Option<&str> {
        self.wire_value.as_deref()
    }

    /// The literal prefix of the wire value, if one applies.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_ref().and_then(|prefix| prefix.resolve().ok().flatten())
    }

    /// Unix seconds of expiration, `0` for a session cookie.
    #[must_use]
    pub const fn expires(&self) -> i64 {
        self.expires
    }

    #[must_use]
    pub const fn attributes(&self) -> &CookieAttributes {
        &self.attributes
    }

    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.attributes.path.as_deref()
    }

    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.attributes.domain.as_deref()
    }

    #[must_use]
    pub const fn is_secure(&self) -> bool {
        matches!(self.attributes.secure, Some(true))
    }

    #[must_use]
    pub const fn is_http_only(&self) -> bool {
        self.attributes.http_only
    }

    #[must_use]
    pub const fn is_raw(&self) -> bool {
        self.attributes.raw
    }

    #[must_use]
    pub const fn same_site(&self) -> Option<SameSite> {
        self.attributes.same_site
    }

    /// Builds the RFC 6265 attribute object for this cookie.
    ///
    /// A cookie without a value becomes a deletion: value `deleted` and `Max-Age=0`.
    #[must_use]
    pub fn to_wire(&self) -> cookie::Cookie<'static> {
        let value = self.wire_value.clone().unwrap_or_else(|| DELETED.to_owned());
        let mut builder =
            cookie::Cookie::build((self.name.clone(), value)).http_only(self.attributes.http_only);

        if let Some(path) = &self.attributes.path {
            builder = builder.path(path.clone());
        }
        if let Some(domain) = &self.attributes.domain {
            builder = builder.domain(domain.clone());
        }
        if let Some(secure) = self.attributes.secure {
            builder = builder.secure(secure);
        }
        if let Some(same_site) = self.attributes.same_site {
            builder = builder.same_site(same_site.into());
        }

        if self.wire_value.is_none() {
            builder = builder.max_age(time::Duration::ZERO);
            if let Ok(at) = time::OffsetDateTime::from_unix_timestamp(self.expires) {
                builder = builder.expires(at);
            }
        } else if self.expires != 0 {
            let remaining = (self.expires - Utc::now().timestamp()).max(0);
            builder = builder.max_age(time::Duration::seconds(remaining));
            if let Ok(at) = time::OffsetDateTime::from_unix_timestamp(self.expires) {
                builder = builder.expires(at);
            }
        }

        builder.build()
    }

    /// Renders the `Set-Cookie` header value, percent-encoded unless the cookie is raw.
    #[must_use]
    pub fn header_value(&self) -> String {
        let wire = self.to_wire();
        if self.attributes.raw { wire.to_string() } else { wire.encoded().to_string() }
    }
}

/// `alias + salt`, with `.` replaced by `_`.
fn wire_name(base: &str, salt: Option<&str>) -> String {
    let mut name = base.to_owned();
    if let Some(salt) = salt {
        name.push_str(salt);
    }
    name.replace('.', "_")
}

/// The string form of an application value. Strings stay as they are, everything else is JSON.
fn to_plain(value: Option<Value>) -> Result<Option<String>, CookieError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(other) => serde_json::to_string(&other).map(Some).map_err(|e| CookieError::Encoding {
            message: "Cookie could not encode the value in JSON".into(),
            context: Some(e.to_string().into()),
        }),
    }
}

/// The read-back form of a plain value: numeric text stays text, valid JSON is decoded, anything
/// else stays text.
fn interpret(plain: &str) -> Value {
    if looks_numeric(plain) {
        return Value::String(plain.to_owned());
    }
    serde_json::from_str(plain).unwrap_or_else(|_| Value::String(plain.to_owned()))
}

/// Decimal integers and floats with optional sign, fraction and exponent, surrounding
/// whitespace allowed.
fn looks_numeric(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty()
        && text.bytes().any(|b| b.is_ascii_digit())
        && text.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
        && text.parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn jar() -> CookieJar {
        CookieJar::default()
    }

    fn source(name: &str, value: &str) -> HashMap<String, String> {
        HashMap::from([(name.to_owned(), value.to_owned())])
    }

    #[test]
    fn test_wire_name_appends_salt_and_replaces_dots() {
        assert_eq!(wire_name("session", Some("_v1")), "session_v1");
        assert_eq!(wire_name("app.session", Some(".v2")), "app_session_v2");
        assert_eq!(wire_name("plain", None), "plain");
    }

    #[test]
    fn test_name_falls_back_to_jar_salt() {
        let mut jar = jar();
        jar.set_salt("_v1");

        let from_jar = Cookie::new("sid", CookieOptions::default(), &jar).unwrap();
        let explicit =
            Cookie::new("sid", CookieOptions::builder().name("x").salt("_v9").build(), &jar)
                .unwrap();

        assert_eq!(from_jar.name(), "sid_v1");
        assert_eq!(explicit.name(), "x_v9");
        assert_eq!(explicit.alias(), "sid");
    }

    #[test]
    fn test_value_encoding() {
        let jar = jar();
        let text = Cookie::new("a", CookieOptions::builder().value("abc").build(), &jar).unwrap();
        let object =
            Cookie::new("b", CookieOptions::builder().value(json!({"uid": 42})).build(), &jar)
                .unwrap();
        let empty = Cookie::new("c", CookieOptions::default(), &jar).unwrap();

        assert_eq!(text.wire_value(), Some("abc"));
        assert_eq!(object.wire_value(), Some(r#"{"uid":42}"#));
        assert_eq!(empty.value(), None);
        assert_eq!(empty.wire_value(), None);
    }

    #[test]
    fn test_prefix_applies_after_encryption() {
        let options =
            CookieOptions::builder().value("abc").encrypted(true).prefix("p_").build();
        let cookie = Cookie::new("tok", options, &jar()).unwrap();

        let wire = cookie.wire_value().unwrap();
        assert!(wire.starts_with("p_"));
        assert!(!wire.contains("abc"));
        assert_eq!(cookie.decrypt(&wire["p_".len()..]).unwrap(), "abc");
    }

    #[test]
    fn test_true_prefix_flag_is_rejected() {
        let options = CookieOptions::builder().value("abc").prefix(true).build();
        let err = Cookie::new("tok", options, &jar()).unwrap_err();
        assert!(matches!(err, CookieError::Config { .. }));
    }

    #[test]
    fn test_true_prefix_flag_needs_a_value_to_fail() {
        let options = CookieOptions::builder().prefix(true).build();
        let mut cookie = Cookie::new("tok", options, &jar()).unwrap();

        assert_eq!(cookie.prefix(), None);
        assert_eq!(cookie.wire_value(), None);

        let err = cookie.set_value(Some(json!("abc"))).unwrap_err();
        assert!(matches!(err, CookieError::Config { .. }));
    }

    #[test]
    fn test_null_request_value_is_absent() {
        let cookie = Cookie::new("s", CookieOptions::default(), &jar()).unwrap();

        assert_eq!(cookie.http_value(&source("s", "null")).unwrap(), None);
        assert_eq!(cookie.http_value(&source("s", "%20null%20")).unwrap(), None);
        assert!(!cookie.check_request_value(&source("s", "null"), Some(&json!("null"))).unwrap());
    }

    #[test]
    fn test_encryption_key_is_derived_from_alias() {
        let key = Cookie::encryption_key("tok");

        assert_eq!(key.len(), KEY_LEN);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, Cookie::encryption_key("tok"));
        assert_ne!(key, Cookie::encryption_key("other"));
    }

    #[test]
    fn test_same_alias_shares_key() {
        let jar = jar();
        let first = Cookie::new("tok", CookieOptions::builder().value("x").build(), &jar).unwrap();
        let second = Cookie::new(
            "tok",
            CookieOptions::builder().name("renamed").encrypted(true).build(),
            &jar,
        )
        .unwrap();

        let hashed = first.encrypt("shared").unwrap();
        assert_eq!(second.decrypt(&hashed).unwrap(), "shared");
    }

    #[test]
    fn test_http_value_pipeline() {
        let jar = jar();
        let cookie = Cookie::new("s", CookieOptions::default(), &jar).unwrap();

        assert_eq!(
            cookie.http_value(&source("s", "%7B%22uid%22%3A42%7D")).unwrap(),
            Some(json!({"uid": 42}))
        );
        assert_eq!(
            cookie.http_value(&source("s", "hello%20world")).unwrap(),
            Some(json!("hello world"))
        );
        assert_eq!(cookie.http_value(&source("s", "42")).unwrap(), Some(json!("42")));
        assert_eq!(cookie.http_value(&source("s", "-1.5e3")).unwrap(), Some(json!("-1.5e3")));
        assert_eq!(cookie.http_value(&source("s", "true")).unwrap(), Some(json!(true)));
        assert_eq!(cookie.http_value(&source("s", "{broken")).unwrap(), Some(json!("{broken")));
        assert_eq!(cookie.http_value(&source("s", "")).unwrap(), None);
        assert_eq!(cookie.http_value(&source("other", "x")).unwrap(), None);
    }

    #[test]
    fn test_raw_cookies_skip_percent_decoding() {
        let cookie =
            Cookie::new("s", CookieOptions::builder().raw(true).build(), &jar()).unwrap();

        assert_eq!(cookie.http_value(&source("s", "a%20b")).unwrap(), Some(json!("a%20b")));
    }

    #[test]
    fn test_prefix_is_stripped_by_length() {
        let cookie =
            Cookie::new("s", CookieOptions::builder().prefix("p_").build(), &jar()).unwrap();

        assert_eq!(cookie.http_value(&source("s", "p_abc")).unwrap(), Some(json!("abc")));
        assert_eq!(cookie.http_value(&source("s", "xxabc")).unwrap(), Some(json!("abc")));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let cookie = Cookie::new(
            "tok",
            CookieOptions::builder().value("abc").encrypted(true).build(),
            &jar(),
        )
        .unwrap();

        let mut wire = cookie.wire_value().unwrap().to_owned();
        let last = wire.pop().unwrap();
        wire.push(if last == 'A' { 'B' } else { 'A' });

        let err = cookie.http_value(&source("tok", &wire)).unwrap_err();
        assert!(matches!(err, CookieError::Decoding { .. }));
    }

    #[test]
    fn test_check_request_value() {
        let jar = jar();
        let cookie =
            Cookie::new("n", CookieOptions::builder().value(json!(42)).build(), &jar).unwrap();

        assert!(cookie.check_request_value(&source("n", "42"), None).unwrap());
        assert!(cookie.check_request_value(&source("n", "42"), Some(&json!("42"))).unwrap());
        assert!(!cookie.check_request_value(&source("n", "43"), None).unwrap());
        assert!(!cookie.check_request_value(&source("x", "42"), None).unwrap());
    }

    #[test]
    fn test_http_value_as() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Session {
            uid: u32,
        }

        let cookie = Cookie::new("s", CookieOptions::default(), &jar()).unwrap();
        let session: Option<Session> =
            cookie.http_value_as(&source("s", r#"{"uid":42}"#)).unwrap();

        assert_eq!(session, Some(Session { uid: 42 }));
        assert!(cookie.http_value_as::<Session>(&source("s", "nope")).is_err());
    }

    #[test]
    fn test_clear_and_never() {
        let mut cookie =
            Cookie::new("s", CookieOptions::builder().value("v").build(), &jar()).unwrap();
        let now = Utc::now().timestamp();

        cookie.clear();
        assert_eq!(cookie.value(), None);
        assert!(cookie.expires() <= now - FIVE_YEARS + 5);

        cookie.never();
        assert!(cookie.expires() >= now + FIVE_YEARS);
    }

    #[test]
    fn test_queue_chaining() {
        let mut cookie = Cookie::new("s", CookieOptions::default(), &jar()).unwrap();

        assert!(cookie.queue().queue().is_queued());
        assert!(!cookie.unqueue().is_queued());
    }

    #[test]
    fn test_header_value() {
        let jar = jar();
        let session = Cookie::new(
            "s",
            CookieOptions::builder()
                .value(json!({"uid": 42}))
                .path("/")
                .same_site(SameSite::Lax)
                .build(),
            &jar,
        )
        .unwrap();

        let header = session.header_value();
        let parsed = cookie::Cookie::parse_encoded(header.clone()).unwrap();
        assert_eq!(parsed.name(), "s");
        assert_eq!(parsed.value(), r#"{"uid":42}"#);
        assert!(!header.contains('"'), "{header}");
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Path=/"));
        assert!(!header.contains("Expires"));

        let mut cleared = session.clone();
        cleared.clear();
        let header = cleared.header_value();
        assert!(header.starts_with("s=deleted"));
        assert!(header.contains("Max-Age=0"));
        assert!(header.contains("Expires="));
    }

    #[test]
    fn test_looks_numeric() {
        for text in ["42", "-1", "+3.14", "1e10", " 7 ", ".5"] {
            assert!(looks_numeric(text), "{text}");
        }
        for text in ["", "abc", "0x1A", "inf", "NaN", "1-2", "{}", "-"] {
            assert!(!looks_numeric(text), "{text}");
        }
    }
}
