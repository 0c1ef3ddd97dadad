use crate::config::JarConfig;
use crate::cookie::Cookie;
use crate::error::CookieError;
use crate::lifetime::Lifetime;
use crate::options::{CookieOptions, SameSite};
use chrono::Utc;
use fxhash::FxHashMap;
use serde_json::Value;
use tracing::{debug, warn};

/// Attributes every cookie of a jar starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
    pub path: Option<String>,
    pub domain: Option<String>,
    pub secure: Option<bool>,
    pub http_only: bool,
    pub raw: bool,
    pub same_site: Option<SameSite>,
}

impl Default for CookieAttributes {
    fn default() -> Self {
        Self { path: None, domain: None, secure: None, http_only: true, raw: false, same_site: None }
    }
}

/// A registry of cookies keyed by alias, with the defaults new cookies are built from.
///
/// A jar is meant to live for one request: build it from a shared [`JarConfig`], let handlers
/// [`make`](Self::make) and [`queue`](Cookie::queue) cookies, then drain it once with
/// [`fetch_queued`](Self::fetch_queued) when the response is written.
///
/// ```rust
/// use crumb_cookie::prelude::*;
/// use serde_json::json;
///
/// # fn main() -> Result<(), CookieError> {
/// let mut jar = CookieJar::default();
/// jar.set_lifetime(3600).set_salt("_v1");
///
/// jar.make("session", CookieOptions::builder().value(json!({"uid": 42})).build())?.queue();
///
/// let queued = jar.fetch_queued();
/// assert_eq!(queued.len(), 1);
/// assert_eq!(queued[0].name(), "session_v1");
/// assert!(jar.fetch_queued().is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
    index: FxHashMap<String, usize>,
    defaults: CookieAttributes,
    lifetime: Lifetime,
    salt: Option<String>,
}

impl CookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_config(config: &JarConfig) -> Self {
        let mut jar = Self::new();
        jar.set_defaults(
            config.path.clone(),
            config.domain.clone(),
            config.secure,
            Some(config.http_only),
            Some(config.raw),
            config.same_site,
        )
        .set_lifetime(config.lifetime.clone());

        if let Some(salt) = &config.salt {
            jar.set_salt(salt.clone());
        }
        jar
    }

    /// Builds a cookie and registers it under `alias`, replacing any cookie already there.
    ///
    /// A replaced cookie keeps its position in the registry.
    ///
    /// # Errors
    /// Propagates every construction error of [`Cookie::new`].
    pub fn make(
        &mut self,
        alias: impl Into<String>,
        options: CookieOptions,
    ) -> Result<&mut Cookie, CookieError> {
        let cookie = Cookie::new(alias, options, self)?;
        let slot = self.insert(cookie);
        Ok(&mut self.cookies[slot])
    }

    /// Registers a prebuilt cookie under its own alias.
    pub fn add(&mut self, cookie: Cookie) -> &mut Self {
        self.insert(cookie);
        self
    }

    fn insert(&mut self, cookie: Cookie) -> usize {
        if let Some(&slot) = self.index.get(cookie.alias()) {
            debug!(alias = cookie.alias(), "Replacing registered cookie");
            self.cookies[slot] = cookie;
            return slot;
        }

        let slot = self.cookies.len();
        self.index.insert(cookie.alias().to_owned(), slot);
        self.cookies.push(cookie);
        slot
    }

    #[must_use]
    pub fn get(&self, alias: &str) -> Option<&Cookie> {
        self.index.get(alias).map(|&slot| &self.cookies[slot])
    }

    pub fn get_mut(&mut self, alias: &str) -> Option<&mut Cookie> {
        self.index.get(alias).map(|&slot| &mut self.cookies[slot])
    }

    /// Every registered cookie, in registration order.
    #[must_use]
    pub fn all(&self) -> &[Cookie] {
        &self.cookies
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Returns every queued cookie in registration order and unqueues them.
    ///
    /// A second call without new [`Cookie::queue`] calls returns nothing.
    pub fn fetch_queued(&mut self) -> Vec<Cookie> {
        let queued: Vec<Cookie> = self
            .cookies
            .iter_mut()
            .filter(|cookie| cookie.is_queued())
            .map(|cookie| cookie.unqueue().clone())
            .collect();

        if !queued.is_empty() {
            debug!(count = queued.len(), "Drained queued cookies");
        }
        queued
    }

    /// Resolves a lifetime, or the jar lifetime when `None`, to Unix seconds. `0` means session.
    ///
    /// # Errors
    /// Returns [`CookieError::Parse`] if a date expression cannot be resolved.
    pub fn get_availability(&self, lifetime: Option<&Lifetime>) -> Result<i64, CookieError> {
        lifetime.unwrap_or(&self.lifetime).resolve(Utc::now())
    }

    /// Like [`get_availability`](Self::get_availability) for an untyped value. `null` selects the
    /// jar lifetime.
    ///
    /// # Errors
    /// * [`CookieError::UnsupportedLifetime`] for floats, booleans, arrays and objects.
    /// * [`CookieError::Parse`] if a date expression cannot be resolved.
    pub fn availability_of(&self, value: &Value) -> Result<i64, CookieError> {
        if value.is_null() {
            return self.get_availability(None);
        }
        let lifetime = Lifetime::from_value(value)?;
        self.get_availability(Some(&lifetime))
    }

    /// Merges explicit attributes with the jar defaults.
    ///
    /// An empty or absent `path` or `domain` falls back to the jar. Everything else falls back
    /// only when absent, so an explicit `false` always wins.
    #[must_use]
    pub fn get_defaults(
        &self,
        path: Option<&str>,
        domain: Option<&str>,
        secure: Option<bool>,
        http_only: Option<bool>,
        raw: Option<bool>,
        same_site: Option<SameSite>,
    ) -> CookieAttributes {
        let or_default = |given: Option<&str>, default: Option<&str>| {
            given.filter(|s| !s.is_empty()).or(default).map(str::to_owned)
        };

        CookieAttributes {
            path: or_default(path, self.defaults.path.as_deref()),
            domain: or_default(domain, self.defaults.domain.as_deref()),
            secure: secure.or(self.defaults.secure),
            http_only: http_only.unwrap_or(self.defaults.http_only),
            raw: raw.unwrap_or(self.defaults.raw),
            same_site: same_site.or(self.defaults.same_site),
        }
    }

    /// Replaces every attribute default. Absent `http_only` means `true`, absent `raw` `false`.
    pub fn set_defaults(
        &mut self,
        path: Option<String>,
        domain: Option<String>,
        secure: Option<bool>,
        http_only: Option<bool>,
        raw: Option<bool>,
        same_site: Option<SameSite>,
    ) -> &mut Self {
        self.defaults = CookieAttributes {
            path,
            domain,
            secure,
            http_only: http_only.unwrap_or(true),
            raw: raw.unwrap_or(false),
            same_site,
        };
        self
    }

    pub fn set_lifetime(&mut self, lifetime: impl Into<Lifetime>) -> &mut Self {
        self.lifetime = lifetime.into();
        self
    }

    /// Sets the jar lifetime from an untyped value, degrading to a session lifetime when the
    /// value has an unsupported kind.
    pub fn set_lifetime_value(&mut self, value: &Value) -> &mut Self {
        self.lifetime = Lifetime::from_value(value).unwrap_or_else(|err| {
            warn!(error = %err, "Unsupported jar lifetime, using session cookies");
            Lifetime::SESSION
        });
        self
    }

    #[must_use]
    pub const fn lifetime(&self) -> &Lifetime {
        &self.lifetime
    }

    pub fn set_salt(&mut self, salt: impl Into<String>) -> &mut Self {
        self.salt = Some(salt.into());
        self
    }

    #[must_use]
    pub fn salt(&self) -> Option<&str> {
        self.salt.as_deref()
    }

    #[must_use]
    pub const fn defaults(&self) -> &CookieAttributes {
        &self.defaults
    }
}
