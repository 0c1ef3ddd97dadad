//! Request-side cookie lookup.

use fxhash::FxHashMap;
use http::HeaderMap;
use http::header::COOKIE;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Anything that can answer "what raw value did the request send for this cookie name?".
///
/// Values are returned exactly as received, before any percent-decoding.
pub trait CookieSource {
    fn cookie(&self, name: &str) -> Option<Cow<'_, str>>;
}

impl<S: BuildHasher> CookieSource for HashMap<String, String, S> {
    fn cookie(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|v| Cow::Borrowed(v.as_str()))
    }
}

impl CookieSource for BTreeMap<String, String> {
    fn cookie(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|v| Cow::Borrowed(v.as_str()))
    }
}

impl CookieSource for HeaderMap {
    fn cookie(&self, name: &str) -> Option<Cow<'_, str>> {
        cookie_pairs(self).find(|(n, _)| *n == name).map(|(_, v)| Cow::Borrowed(v))
    }
}

impl<T: CookieSource + ?Sized> CookieSource for &T {
    fn cookie(&self, name: &str) -> Option<Cow<'_, str>> {
        (**self).cookie(name)
    }
}

/// Iterates the `name=value` pairs of every `Cookie` header in order.
///
/// Headers may carry raw UTF-8 values. A pair that is not valid UTF-8 is skipped on its own,
/// the rest of its header still counts.
fn cookie_pairs(headers: &HeaderMap) -> impl Iterator<Item = (&str, &str)> {
    headers
        .get_all(COOKIE)
        .iter()
        .flat_map(|header| header.as_bytes().split(|&byte| byte == b';'))
        .filter_map(|pair| std::str::from_utf8(pair).ok())
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(name, value)| (name.trim(), value.trim()))
}

/// An owned snapshot of the cookies a request carried.
///
/// When a name appears more than once the first occurrence wins, matching how browsers order
/// the most specific path first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCookies {
    cookies: FxHashMap<String, String>,
}

impl RequestCookies {
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = FxHashMap::default();
        for (name, value) in cookie_pairs(headers) {
            cookies.entry(name.to_owned()).or_insert_with(|| value.to_owned());
        }
        Self { cookies }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

impl CookieSource for RequestCookies {
    fn cookie(&self, name: &str) -> Option<Cow<'_, str>> {
        self.cookies.get(name).map(|v| Cow::Borrowed(v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestCookies {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut cookies = FxHashMap::default();
        for (name, value) in iter {
            cookies.entry(name.into()).or_insert_with(|| value.into());
        }
        Self { cookies }
    }
}
