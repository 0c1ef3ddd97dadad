use crate::rejection::CookieRejection;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use crumb_cookie::prelude::*;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug)]
struct CookiesInner {
    jar: Mutex<CookieJar>,
    request: RequestCookies,
}

/// The cookie jar of the current request, next to the cookies the request carried.
///
/// Installed into request extensions by [`crate::queued_cookies`] and extracted by handlers.
/// Clones share the same jar, so cookies queued by any clone are emitted with the response.
#[derive(Debug, Clone)]
pub struct Cookies {
    inner: Arc<CookiesInner>,
}

impl Cookies {
    #[must_use]
    pub fn new(jar: CookieJar, request: RequestCookies) -> Self {
        Self { inner: Arc::new(CookiesInner { jar: Mutex::new(jar), request }) }
    }

    /// Registers a cookie without queueing it, e.g. to read it back from the request.
    ///
    /// # Errors
    /// Propagates construction errors of [`CookieJar::make`].
    pub fn make(&self, alias: &str, options: CookieOptions) -> Result<Cookie, CookieError> {
        self.inner.jar.lock().make(alias, options).map(|cookie| cookie.clone())
    }

    /// Registers a cookie and queues it for the response.
    ///
    /// # Errors
    /// Propagates construction errors of [`CookieJar::make`].
    pub fn queue(&self, alias: &str, options: CookieOptions) -> Result<Cookie, CookieError> {
        self.inner.jar.lock().make(alias, options).map(|cookie| cookie.queue().clone())
    }

    /// Clears a registered cookie and queues the deletion.
    ///
    /// # Errors
    /// Returns [`CookieError::Config`] if `alias` is not registered.
    pub fn clear(&self, alias: &str) -> Result<Cookie, CookieError> {
        let mut jar = self.inner.jar.lock();
        let cookie = jar.get_mut(alias).ok_or_else(|| unregistered(alias))?;
        Ok(cookie.clear().queue().clone())
    }

    #[must_use]
    pub fn get(&self, alias: &str) -> Option<Cookie> {
        self.inner.jar.lock().get(alias).cloned()
    }

    /// Reads a registered cookie back out of the request.
    ///
    /// # Errors
    /// * [`CookieError::Config`] if `alias` is not registered.
    /// * [`CookieError::Decoding`] if the request value was tampered with.
    pub fn http_value(&self, alias: &str) -> Result<Option<Value>, CookieError> {
        let jar = self.inner.jar.lock();
        let cookie = jar.get(alias).ok_or_else(|| unregistered(alias))?;
        cookie.http_value(&self.inner.request)
    }

    /// Typed variant of [`Cookies::http_value`].
    ///
    /// # Errors
    /// As [`Cookies::http_value`], plus [`CookieError::Decoding`] if the value does not fit `T`.
    pub fn http_value_as<T: DeserializeOwned>(&self, alias: &str) -> Result<Option<T>, CookieError> {
        let jar = self.inner.jar.lock();
        let cookie = jar.get(alias).ok_or_else(|| unregistered(alias))?;
        cookie.http_value_as(&self.inner.request)
    }

    /// Runs `f` with exclusive access to the jar.
    pub fn with_jar<R>(&self, f: impl FnOnce(&mut CookieJar) -> R) -> R {
        f(&mut self.inner.jar.lock())
    }

    #[must_use]
    pub fn request(&self) -> &RequestCookies {
        &self.inner.request
    }

    pub(crate) fn fetch_queued(&self) -> Vec<Cookie> {
        self.inner.jar.lock().fetch_queued()
    }
}

fn unregistered(alias: &str) -> CookieError {
    CookieError::Config {
        message: format!("Cookie '{alias}' is not registered").into(),
        context: None,
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Cookies {
    type Rejection = CookieRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            CookieError::Unavailable {
                message: "No cookie jar for this request".into(),
                context: Some("queued_cookies middleware is not installed".into()),
            }
            .into()
        })
    }
}
