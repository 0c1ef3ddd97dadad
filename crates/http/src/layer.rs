use crate::cookies::Cookies;
use axum::Router;
use axum::extract::{Request, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::Response;
use crumb_cookie::{CookieJar, JarConfig, RequestCookies};
use std::sync::Arc;
use tracing::{debug, warn};

/// Gives every request its own [`CookieJar`] and writes the queued cookies into the response.
///
/// The jar is built from the shared configuration and handed to handlers as [`Cookies`]. Once the
/// inner service has produced a response the jar is drained exactly once and each cookie becomes
/// one `Set-Cookie` header.
pub async fn queued_cookies(
    State(config): State<Arc<JarConfig>>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookies = Cookies::new(
        CookieJar::from_config(&config),
        RequestCookies::from_headers(request.headers()),
    );
    request.extensions_mut().insert(cookies.clone());

    let mut response = next.run(request).await;
    emit(&cookies, response.headers_mut());
    response
}

fn emit(cookies: &Cookies, headers: &mut HeaderMap) {
    let queued = cookies.fetch_queued();
    if queued.is_empty() {
        return;
    }

    debug!(count = queued.len(), "Writing queued cookies");
    for cookie in queued {
        match HeaderValue::try_from(cookie.header_value()) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            },
            Err(err) => warn!(alias = cookie.alias(), error = %err, "Skipping unsendable cookie"),
        }
    }
}

pub trait CookieRouterExt {
    /// Installs [`queued_cookies`] with jars configured by `config`.
    #[must_use]
    fn with_cookies(self, config: JarConfig) -> Self;
}

impl<S> CookieRouterExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_cookies(self, config: JarConfig) -> Self {
        self.layer(middleware::from_fn_with_state(Arc::new(config), queued_cookies))
    }
}
