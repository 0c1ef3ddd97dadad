use crate::config::ServerConfig;
use axum::extract::Path;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use crumb_cookie::{CookieOptions, Lifetime, SameSite};
use crumb_http::{CookieRejection, CookieRouterExt, Cookies};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Instant;

const SESSION: &str = "session";
const VISITS: &str = "visits";

static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Visits {
    count: u64,
}

#[derive(Serialize)]
struct SessionResponse {
    user: String,
}

/// Builds the service with one jar per request, configured from `cfg.cookies`.
pub fn app(cfg: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/visits", get(visits_handler))
        .route("/session", get(whoami_handler))
        .route("/session/{user}", post(login_handler))
        .route("/logout", post(logout_handler))
        .with_cookies(cfg.cookies.clone())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Encrypted, `s:`-prefixed, browser-session cookie.
fn session_options() -> CookieOptions {
    CookieOptions::builder()
        .encrypted(true)
        .prefix("s:")
        .same_site(SameSite::Lax)
        .lifetime(Lifetime::SESSION)
        .build()
}

async fn health_handler() -> impl IntoResponse {
    let body = HealthResponse {
        status: "up",
        version: env!("CARGO_PKG_VERSION"),
        uptime: START_TIME.elapsed().as_secs(),
    };

    (
        [
            (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(body),
    )
}

async fn visits_handler(cookies: Cookies) -> Result<Json<Visits>, CookieRejection> {
    cookies.make(VISITS, CookieOptions::default())?;
    let previous = cookies.http_value_as::<Visits>(VISITS)?.unwrap_or_default();

    let visits = Visits { count: previous.count + 1 };
    cookies.queue(VISITS, CookieOptions::default().with_value(&visits)?)?;

    Ok(Json(visits))
}

async fn login_handler(
    cookies: Cookies,
    Path(user): Path<String>,
) -> Result<Json<SessionResponse>, CookieRejection> {
    let mut options = session_options();
    options.value = Some(user.clone().into());
    cookies.queue(SESSION, options)?;

    Ok(Json(SessionResponse { user }))
}

async fn whoami_handler(cookies: Cookies) -> Result<impl IntoResponse, CookieRejection> {
    cookies.make(SESSION, session_options())?;

    Ok(match cookies.http_value_as::<String>(SESSION)? {
        Some(user) => Json(SessionResponse { user }).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    })
}

async fn logout_handler(cookies: Cookies) -> Result<StatusCode, CookieRejection> {
    cookies.make(SESSION, session_options())?;
    cookies.clear(SESSION)?;

    Ok(StatusCode::NO_CONTENT)
}
