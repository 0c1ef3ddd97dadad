//! # Cookie Middleware
//!
//! Axum glue for [`crumb_cookie`]: one [`CookieJar`](crumb_cookie::CookieJar) per request, a
//! [`Cookies`] extractor to reach it, and a response hook that turns queued cookies into
//! `Set-Cookie` headers.
//!
//! ## Example
//! ```rust
//! use axum::{Router, routing::post};
//! use crumb_cookie::prelude::*;
//! use crumb_http::{CookieRejection, CookieRouterExt, Cookies};
//!
//! async fn login(cookies: Cookies) -> Result<&'static str, CookieRejection> {
//!     cookies.queue("sid", CookieOptions::builder().value("42").encrypted(true).build())?;
//!     Ok("welcome")
//! }
//!
//! let app: Router = Router::new().route("/login", post(login)).with_cookies(JarConfig::default());
//! ```

mod cookies;
mod layer;
mod rejection;

pub use cookies::Cookies;
pub use layer::{CookieRouterExt, queued_cookies};
pub use rejection::CookieRejection;
