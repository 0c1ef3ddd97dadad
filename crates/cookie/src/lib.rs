//! # Cookies
//!
//! Named HTTP cookies whose values are transformed on the way out and restored on the way in,
//! emitted through a queue that is drained once per response.
//!
//! * [`CookieJar`] holds the cookies of one request, keyed by alias, and the defaults new cookies
//!   start from (path, domain, flags, lifetime, name salt).
//! * [`Cookie`] owns one value and its pipeline: JSON for structured values, optional encryption
//!   keyed by the alias, optional literal prefix. [`Cookie::http_value`] reverses it.
//! * [`CookieSource`] is the request side: anything that maps a cookie name to its raw value.
//!
//! ## Example
//! ```rust
//! use crumb_cookie::prelude::*;
//! use serde_json::json;
//! use std::collections::HashMap;
//!
//! # fn main() -> Result<(), CookieError> {
//! let mut jar = CookieJar::default();
//! let token = jar
//!     .make("tok", CookieOptions::builder().value("abc").encrypted(true).build())?
//!     .queue()
//!     .wire_value()
//!     .map(str::to_owned)
//!     .unwrap_or_default();
//! assert!(!token.contains("abc"));
//!
//! let request = HashMap::from([("tok".to_owned(), token)]);
//! let cookie = jar.get("tok").ok_or("tok is registered")?;
//! assert_eq!(cookie.http_value(&request)?, Some(json!("abc")));
//! # Ok(())
//! # }
//! ```

mod config;
mod cookie;
mod error;
pub mod filter;
mod jar;
mod lifetime;
mod options;
mod source;

pub use config::JarConfig;
pub use crate::cookie::Cookie;
pub use error::{CookieError, CookieErrorExt};
pub use jar::{CookieAttributes, CookieJar};
pub use lifetime::{FIVE_YEARS, Lifetime, parse_expression};
pub use options::{CookieOptions, Prefix, SameSite};
pub use source::{CookieSource, RequestCookies};

pub mod prelude {
    pub use crate::config::JarConfig;
    pub use crate::cookie::Cookie;
    pub use crate::error::{CookieError, CookieErrorExt};
    pub use crate::jar::CookieJar;
    pub use crate::lifetime::Lifetime;
    pub use crate::options::{CookieOptions, Prefix, SameSite};
    pub use crate::source::{CookieSource, RequestCookies};
}
