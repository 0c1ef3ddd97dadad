#![allow(dead_code)]

use crumb_cookie::prelude::*;
use http::header::COOKIE;
use http::{HeaderMap, HeaderValue};

/// The `name=value` part of a `Set-Cookie` header, i.e. what a browser sends back.
pub fn request_pair(cookie: &Cookie) -> String {
    let header = cookie.header_value();
    header.split(';').next().unwrap_or_default().to_owned()
}

/// A request carrying every given cookie in one `Cookie` header.
pub fn request_with(cookies: &[Cookie]) -> HeaderMap {
    let line = cookies.iter().map(request_pair).collect::<Vec<_>>().join("; ");

    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, HeaderValue::from_bytes(line.as_bytes()).expect("cookie header is valid"));
    headers
}

pub fn versioned_jar() -> CookieJar {
    let mut jar = CookieJar::default();
    jar.set_lifetime(3600).set_salt("_v1");
    jar
}
