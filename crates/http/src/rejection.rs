use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use crumb_cookie::CookieError;
use tracing::{error, warn};

/// A [`CookieError`] surfaced from a handler or the [`crate::Cookies`] extractor.
///
/// Values a client sent that cannot be read back are its fault (`400`); everything else is
/// ours (`500`).
#[derive(Debug)]
pub struct CookieRejection(pub CookieError);

impl CookieRejection {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self.0 {
            CookieError::Decoding { .. }
            | CookieError::Parse { .. }
            | CookieError::UnsupportedLifetime { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CookieError> for CookieRejection {
    fn from(err: CookieError) -> Self {
        Self(err)
    }
}

impl IntoResponse for CookieRejection {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "Cookie handling failed");
            return status.into_response();
        }

        warn!(error = %self.0, "Rejected request cookie");
        (status, self.0.to_string()).into_response()
    }
}
