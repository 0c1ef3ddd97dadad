use std::borrow::Cow;

/// Errors raised while building, reading or expiring cookies.
#[crumb_derive::crumb_error]
pub enum CookieError {
    /// Construction arguments are malformed, e.g. a prefix flag that is not a string.
    #[error("Cookie configuration error{}: {message}", format_context(.context))]
    Config { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// An application value cannot be turned into its wire form.
    #[error("Cookie encoding error{}: {message}", format_context(.context))]
    Encoding { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A value read back from a request cannot be decoded or decrypted.
    ///
    /// Callers should treat the cookie as absent or tampered.
    #[error("Cookie decoding error{}: {message}", format_context(.context))]
    Decoding { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A lifetime was given as something other than seconds, a date expression or an instant.
    #[error("Unsupported cookie lifetime{}: {message}", format_context(.context))]
    UnsupportedLifetime { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A textual lifetime could not be resolved to an instant.
    #[error("Cookie lifetime parse error{}: {message}", format_context(.context))]
    Parse { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// No jar is available for the current scope.
    #[error("Cookie jar unavailable{}: {message}", format_context(.context))]
    Unavailable { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The per-alias cipher could not be set up.
    #[error("Cookie cipher error{}: {source}", format_context(.context))]
    Cipher { source: crumb_cipher::CipherError, context: Option<Cow<'static, str>> },

    #[error("Internal cookie error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
