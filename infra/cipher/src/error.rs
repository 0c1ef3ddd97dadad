//! # Cipher Errors
//!
//! [`CipherError`] covers key setup, sealing and opening failures.

use std::borrow::Cow;

/// Errors reported by [`crate::Cipher`] and [`crate::CipherBuilder`].
#[crumb_derive::crumb_error]
pub enum CipherError {
    /// Failure during the encryption process.
    #[error("Encryption error{}: {message}", format_context(.context))]
    Encryption { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Failure during the decryption process.
    ///
    /// Raised for a wrong key, a mismatched context (AAD) or a tampered token.
    #[error("Decryption error{}: {message}", format_context(.context))]
    Decryption { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The token is not valid URL-safe base64.
    #[error("Token encoding error{}: {source}", format_context(.context))]
    Encoding { source: base64::DecodeError, context: Option<Cow<'static, str>> },

    /// The decrypted plaintext is not UTF-8.
    #[error("Plaintext is not UTF-8{}: {source}", format_context(.context))]
    Utf8 { source: std::string::FromUtf8Error, context: Option<Cow<'static, str>> },

    /// The builder was given unusable settings.
    #[error("Invalid configuration{}: {message}", format_context(.context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The token is malformed or too short.
    #[error("Invalid payload{}: {message}", format_context(.context))]
    InvalidPayload { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues.
    #[error("Internal cipher error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
