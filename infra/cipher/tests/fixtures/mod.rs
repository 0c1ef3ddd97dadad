use crumb_cipher::prelude::*;

/// Key shaped like the ones cookies derive: 16 hex characters.
pub const COOKIE_KEY: &str = "2c26b46b68ffc68f";

/// Builds the default AES cipher used across the integration tests.
/// # Panics
/// * If the cipher cannot be built.
#[must_use]
pub fn setup_cipher() -> Cipher {
    Cipher::builder().context("tok").key(COOKIE_KEY).unwrap().build().expect("Cipher setup failed")
}
