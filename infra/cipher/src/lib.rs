//! Authenticated encryption for cookie values.
//!
//! [`Cipher`] turns a plaintext string into an opaque, URL-safe token and back. Tokens are
//! authenticated: a modified, truncated or foreign token never decrypts to a wrong plaintext, it
//! fails with [`CipherError::Decryption`] or [`CipherError::InvalidPayload`].
//!
//! ## Token Format
//!
//! ```text
//! base64url([V(1)][NONCE(12)][CIPHERTEXT(N)][TAG(16)])
//! ```
//!
//! ## Keys
//!
//! The textual key passed to [`CipherBuilder::key`] is stretched to 256 bits with HKDF-SHA256.
//! Two ciphers built from the same key and context always interoperate.
//!
//! ## Nonce Policy
//!
//! Every encryption draws a random 96-bit nonce from the system RNG.
//!
//! ## Example
//! ```rust
//! use crumb_cipher::prelude::*;
//!
//! # fn main() -> Result<(), CipherError> {
//! let cipher = Cipher::<ChaCha>::builder().context("cookie:tok").key("6a1f0c3b9e2d4a57")?.build()?;
//!
//! let token = cipher.encrypt("abc")?;
//! assert_eq!(cipher.decrypt(&token)?, "abc");
//! # Ok(())
//! # }
//! ```

mod builder;
mod engine;
mod error;
mod types;

pub use builder::CipherBuilder;
pub use engine::Cipher;
pub use error::{CipherError, CipherErrorExt};
pub use types::Token;

pub mod prelude {
    pub use crate::engine::Cipher;
    pub use crate::error::{CipherError, CipherErrorExt};
    pub use crate::types::{Aes, ChaCha, Token};
}

pub mod algorithms {
    pub use crate::types::{Aes, ChaCha, CipherAlgorithm};
}
