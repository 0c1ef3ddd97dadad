use aead::{AeadInOut, KeyInit};
use aes_gcm::Aes256Gcm;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chacha20poly1305::ChaCha20Poly1305;

use crate::error::{CipherError, CipherErrorExt};

// --- Aliases ---

pub type Aes = Aes256Gcm;
pub type ChaCha = ChaCha20Poly1305;

pub trait CipherAlgorithm: AeadInOut + KeyInit + Send + Sync + 'static {}
impl<T: AeadInOut + KeyInit + Send + Sync + 'static> CipherAlgorithm for T {}

// --- Token format constants ---

/// Token header version.
pub(crate) const TOKEN_VERSION_V1: u8 = 1;

/// Header layout: `[version: u8]`
pub(crate) const HEADER_LEN: usize = 1;

/// AEAD nonce length (96-bit).
pub(crate) const NONCE_LEN: usize = 12;

/// AEAD tag length (128-bit).
pub(crate) const TAG_LEN: usize = 16;

pub(crate) const MIN_TOKEN_LEN: usize = HEADER_LEN + NONCE_LEN + TAG_LEN;

/// A decoded, still encrypted, token.
///
/// ```text
/// [V(1)][NONCE(12)][CIPHERTEXT(N)][TAG(16)]
/// ```
///
/// On the wire the bytes travel as unpadded URL-safe base64, which needs no percent-encoding
/// inside a cookie value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub(crate) data: Vec<u8>,
}

impl Token {
    /// Decodes a textual token.
    ///
    /// # Errors
    /// * [`CipherError::Encoding`] if the text is not URL-safe base64.
    /// * [`CipherError::InvalidPayload`] if the decoded bytes are too short to hold a token.
    pub fn decode(text: &str) -> Result<Self, CipherError> {
        let data = URL_SAFE_NO_PAD.decode(text.trim()).context("Decoding cipher token")?;

        if data.len() < MIN_TOKEN_LEN {
            return Err(CipherError::InvalidPayload {
                message: format!(
                    "Token too short ({} bytes). Expected at least {MIN_TOKEN_LEN} bytes",
                    data.len()
                )
                .into(),
                context: None,
            });
        }

        Ok(Self { data })
    }

    /// Encodes the token as unpadded URL-safe base64.
    #[must_use]
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.data)
    }

    /// Returns the token format version.
    #[must_use]
    pub fn version(&self) -> Option<u8> {
        self.data.first().copied()
    }

    /// Splits the token into `(header, nonce, ciphertext, tag)`.
    #[must_use]
    pub fn split(&self) -> (&[u8], &[u8], &[u8], &[u8]) {
        let (header, rest) = self.data.split_at(HEADER_LEN);
        let (nonce, rest) = rest.split_at(NONCE_LEN);
        let (ciphertext, tag) = rest.split_at(rest.len().saturating_sub(TAG_LEN));
        (header, nonce, ciphertext, tag)
    }

    /// Returns the raw token bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl AsRef<[u8]> for Token {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for Token {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}
