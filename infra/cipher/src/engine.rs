use aead::Nonce;
use aead::inout::InOutBuf;
use getrandom::fill;
use std::sync::Arc;

use crate::builder::CipherBuilder;
use crate::error::{CipherError, CipherErrorExt};
use crate::types::{
    Aes, CipherAlgorithm, HEADER_LEN, MIN_TOKEN_LEN, NONCE_LEN, TOKEN_VERSION_V1, Token,
};

#[allow(unreachable_pub)]
#[derive(Debug)]
pub struct CipherInner<C = Aes>
where
    C: CipherAlgorithm,
{
    pub algorithm: C,
    pub aad: Vec<u8>,
}

/// Authenticated encryption of short strings, such as cookie values.
///
/// `Cipher` wraps its state in an [`Arc`], so clones are cheap and share the same key.
///
/// ### Example
/// ```rust
/// use crumb_cipher::prelude::*;
///
/// # fn main() -> Result<(), CipherError> {
/// let cipher = Cipher::<Aes>::new("0123456789abcdef")?;
///
/// let token = cipher.encrypt("session-42")?;
/// assert_ne!(token, "session-42");
/// assert_eq!(cipher.decrypt(&token)?, "session-42");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Cipher<C = Aes>
where
    C: CipherAlgorithm,
{
    pub(crate) inner: Arc<CipherInner<C>>,
}

impl<C: CipherAlgorithm> Clone for Cipher<C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<C> Cipher<C>
where
    C: CipherAlgorithm,
{
    #[must_use]
    pub fn builder() -> CipherBuilder<C> {
        CipherBuilder::<C>::new()
    }

    /// Builds a cipher from a textual key with no associated context.
    ///
    /// # Errors
    /// Returns [`CipherError::InvalidConfiguration`] if the key is empty.
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, CipherError> {
        Self::builder().key(key)?.build()
    }

    #[inline]
    fn next_nonce() -> Nonce<C> {
        let mut nonce = Nonce::<C>::default();
        fill(&mut nonce).expect("System RNG unavailable for nonce generation");
        nonce
    }

    /// Encrypts a string into an unpadded URL-safe base64 token.
    ///
    /// Every call uses a fresh random nonce, so encrypting the same plaintext twice yields
    /// different tokens.
    ///
    /// # Errors
    /// Returns [`CipherError::Encryption`] if the AEAD operation fails.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        self.seal_bytes(plaintext.as_bytes()).map(|token| token.encode())
    }

    /// Decrypts a token produced by [`Cipher::encrypt`].
    ///
    /// # Errors
    /// * [`CipherError::Encoding`] if the token is not base64.
    /// * [`CipherError::InvalidPayload`] if the token is truncated or has an unknown version.
    /// * [`CipherError::Decryption`] if the key, context or token does not authenticate.
    /// * [`CipherError::Utf8`] if the plaintext is not valid UTF-8.
    pub fn decrypt(&self, token: &str) -> Result<String, CipherError> {
        let token = Token::decode(token)?;
        let bytes = self.open_bytes(&token)?;
        String::from_utf8(bytes).context("Decrypted cookie value")
    }

    /// Encrypts raw bytes into a [`Token`].
    ///
    /// # Errors
    /// Returns [`CipherError::Encryption`] if the AEAD operation fails.
    pub fn seal_bytes(&self, data: impl AsRef<[u8]>) -> Result<Token, CipherError> {
        let data = data.as_ref();
        let nonce = Self::next_nonce();

        let mut buf = Vec::with_capacity(MIN_TOKEN_LEN + data.len());
        buf.push(TOKEN_VERSION_V1);
        buf.extend_from_slice(&nonce);
        buf.extend_from_slice(data);

        let (_header, rest) = buf.split_at_mut(HEADER_LEN);
        let (_nonce, body) = rest.split_at_mut(NONCE_LEN);
        let in_out = InOutBuf::from(body);

        let tag = self
            .inner
            .algorithm
            .encrypt_inout_detached(&nonce, &self.inner.aad, in_out)
            .map_err(|_| CipherError::Encryption {
                message: "Encryption failed".into(),
                context: Some("AEAD encryption failed".into()),
            })?;

        buf.extend_from_slice(tag.as_slice());
        Ok(Token::from(buf))
    }

    /// Decrypts a [`Token`] back into raw bytes.
    ///
    /// # Errors
    /// * [`CipherError::InvalidPayload`] if the token is malformed.
    /// * [`CipherError::Decryption`] if authentication fails.
    pub fn open_bytes(&self, token: &Token) -> Result<Vec<u8>, CipherError> {
        if token.data.len() < MIN_TOKEN_LEN {
            return Err(CipherError::InvalidPayload {
                message: format!(
                    "Token too short ({} bytes). Expected at least {MIN_TOKEN_LEN} bytes",
                    token.data.len()
                )
                .into(),
                context: None,
            });
        }

        let version = token.data[0];
        if version != TOKEN_VERSION_V1 {
            return Err(CipherError::InvalidPayload {
                message: "Unsupported token version".into(),
                context: Some(format!("version={version}").into()),
            });
        }

        let (_header, nonce_slice, ciphertext, tag_slice) = token.split();

        let nonce = nonce_slice.try_into().map_err(|_| CipherError::Decryption {
            message: "Invalid nonce length".into(),
            context: None,
        })?;

        let tag = tag_slice.try_into().map_err(|_| CipherError::Decryption {
            message: "Invalid tag length".into(),
            context: None,
        })?;

        let mut buf = ciphertext.to_vec();
        let in_out = InOutBuf::from(&mut buf[..]);

        self.inner.algorithm.decrypt_inout_detached(&nonce, &self.inner.aad, in_out, &tag).map_err(
            |_| CipherError::Decryption {
                message: "Decryption failed".into(),
                context: Some("AEAD authentication failed".into()),
            },
        )?;

        Ok(buf)
    }
}
