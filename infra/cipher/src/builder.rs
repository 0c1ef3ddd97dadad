use crate::engine::{Cipher, CipherInner};
use crate::error::CipherError;
use crate::types::{Aes, CipherAlgorithm};
use aead::Key;
use hkdf::Hkdf;
use private::Sealed;
use sha2::Sha256;
use std::marker::PhantomData;
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// HKDF salt separating cookie keys from any other use of the same secret.
const KEY_SALT: &[u8] = b"crumb-cipher:v1";
const KEY_INFO: &[u8] = b"v1_cookie:";

#[derive(Debug, Default, ZeroizeOnDrop)]
pub struct NoKey;
#[derive(Debug, Zeroize, ZeroizeOnDrop)]
pub struct WithKey {
    key: [u8; 32],
}

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoKey {}
impl Sealed for WithKey {}

/// A builder for [`Cipher`].
///
/// Raw key material is zeroed as soon as the builder is dropped or consumed.
#[allow(private_bounds)]
#[derive(Debug, Zeroize, ZeroizeOnDrop)]
pub struct CipherBuilder<C: CipherAlgorithm = Aes, K: Sealed + ZeroizeOnDrop = NoKey> {
    #[zeroize(skip)]
    _cipher: PhantomData<C>,
    aad: Vec<u8>,
    key: K,
}

impl<C: CipherAlgorithm> Default for CipherBuilder<C> {
    fn default() -> Self {
        Self { _cipher: PhantomData, aad: Vec::new(), key: NoKey }
    }
}

impl<C: CipherAlgorithm> CipherBuilder<C> {
    #[must_use = "Builder must be given a key before use"]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the 256-bit cipher key from a textual key with HKDF-SHA256.
    ///
    /// Any non-empty input is accepted; cookies pass a 16 character hex digest of their alias.
    ///
    /// # Errors
    /// Returns [`CipherError::InvalidConfiguration`] if the key is empty or expansion fails.
    pub fn key(
        mut self,
        secret: impl AsRef<[u8]>,
    ) -> Result<CipherBuilder<C, WithKey>, CipherError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(CipherError::InvalidConfiguration {
                message: "Cipher key cannot be empty".into(),
                context: None,
            });
        }

        let hk = Hkdf::<Sha256>::new(Some(KEY_SALT), secret);
        let mut key = [0u8; 32];
        hk.expand(KEY_INFO, &mut key).map_err(|_| CipherError::InvalidConfiguration {
            message: "HKDF expansion failed".into(),
            context: None,
        })?;

        Ok(CipherBuilder {
            _cipher: PhantomData,
            aad: std::mem::take(&mut self.aad),
            key: WithKey { key },
        })
    }
}

#[allow(private_bounds)]
impl<C: CipherAlgorithm, K: Sealed + ZeroizeOnDrop> CipherBuilder<C, K> {
    /// Binds every token to `context` as associated data.
    ///
    /// Tokens sealed under one context fail to open under another.
    #[must_use]
    pub fn context(mut self, context: impl AsRef<[u8]>) -> Self {
        self.aad = context.as_ref().to_vec();
        self
    }
}

impl<C: CipherAlgorithm> CipherBuilder<C, WithKey> {
    /// Finalizes the cipher and zeroes the builder.
    ///
    /// # Errors
    /// Returns [`CipherError::InvalidConfiguration`] if the key does not fit the algorithm.
    pub fn build(mut self) -> Result<Cipher<C>, CipherError> {
        let key = Key::<C>::try_from(&self.key.key[..]).map_err(|_| {
            CipherError::InvalidConfiguration {
                message: format!("Invalid key length {}, must be 32 bytes", self.key.key.len())
                    .into(),
                context: None,
            }
        })?;

        let inner = CipherInner { algorithm: C::new(&key), aad: std::mem::take(&mut self.aad) };
        self.zeroize();

        Ok(Cipher { inner: Arc::new(inner) })
    }
}
