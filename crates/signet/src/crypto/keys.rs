//! Ed25519 key pair generation and text encoding.
//!
//! A `SignetKeyPair` is the ownership credential for one entity. The
//! private key is exported in the 64-byte keypair form (seed followed by
//! the public key); the public key is the 32-byte verifying key. Both are
//! carried as base64url text with a mandatory trailing `=`.

use ed25519_dalek::{SigningKey, VerifyingKey};
use zeroize::Zeroize;

use crate::error::{Result, SignetError};

/// Encode raw key or signature bytes as base64url text with the `=` suffix.
pub(crate) fn encode_key_text(bytes: &[u8]) -> String {
    let mut text =
        base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes);
    text.push('=');
    text
}

/// Decode base64url key or signature text. The trailing `=` must be present.
pub(crate) fn decode_key_text(text: &str) -> Result<Vec<u8>> {
    let stripped = text
        .strip_suffix('=')
        .ok_or_else(|| SignetError::DecodeError("key text must end with '='".into()))?;
    base64::Engine::decode(
        &base64::engine::general_purpose::URL_SAFE_NO_PAD,
        stripped,
    )
    .map_err(|e| SignetError::DecodeError(format!("invalid base64url key text: {e}")))
}

/// An Ed25519 key pair for signing entity mutations.
///
/// The signing key is zeroized on drop to prevent private key leakage.
pub struct SignetKeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl SignetKeyPair {
    /// Generate a new random key pair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut rand::thread_rng());
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Build a key pair from exported text encodings.
    ///
    /// Produces a new value; nothing is overwritten in place. Fails with
    /// `DecodeError` if either text is malformed, the wrong length, or the
    /// public key does not belong to the private key.
    pub fn import(pub_text: &str, priv_text: &str) -> Result<Self> {
        let pub_bytes = decode_key_text(pub_text)?;
        let mut priv_bytes = decode_key_text(priv_text)?;

        let keypair_bytes: [u8; 64] = priv_bytes.as_slice().try_into().map_err(|_| {
            SignetError::DecodeError(format!(
                "private key must be 64 bytes, got {}",
                priv_bytes.len()
            ))
        })?;
        priv_bytes.zeroize();

        let signing_key = SigningKey::from_keypair_bytes(&keypair_bytes)
            .map_err(|e| SignetError::DecodeError(format!("invalid private key: {e}")))?;
        let verifying_key = signing_key.verifying_key();

        if pub_bytes != verifying_key.to_bytes() {
            return Err(SignetError::DecodeError(
                "public key does not match private key".into(),
            ));
        }

        Ok(Self {
            signing_key,
            verifying_key,
        })
    }

    /// Reconstruct a verifying key from its text encoding.
    pub fn verifying_key_from_text(text: &str) -> Result<VerifyingKey> {
        let bytes = decode_key_text(text)?;
        let key_bytes: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            SignetError::DecodeError(format!("public key must be 32 bytes, got {}", bytes.len()))
        })?;
        VerifyingKey::from_bytes(&key_bytes)
            .map_err(|e| SignetError::DecodeError(format!("invalid public key: {e}")))
    }

    /// Return the public key as text.
    pub fn public_key_text(&self) -> String {
        encode_key_text(&self.verifying_key.to_bytes())
    }

    /// Return the private key as text. Handle with care.
    pub fn private_key_text(&self) -> String {
        encode_key_text(&self.signing_key.to_keypair_bytes())
    }

    /// Export the key pair as `(public, private)` text encodings.
    pub fn export_keys(&self) -> (String, String) {
        (self.public_key_text(), self.private_key_text())
    }

    /// Return a reference to the signing key.
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Return the verifying (public) key.
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }
}

impl Drop for SignetKeyPair {
    fn drop(&mut self) {
        // SigningKey stores bytes internally; zeroize via conversion
        let mut bytes = self.signing_key.to_bytes();
        bytes.zeroize();
    }
}

impl std::fmt::Debug for SignetKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignetKeyPair")
            .field("public_key", &self.public_key_text())
            .finish_non_exhaustive()
    }
}
