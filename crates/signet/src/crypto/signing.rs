//! Ed25519 detached signing and verification.
//!
//! Signatures are produced over canonical payload bytes and carried as
//! base64url text with the same `=` suffix used for keys. Verification
//! never errors on a mismatch — it returns `false` — because a failed
//! check is an expected outcome, not an exceptional one.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use super::keys::{decode_key_text, encode_key_text};

/// Sign a message with an Ed25519 signing key.
pub fn sign(signing_key: &SigningKey, message: &[u8]) -> Signature {
    signing_key.sign(message)
}

/// Verify an Ed25519 signature against a public key and message.
pub fn verify(verifying_key: &VerifyingKey, message: &[u8], signature: &Signature) -> bool {
    verifying_key.verify(message, signature).is_ok()
}

/// Sign a message and return the signature in text form.
pub fn sign_to_text(signing_key: &SigningKey, message: &[u8]) -> String {
    encode_key_text(&sign(signing_key, message).to_bytes())
}

/// Verify a text-encoded signature. Malformed text verifies as `false`.
pub fn verify_from_text(verifying_key: &VerifyingKey, message: &[u8], sig_text: &str) -> bool {
    let Ok(sig_bytes) = decode_key_text(sig_text) else {
        return false;
    };
    let Ok(sig_array) = <[u8; 64]>::try_from(sig_bytes.as_slice()) else {
        return false;
    };
    verify(verifying_key, message, &Signature::from_bytes(&sig_array))
}
