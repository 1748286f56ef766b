//! Key sets — the ownership credential container for one entity.
//!
//! A key set binds one [`SignetKeyPair`] to the role of ownership key. It
//! is created when an entity is created, assigned, or rekeyed, and is
//! superseded — never mutated — on rekey.

use crate::crypto::keys::SignetKeyPair;
use crate::error::Result;

/// The ownership key set for one entity.
#[derive(Debug)]
pub struct KeySet {
    ownership_key_pair: SignetKeyPair,
}

impl KeySet {
    /// Create a key set with a fresh ownership key pair.
    pub fn new() -> Self {
        Self {
            ownership_key_pair: SignetKeyPair::generate(),
        }
    }

    /// Build a key set from key material shared out-of-band by another
    /// agent. Fails with `DecodeError` on malformed text.
    pub fn import(pub_text: &str, priv_text: &str) -> Result<Self> {
        Ok(Self {
            ownership_key_pair: SignetKeyPair::import(pub_text, priv_text)?,
        })
    }

    /// Return the ownership key pair.
    pub fn ownership_key_pair(&self) -> &SignetKeyPair {
        &self.ownership_key_pair
    }

    /// Export the ownership key pair as `(public, private)` text, for
    /// handing to a co-owning agent.
    pub fn export_ownership_key_pair(&self) -> (String, String) {
        self.ownership_key_pair.export_keys()
    }
}

impl Default for KeySet {
    fn default() -> Self {
        Self::new()
    }
}
