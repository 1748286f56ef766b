//! Canonical payloads and signed envelopes.
//!
//! The registry verifies signatures by re-serializing the payload it
//! received, so signature validity depends on byte-exact reproduction of
//! the JSON the signer produced. The canonical form is fixed here once:
//! struct declaration order is the field order, serialization is compact
//! (no whitespace), and empty `xids`/`channels` lists are omitted
//! entirely. Signer and verifier both go through [`Payload::canonical_json`];
//! there is no second serialization path to drift.

use serde::{Deserialize, Serialize};

use crate::crypto::keys::SignetKeyPair;
use crate::crypto::signing;
use crate::error::{Result, SignetError};
use crate::time;

/// An external identifier: `nstype:ns:name`, unique within its namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Xid {
    pub nstype: String,
    pub ns: String,
    pub name: String,
}

impl Xid {
    pub fn new(
        ns_type: impl Into<String>,
        ns_name: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            nstype: ns_type.into(),
            ns: ns_name.into(),
            name: name.into(),
        }
    }

    /// Parse the `nstype:ns:name` string form.
    pub fn parse(text: &str) -> Result<Self> {
        let mut parts = text.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(nstype), Some(ns), Some(name)) if !nstype.is_empty() && !ns.is_empty() => {
                Ok(Self::new(nstype, ns, name))
            }
            _ => Err(SignetError::ParamInvalid(format!(
                "XID must have the form nstype:ns:name, got '{text}'"
            ))),
        }
    }
}

impl std::fmt::Display for Xid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.nstype, self.ns, self.name)
    }
}

/// An endpoint descriptor: `chtype#version#endpoint`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub chtype: String,
    pub version: String,
    pub endpoint: String,
}

impl Channel {
    pub fn new(
        ch_type: impl Into<String>,
        version: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            chtype: ch_type.into(),
            version: version.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Parse the `chtype#version#endpoint` string form.
    pub fn parse(text: &str) -> Result<Self> {
        let mut parts = text.splitn(3, '#');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(chtype), Some(version), Some(endpoint)) if !chtype.is_empty() => {
                Ok(Self::new(chtype, version, endpoint))
            }
            _ => Err(SignetError::ParamInvalid(format!(
                "channel must have the form chtype#version#endpoint, got '{text}'"
            ))),
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}#{}", self.chtype, self.version, self.endpoint)
    }
}

/// The `data` section of a payload: what the mutation asserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadData {
    pub guid: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub xids: Vec<Xid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<Channel>,
}

/// The `verify` section of a payload: who signs it, when, and after what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadVerify {
    pub verify_key: String,
    pub sign_time: String,
    pub prev_sign: String,
}

/// A canonical mutation payload. Field order is the wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub data: PayloadData,
    pub verify: PayloadVerify,
}

impl Payload {
    /// Build a payload for a mutation of `guid`, signed-to-be by `key_pair`.
    ///
    /// `prev_sign` is the empty string for the first-ever mutation.
    /// `sign_time` is stamped at build time.
    pub fn build(
        guid: &str,
        key_pair: &SignetKeyPair,
        prev_sign: &str,
        xids: Vec<Xid>,
        channels: Vec<Channel>,
    ) -> Self {
        Self {
            data: PayloadData {
                guid: guid.to_string(),
                xids,
                channels,
            },
            verify: PayloadVerify {
                verify_key: key_pair.public_key_text(),
                sign_time: time::now_iso8601(),
                prev_sign: prev_sign.to_string(),
            },
        }
    }

    /// Serialize to the canonical signable form.
    pub fn canonical_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SignetError::Serialization(e.to_string()))
    }

    /// Sign the canonical bytes, producing a signed envelope.
    pub fn sign(self, key_pair: &SignetKeyPair) -> Result<SignedPayload> {
        let sign = signing::sign_to_text(key_pair.signing_key(), self.canonical_json()?.as_bytes());
        Ok(SignedPayload {
            payload: self,
            sign,
        })
    }
}

/// A payload plus the detached signature over its canonical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPayload {
    pub payload: Payload,
    pub sign: String,
}

impl SignedPayload {
    /// Serialize to canonical form (also the message for org/rekey signing).
    pub fn canonical_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SignetError::Serialization(e.to_string()))
    }

    /// Verify the signature against the `verify_key` embedded in the payload.
    ///
    /// Re-serializes the payload; any drift from the signer's bytes fails.
    pub fn verify(&self) -> bool {
        let Ok(verifying_key) =
            SignetKeyPair::verifying_key_from_text(&self.payload.verify.verify_key)
        else {
            return false;
        };
        let Ok(canonical) = self.payload.canonical_json() else {
            return false;
        };
        signing::verify_from_text(&verifying_key, canonical.as_bytes(), &self.sign)
    }
}

/// The double-signed rekey envelope: the new key signs the payload, the
/// outgoing key countersigns the whole signed payload to authorize the
/// handoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RekeyPayload {
    pub signed_payload: SignedPayload,
    pub old_sign: String,
}

impl RekeyPayload {
    /// Countersign `signed_payload` with the outgoing ownership key.
    pub fn new(signed_payload: SignedPayload, old_key_pair: &SignetKeyPair) -> Result<Self> {
        let old_sign = signing::sign_to_text(
            old_key_pair.signing_key(),
            signed_payload.canonical_json()?.as_bytes(),
        );
        Ok(Self {
            signed_payload,
            old_sign,
        })
    }

    /// Verify the outgoing owner's countersignature.
    pub fn verify_old_sign(&self, old_verkey_text: &str) -> bool {
        let Ok(verifying_key) = SignetKeyPair::verifying_key_from_text(old_verkey_text) else {
            return false;
        };
        let Ok(canonical) = self.signed_payload.canonical_json() else {
            return false;
        };
        signing::verify_from_text(&verifying_key, canonical.as_bytes(), &self.old_sign)
    }
}
