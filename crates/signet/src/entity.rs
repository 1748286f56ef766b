//! Local mirror of a registry entity.
//!
//! An [`Entity`] holds the last-known registry state for one GUID. It is
//! mutated only by [`Entity::refresh`], which overwrites every field from
//! a registry record — it never merges. Staleness is detected reactively:
//! a mutation attempt with a superseded key or `prev_sign` is rejected by
//! the registry, and the mirror stays as it was.

use serde::{Deserialize, Serialize};

/// The record shape the registry returns for an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub guid: String,
    pub verkey: String,
    pub xid: Option<String>,
    pub channel: Option<String>,
    pub signature: String,
    #[serde(rename = "signedAt")]
    pub signed_at: String,
    #[serde(rename = "entityJSON")]
    pub entity_json: String,
}

/// Local mirror of one registry entity.
#[derive(Debug, Clone)]
pub struct Entity {
    /// GUID, assigned at creation, immutable thereafter.
    pub guid: String,
    /// The public key the registry currently trusts for this entity.
    pub verkey: String,
    /// External identifier in `nstype:ns:name` form, if any.
    pub xid: Option<String>,
    /// Endpoint descriptor in `chtype#version#endpoint` form, if any.
    pub channel: Option<String>,
    /// Signature of the last registry-accepted mutation (chain anchor).
    /// Empty until the first accepted mutation is reflected here.
    pub prev_sign: String,
    /// Timestamp of the last accepted mutation.
    pub signed_at: Option<String>,
    /// Raw registry JSON blob, passed through opaquely.
    pub entity_json: Option<String>,
}

impl Entity {
    /// Create a mirror for `guid` before any registry state is known.
    pub fn new(guid: impl Into<String>, verkey: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            verkey: verkey.into(),
            xid: None,
            channel: None,
            prev_sign: String::new(),
            signed_at: None,
            entity_json: None,
        }
    }

    /// Overwrite every field from a registry record. The GUID does not
    /// change: records are only ever applied to the entity they describe.
    pub fn refresh(&mut self, record: &RegistryRecord) {
        self.verkey = record.verkey.clone();
        self.xid = record.xid.clone();
        self.channel = record.channel.clone();
        self.prev_sign = record.signature.clone();
        self.signed_at = Some(record.signed_at.clone());
        self.entity_json = Some(record.entity_json.clone());
    }
}
