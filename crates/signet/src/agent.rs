//! The agent: key chain, organization credentials, and entity lifecycle.
//!
//! An agent can sign on behalf of an entity only while its key chain
//! holds the ownership key set for that GUID. Mutating operations take
//! `&mut self`, so one agent never interleaves two signature computations
//! for the same key set; the cross-agent stale-owner race remains and
//! surfaces as `RegistryRejected`.
//!
//! On any failed operation neither the key chain nor the entity mirror is
//! touched — a rejection is a normal outcome of a lost race or a stale
//! key, and the caller's next move is usually a fresh fetch.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;

use crate::client::Transport;
use crate::crypto::keys::SignetKeyPair;
use crate::crypto::signing;
use crate::entity::{Entity, RegistryRecord};
use crate::error::{Result, SignetError};
use crate::keyset::KeySet;
use crate::payload::{Channel, Payload, RekeyPayload, SignedPayload, Xid};

/// Options for [`Agent::create_entity`].
#[derive(Debug, Default)]
pub struct CreateOpts {
    /// XID to register together with the new entity.
    pub xid: Option<Xid>,
}

/// A local credential holder managing entities on a remote registry.
pub struct Agent {
    transport: Arc<dyn Transport>,
    key_chain: HashMap<String, KeySet>,
    org_keys: Option<SignetKeyPair>,
}

impl Agent {
    /// Create an agent speaking to the registry behind `transport`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            key_chain: HashMap::new(),
            org_keys: None,
        }
    }

    /// Generate a fresh version-4 GUID from cryptographically random bytes.
    fn gen_guid() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Set the organization credentials required by the registry for
    /// entity creation and mutation.
    ///
    /// Fails fast on empty or malformed key text; no network call is made.
    pub fn set_org_keys(&mut self, pub_text: &str, priv_text: &str) -> Result<()> {
        if pub_text.is_empty() {
            return Err(SignetError::ParamMissing("org public key".into()));
        }
        if priv_text.is_empty() {
            return Err(SignetError::ParamMissing("org private key".into()));
        }
        let keys = SignetKeyPair::import(pub_text, priv_text)
            .map_err(|e| SignetError::ParamInvalid(format!("org keys: {e}")))?;
        self.org_keys = Some(keys);
        Ok(())
    }

    /// Add an ownership key set to the key chain, replacing any previous
    /// key set for the GUID.
    pub fn add_key_set(&mut self, guid: impl Into<String>, key_set: KeySet) {
        self.key_chain.insert(guid.into(), key_set);
    }

    /// The ownership key set for `guid`, if this agent holds one.
    pub fn ownership_key_set(&self, guid: &str) -> Option<&KeySet> {
        self.key_chain.get(guid)
    }

    /// The ownership key pair for `guid`, if this agent holds one.
    pub fn ownership_key_pair(&self, guid: &str) -> Option<&SignetKeyPair> {
        self.key_chain.get(guid).map(KeySet::ownership_key_pair)
    }

    /// Sign `signed` with the organization key and produce the
    /// `X-Org-Key` / `X-Org-Sign` request headers.
    fn org_headers(&self, signed: &SignedPayload) -> Result<Vec<(String, String)>> {
        let org = self.org_keys.as_ref().ok_or(SignetError::OrgKeyNotSet)?;
        let org_sign =
            signing::sign_to_text(org.signing_key(), signed.canonical_json()?.as_bytes());
        Ok(vec![
            ("X-Org-Key".to_string(), org.public_key_text()),
            ("X-Org-Sign".to_string(), org_sign),
        ])
    }

    fn parse_record(data: serde_json::Value) -> Result<RegistryRecord> {
        serde_json::from_value(data).map_err(|e| SignetError::Serialization(e.to_string()))
    }

    /// Create a new entity on the registry.
    ///
    /// Generates a GUID and a fresh key set, signs a first payload with
    /// `prev_sign = ""`, attaches the organization signature, and submits.
    /// The key set enters the key chain only after the registry accepts.
    pub async fn create_entity(&mut self, opts: CreateOpts) -> Result<Entity> {
        if self.org_keys.is_none() {
            return Err(SignetError::OrgKeyNotSet);
        }
        let guid = Self::gen_guid();
        log::debug!("create_entity: guid={guid}");

        let key_set = KeySet::new();
        let xids = opts.xid.into_iter().collect();
        let signed = Payload::build(&guid, key_set.ownership_key_pair(), "", xids, vec![])
            .sign(key_set.ownership_key_pair())?;
        let headers = self.org_headers(&signed)?;
        let params = json!({ "signed_payload": signed.canonical_json()? });

        let resp = self.transport.do_post("/entity/", &params, &headers).await?;
        if resp.status != 200 {
            log::debug!("create_entity rejected: status={}", resp.status);
            return Err(SignetError::registry(resp.status, &resp.data));
        }
        let record = Self::parse_record(resp.data)?;

        let mut entity = Entity::new(&guid, key_set.ownership_key_pair().public_key_text());
        self.add_key_set(&guid, key_set);
        entity.refresh(&record);
        log::debug!("create_entity: accepted, prev_sign={}", entity.prev_sign);
        Ok(entity)
    }

    /// Submit an update payload for `entity` and refresh it on acceptance.
    async fn submit_update(
        &self,
        entity: &mut Entity,
        xids: Vec<Xid>,
        channels: Vec<Channel>,
    ) -> Result<()> {
        let key_pair = self
            .ownership_key_pair(&entity.guid)
            .ok_or_else(|| SignetError::NotFound(format!("no ownership key for {}", entity.guid)))?;

        let signed = Payload::build(&entity.guid, key_pair, &entity.prev_sign, xids, channels)
            .sign(key_pair)?;
        let headers = self.org_headers(&signed)?;
        let params = json!({ "signed_payload": signed.canonical_json()? });
        let path = format!("/entity/update?guid={}", entity.guid);

        let resp = self.transport.do_patch(&path, &params, &headers).await?;
        if resp.status != 200 {
            log::debug!("update rejected for {}: status={}", entity.guid, resp.status);
            return Err(SignetError::registry(resp.status, &resp.data));
        }
        entity.refresh(&Self::parse_record(resp.data)?);
        Ok(())
    }

    /// Set an XID for `entity`, re-submitting its existing channel so a
    /// partial update never drops the other field.
    pub async fn set_xid(
        &mut self,
        entity: &mut Entity,
        ns_type: &str,
        ns_name: &str,
        name: &str,
    ) -> Result<()> {
        log::debug!("set_xid: guid={} xid={ns_type}:{ns_name}:{name}", entity.guid);
        let xid = Xid::new(ns_type, ns_name, name);
        let channels = match &entity.channel {
            Some(channel) => vec![Channel::parse(channel)?],
            None => vec![],
        };
        self.submit_update(entity, vec![xid], channels).await
    }

    /// Set a channel for `entity`, re-submitting its existing XID so a
    /// partial update never drops the other field.
    pub async fn set_channel(
        &mut self,
        entity: &mut Entity,
        ch_type: &str,
        version: &str,
        endpoint: &str,
    ) -> Result<()> {
        log::debug!(
            "set_channel: guid={} channel={ch_type}#{version}#{endpoint}",
            entity.guid
        );
        let channel = Channel::new(ch_type, version, endpoint);
        let xids = match &entity.xid {
            Some(xid) => vec![Xid::parse(xid)?],
            None => vec![],
        };
        self.submit_update(entity, xids, vec![channel]).await
    }

    /// Transfer `entity` to a brand-new ownership key.
    ///
    /// The new key signs the payload; the outgoing key countersigns the
    /// whole signed payload to prove the previous owner authorized the
    /// handoff. The key chain is updated only after the registry accepts;
    /// on failure the old key set stays in place.
    pub async fn rekey(&mut self, entity: &mut Entity) -> Result<()> {
        log::debug!("rekey: guid={}", entity.guid);
        let old_key_pair = self
            .ownership_key_pair(&entity.guid)
            .ok_or_else(|| SignetError::NotFound(format!("no ownership key for {}", entity.guid)))?;
        if entity.prev_sign.is_empty() {
            return Err(SignetError::InvalidPreviousSign);
        }

        let new_key_set = KeySet::new();
        let signed = Payload::build(
            &entity.guid,
            new_key_set.ownership_key_pair(),
            &entity.prev_sign,
            vec![],
            vec![],
        )
        .sign(new_key_set.ownership_key_pair())?;
        let rekey = RekeyPayload::new(signed, old_key_pair)?;

        let params = json!({
            "rekey_payload": serde_json::to_string(&rekey)
                .map_err(|e| SignetError::Serialization(e.to_string()))?
        });
        let path = format!("/entity/rekey?guid={}", entity.guid);

        let resp = self.transport.do_patch(&path, &params, &[]).await?;
        if resp.status != 200 {
            log::debug!("rekey rejected for {}: status={}", entity.guid, resp.status);
            return Err(SignetError::registry(resp.status, &resp.data));
        }
        let record = Self::parse_record(resp.data)?;
        self.add_key_set(&entity.guid, new_key_set);
        entity.refresh(&record);
        Ok(())
    }

    /// Take co-ownership of an entity created by another agent, from key
    /// material shared out-of-band. Local only — no network call. Both
    /// agents can sign valid mutations until one of them rekeys.
    pub fn assign_entity(
        &mut self,
        entity: &Entity,
        pub_text: &str,
        priv_text: &str,
    ) -> Result<()> {
        log::debug!("assign_entity: guid={}", entity.guid);
        let key_set = KeySet::import(pub_text, priv_text)?;
        self.add_key_set(&entity.guid, key_set);
        Ok(())
    }

    /// Fetch an entity by GUID.
    pub async fn fetch_entity(&self, guid: &str) -> Result<Entity> {
        log::debug!("fetch_entity: guid={guid}");
        let resp = self
            .transport
            .do_get("/entity", &[("guid".to_string(), guid.to_string())])
            .await?;
        if resp.status != 200 {
            return Err(SignetError::registry(resp.status, &resp.data));
        }
        let record = Self::parse_record(resp.data)?;
        let mut entity = Entity::new(&record.guid, &record.verkey);
        entity.refresh(&record);
        Ok(entity)
    }

    /// Fetch an entity by XID.
    pub async fn fetch_entity_by_xid(
        &self,
        ns_type: &str,
        ns_name: &str,
        name: &str,
    ) -> Result<Entity> {
        let xid = Xid::new(ns_type, ns_name, name).to_string();
        log::debug!("fetch_entity_by_xid: xid={xid}");
        let resp = self
            .transport
            .do_get("/entity", &[("xid".to_string(), xid)])
            .await?;
        if resp.status != 200 {
            return Err(SignetError::registry(resp.status, &resp.data));
        }
        let record = Self::parse_record(resp.data)?;
        let mut entity = Entity::new(&record.guid, &record.verkey);
        entity.refresh(&record);
        Ok(entity)
    }
}
