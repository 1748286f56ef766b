//! In-memory registry double.
//!
//! Implements the registry-side rules the client protocol is defined
//! against: signature verification over re-serialized canonical bytes,
//! `prev_sign` chain matching, verkey matching on update, the
//! double-signature check on rekey, and duplicate GUID/XID rejection.
//! The verification path deliberately re-parses the wire string and
//! re-serializes the payload, so any drift between signer and verifier
//! serialization shows up as a rejected request in the test suites.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{ApiResponse, Transport};
use crate::error::{Result, SignetError};
use crate::payload::{RekeyPayload, SignedPayload};

#[derive(Debug, Clone)]
struct StoredEntity {
    verkey: String,
    xid: Option<String>,
    channel: Option<String>,
    signature: String,
    signed_at: String,
    entity_json: String,
}

/// An in-memory registry that speaks the [`Transport`] protocol.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    entities: Mutex<HashMap<String, StoredEntity>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn reject(status: u16, message: &str) -> ApiResponse {
        ApiResponse {
            status,
            data: json!({ "error": message }),
        }
    }

    fn record_json(guid: &str, stored: &StoredEntity) -> Value {
        json!({
            "guid": guid,
            "verkey": stored.verkey,
            "xid": stored.xid,
            "channel": stored.channel,
            "signature": stored.signature,
            "signedAt": stored.signed_at,
            "entityJSON": stored.entity_json,
        })
    }

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn guid_from_path(path: &str) -> Option<(&str, &str)> {
        let (route, query) = path.split_once('?')?;
        let guid = query.strip_prefix("guid=")?;
        Some((route, guid))
    }

    fn parse_signed_payload(params: &Value) -> std::result::Result<SignedPayload, ApiResponse> {
        let raw = params
            .get("signed_payload")
            .and_then(Value::as_str)
            .ok_or_else(|| Self::reject(400, "missing signed_payload"))?;
        serde_json::from_str(raw).map_err(|_| Self::reject(400, "malformed signed_payload"))
    }

    fn check_org_signature(
        signed: &SignedPayload,
        headers: &[(String, String)],
    ) -> std::result::Result<(), ApiResponse> {
        let Some(org_key) = Self::header(headers, "X-Org-Key") else {
            return Err(Self::reject(401, "missing X-Org-Key header"));
        };
        let Some(org_sign) = Self::header(headers, "X-Org-Sign") else {
            return Err(Self::reject(401, "missing X-Org-Sign header"));
        };
        let Ok(verifying_key) = crate::crypto::keys::SignetKeyPair::verifying_key_from_text(org_key)
        else {
            return Err(Self::reject(401, "malformed X-Org-Key header"));
        };
        let Ok(message) = signed.canonical_json() else {
            return Err(Self::reject(400, "unserializable payload"));
        };
        if !crate::crypto::signing::verify_from_text(&verifying_key, message.as_bytes(), org_sign) {
            return Err(Self::reject(401, "invalid organization signature"));
        }
        Ok(())
    }

    fn create(&self, params: &Value, headers: &[(String, String)]) -> ApiResponse {
        let signed = match Self::parse_signed_payload(params) {
            Ok(signed) => signed,
            Err(resp) => return resp,
        };
        if !signed.verify() {
            return Self::reject(401, "invalid entity signature");
        }
        if !signed.payload.verify.prev_sign.is_empty() {
            return Self::reject(400, "prev_sign must be empty on create");
        }
        if let Err(resp) = Self::check_org_signature(&signed, headers) {
            return resp;
        }

        let guid = signed.payload.data.guid.clone();
        let xid = signed.payload.data.xids.first().map(ToString::to_string);
        let channel = signed.payload.data.channels.first().map(ToString::to_string);

        let mut entities = self.entities.lock().expect("registry lock poisoned");
        if entities.contains_key(&guid) {
            return Self::reject(409, "duplicate guid");
        }
        if let Some(xid) = &xid {
            if entities.values().any(|e| e.xid.as_deref() == Some(xid.as_str())) {
                return Self::reject(409, "duplicate xid");
            }
        }

        let stored = StoredEntity {
            verkey: signed.payload.verify.verify_key.clone(),
            xid,
            channel,
            signature: signed.sign.clone(),
            signed_at: signed.payload.verify.sign_time.clone(),
            entity_json: signed
                .payload
                .canonical_json()
                .unwrap_or_default(),
        };
        let data = Self::record_json(&guid, &stored);
        entities.insert(guid, stored);
        ApiResponse { status: 200, data }
    }

    fn update(&self, guid: &str, params: &Value) -> ApiResponse {
        let signed = match Self::parse_signed_payload(params) {
            Ok(signed) => signed,
            Err(resp) => return resp,
        };
        if signed.payload.data.guid != guid {
            return Self::reject(400, "guid mismatch");
        }
        if !signed.verify() {
            return Self::reject(401, "invalid entity signature");
        }

        let mut entities = self.entities.lock().expect("registry lock poisoned");
        let xid = signed.payload.data.xids.first().map(ToString::to_string);
        if let Some(new_xid) = &xid {
            let taken = entities
                .iter()
                .any(|(g, e)| g != guid && e.xid.as_deref() == Some(new_xid.as_str()));
            if taken {
                return Self::reject(409, "duplicate xid");
            }
        }
        let Some(stored) = entities.get_mut(guid) else {
            return Self::reject(404, "no such entity");
        };
        if signed.payload.verify.verify_key != stored.verkey {
            return Self::reject(401, "signature does not match current verkey");
        }
        if signed.payload.verify.prev_sign != stored.signature {
            return Self::reject(409, "stale prev_sign");
        }

        // Each accepted mutation is a complete replacement of both fields.
        stored.xid = xid;
        stored.channel = signed.payload.data.channels.first().map(ToString::to_string);
        stored.signature = signed.sign.clone();
        stored.signed_at = signed.payload.verify.sign_time.clone();
        stored.entity_json = signed.payload.canonical_json().unwrap_or_default();

        ApiResponse {
            status: 200,
            data: Self::record_json(guid, stored),
        }
    }

    fn rekey(&self, guid: &str, params: &Value) -> ApiResponse {
        let raw = match params.get("rekey_payload").and_then(Value::as_str) {
            Some(raw) => raw,
            None => return Self::reject(400, "missing rekey_payload"),
        };
        let rekey: RekeyPayload = match serde_json::from_str(raw) {
            Ok(rekey) => rekey,
            Err(_) => return Self::reject(400, "malformed rekey_payload"),
        };
        let signed = &rekey.signed_payload;
        if signed.payload.data.guid != guid {
            return Self::reject(400, "guid mismatch");
        }
        if !signed.verify() {
            return Self::reject(401, "invalid new-key signature");
        }

        let mut entities = self.entities.lock().expect("registry lock poisoned");
        let Some(stored) = entities.get_mut(guid) else {
            return Self::reject(404, "no such entity");
        };
        if signed.payload.verify.prev_sign != stored.signature {
            return Self::reject(409, "stale prev_sign");
        }
        if !rekey.verify_old_sign(&stored.verkey) {
            return Self::reject(401, "old-key countersignature invalid");
        }

        // Key rotation only; xid and channel are untouched.
        stored.verkey = signed.payload.verify.verify_key.clone();
        stored.signature = signed.sign.clone();
        stored.signed_at = signed.payload.verify.sign_time.clone();
        stored.entity_json = signed.payload.canonical_json().unwrap_or_default();

        ApiResponse {
            status: 200,
            data: Self::record_json(guid, stored),
        }
    }
}

#[async_trait]
impl Transport for MemoryRegistry {
    async fn do_get(&self, path: &str, query: &[(String, String)]) -> Result<ApiResponse> {
        if path != "/entity" {
            return Ok(Self::reject(404, "no such route"));
        }
        let entities = self.entities.lock().expect("registry lock poisoned");
        let found = if let Some((_, guid)) = query.iter().find(|(n, _)| n == "guid") {
            entities
                .get_key_value(guid.as_str())
                .map(|(g, e)| (g.clone(), e.clone()))
        } else if let Some((_, xid)) = query.iter().find(|(n, _)| n == "xid") {
            entities
                .iter()
                .find(|(_, e)| e.xid.as_deref() == Some(xid.as_str()))
                .map(|(g, e)| (g.clone(), e.clone()))
        } else {
            return Ok(Self::reject(400, "guid or xid parameter required"));
        };
        Ok(match found {
            Some((guid, stored)) => ApiResponse {
                status: 200,
                data: Self::record_json(&guid, &stored),
            },
            None => Self::reject(404, "no such entity"),
        })
    }

    async fn do_post(
        &self,
        path: &str,
        params: &Value,
        headers: &[(String, String)],
    ) -> Result<ApiResponse> {
        match path {
            "/entity/" => Ok(self.create(params, headers)),
            _ => Ok(Self::reject(404, "no such route")),
        }
    }

    async fn do_patch(
        &self,
        path: &str,
        params: &Value,
        _headers: &[(String, String)],
    ) -> Result<ApiResponse> {
        let Some((route, guid)) = Self::guid_from_path(path) else {
            return Err(SignetError::ParamInvalid(format!(
                "patch path must carry ?guid=: '{path}'"
            )));
        };
        match route {
            "/entity/update" => Ok(self.update(guid, params)),
            "/entity/rekey" => Ok(self.rekey(guid, params)),
            _ => Ok(Self::reject(404, "no such route")),
        }
    }
}
