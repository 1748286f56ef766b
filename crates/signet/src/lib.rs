//! Signet — client SDK for a decentralized identity registry.
//!
//! Agents hold Ed25519 ownership keys for entities they manage. Every
//! mutation is a detached signature over a canonical JSON payload, chained
//! to the previous accepted mutation through `prev_sign`; ownership
//! transfer is a double-signed rekey handshake in which the outgoing key
//! countersigns the incoming key's payload. Two agents may co-own an
//! entity after out-of-band key sharing, until one of them rekeys.

pub mod agent;
pub mod client;
pub mod crypto;
pub mod entity;
pub mod error;
pub mod keyset;
pub mod payload;
pub mod time;

// Re-export primary types
pub use agent::{Agent, CreateOpts};
pub use client::{ApiResponse, HttpClient, MemoryRegistry, Transport};
pub use crypto::keys::SignetKeyPair;
pub use entity::{Entity, RegistryRecord};
pub use error::{Result, SignetError};
pub use keyset::KeySet;
pub use payload::{Channel, Payload, RekeyPayload, SignedPayload, Xid};
