//! Cryptographic primitives for the Signet SDK.
//!
//! This module provides:
//! - Ed25519 key pair generation with text export/import
//! - Detached signing and verification over canonical payload bytes
//!
//! All key and signature text encodings are base64url without padding,
//! followed by a single mandatory `=` suffix. The suffix is redundant;
//! stripping it on decode and re-adding it on encode is the contract.

pub mod keys;
pub mod signing;
