//! Collaborator trait for the cryptographic session engine.
//!
//! The engine owns key generation, the ratchet, AEAD, and its storage
//! connection. This layer only drives it: hand it peer bundles to build
//! sessions, and envelopes to open. Exactly one engine instance exists
//! per account address, owned by the account's [`Session`] and torn down
//! with it on disconnect.
//!
//! [`Session`]: crate::session::Session

use std::collections::BTreeSet;

use om_proto::{Envelope, KeyBundle};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Per-device session establishment failed. Caught per device inside
    /// the bootstrap loop; never aborts sibling devices.
    #[error("session build failed: {0}")]
    SessionBuild(String),

    /// Decryption failed. Propagated to the dispatcher's caller; a
    /// silently dropped decrypt would hide message loss from the user.
    #[error("decrypt failed: {0}")]
    Decrypt(String),

    #[error("encrypt failed: {0}")]
    Encrypt(String),

    /// Key material missing or unreadable (own bundle, identity key).
    #[error("key material unavailable: {0}")]
    KeyMaterial(String),

    #[error("key store failure: {0}")]
    Storage(String),
}

pub trait CryptoEngine {
    /// Our device's ID, stable for the lifetime of the engine.
    fn own_device_id(&self) -> u32;

    /// Current public bundle for announcing.
    fn bundle(&self) -> Result<KeyBundle, EngineError>;

    /// Establish an outbound session with one device of `peer` from its
    /// published bundle.
    fn build_session(
        &mut self,
        peer: &str,
        device_id: u32,
        bundle: &KeyBundle,
    ) -> Result<(), EngineError>;

    /// Encrypt `plaintext` for every known device of `to`. The engine
    /// decides the per-device fan-out; the returned envelope carries one
    /// wrapped key per recipient device.
    fn create_message(
        &mut self,
        from_fulljid: &str,
        to_bare: &str,
        plaintext: &str,
    ) -> Result<Envelope, EngineError>;

    /// Open an inbound envelope from `sender_bare`.
    fn decrypt(&mut self, sender_bare: &str, envelope: &Envelope) -> Result<String, EngineError>;

    /// Mirror of the device directory write path; the engine needs the
    /// device sets for its own fan-out.
    fn set_devices(&mut self, address: &str, device_ids: &BTreeSet<u32>);
    fn set_own_devices(&mut self, device_ids: &BTreeSet<u32>);
}

/// Opens an engine for an account address on connect.
pub trait EngineFactory {
    type Engine: CryptoEngine;

    fn open(&mut self, own_bare: &str) -> Result<Self::Engine, EngineError>;
}
