//! Error types for the orchestration layer.
//!
//! The split follows the blast radius of each failure class. A stanza
//! that never parsed is not ours and is left to the host. An envelope we
//! recognized but could not process is consumed and logged. A decrypt or
//! encrypt failure is surfaced to the caller, because dropping either one
//! silently would hide message loss.

use om_proto::StanzaError;
use thiserror::Error;

use crate::engine::EngineError;

/// Failures during bootstrap and command handling.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Stanza(#[from] StanzaError),
}

/// Failures during stanza dispatch that the host must hear about.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("could not decrypt message from {sender}")]
    Decrypt {
        sender: String,
        #[source]
        source: EngineError,
    },

    #[error("could not encrypt message for {recipient}")]
    Encrypt {
        recipient: String,
        #[source]
        source: EngineError,
    },

    /// Encrypting succeeded but the outbound stanza failed validation.
    /// The plaintext must not be sent in its place.
    #[error("outbound stanza for {recipient} is invalid")]
    InvalidOutbound {
        recipient: String,
        #[source]
        source: StanzaError,
    },
}
