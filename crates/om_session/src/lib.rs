//! om_session: Protocol state and session orchestration for OMEMO
//!
//! This crate coordinates the asynchronous, partially-ordered exchanges an
//! encrypted conversation needs: device-list query, then bundle fetch,
//! then session build, then message exchange. It owns no cryptography and no
//! transport; both are collaborators behind traits ([`CryptoEngine`],
//! [`HostRuntime`]).
//!
//! All stanza handling for one account happens one stanza at a time in
//! delivery order. None of the state containers here are designed for
//! concurrent mutation; a host that processes stanzas in parallel must
//! serialize access per account.
//!
//! # Modules
//! - `plugin`: connection-lifecycle surface the host drives
//! - `session`: per-account session state (no process-wide singletons)
//! - `bootstrap`: announce/query handshake and per-peer session start
//! - `dispatch`: inbound stanza routing with consumed/not-consumed results
//! - `directory`: per-contact device-ID cache
//! - `chats`: active-conversation tracker
//! - `correlate`: pending request table, request ID to expected response
//! - `engine`: crypto engine collaborator trait
//! - `host`: host messaging runtime collaborator trait
//! - `trust`: pluggable device trust policy
//! - `commands`: `/omemo` command surface

pub mod chats;
pub mod commands;
pub mod correlate;
pub mod directory;
pub mod engine;
pub mod error;
pub mod host;
pub mod plugin;
pub mod session;
pub mod trust;

mod bootstrap;
mod dispatch;

pub use chats::ActiveChats;
pub use commands::Command;
pub use correlate::{PendingKind, PendingRequests};
pub use directory::DeviceDirectory;
pub use engine::{CryptoEngine, EngineError, EngineFactory};
pub use error::{DispatchError, SessionError};
pub use host::HostRuntime;
pub use plugin::OmemoPlugin;
pub use session::{AccountIdentity, Session};
pub use trust::{TrustAll, TrustPolicy};
