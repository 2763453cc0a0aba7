//! Per-account session state.
//!
//! One [`Session`] exists per connected account and owns everything the
//! protocol flows mutate: the crypto engine, the device directory, the
//! active-chat set, the request-ID generator, and the pending-request
//! table. The host runtime is not owned; every operation that talks to
//! the outside borrows it for the call.

use std::sync::Arc;

use om_proto::{jid, RequestIdGenerator};

use crate::chats::ActiveChats;
use crate::correlate::PendingRequests;
use crate::directory::DeviceDirectory;
use crate::engine::CryptoEngine;
use crate::trust::TrustPolicy;

/// The connected account's addresses.
#[derive(Debug, Clone)]
pub struct AccountIdentity {
    /// Bare account address.
    pub account: String,
    /// Full JID of this connection, used as `from` on outbound stanzas.
    pub fulljid: String,
}

impl AccountIdentity {
    pub fn new(account: &str, fulljid: &str) -> Self {
        Self {
            account: jid::bare(account).to_owned(),
            fulljid: fulljid.to_owned(),
        }
    }

    pub fn bare(&self) -> &str {
        &self.account
    }
}

pub struct Session<E: CryptoEngine> {
    pub(crate) account: AccountIdentity,
    pub(crate) engine: E,
    pub(crate) directory: DeviceDirectory,
    pub(crate) chats: ActiveChats,
    pub(crate) request_ids: RequestIdGenerator,
    pub(crate) pending: PendingRequests,
    pub(crate) trust: Arc<dyn TrustPolicy>,
}

impl<E: CryptoEngine> Session<E> {
    pub fn new(account: AccountIdentity, engine: E, trust: Arc<dyn TrustPolicy>) -> Self {
        let directory = DeviceDirectory::new(account.bare());
        Self {
            account,
            engine,
            directory,
            chats: ActiveChats::new(),
            request_ids: RequestIdGenerator::new(),
            pending: PendingRequests::default(),
            trust,
        }
    }

    pub fn account(&self) -> &AccountIdentity {
        &self.account
    }

    pub fn directory(&self) -> &DeviceDirectory {
        &self.directory
    }

    pub fn chats(&self) -> &ActiveChats {
        &self.chats
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}
