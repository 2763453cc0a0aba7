//! Per-contact device-ID cache.
//!
//! One directory per account. Device-list updates replace the cached set
//! for that address wholesale; PEP notifications carry the full current
//! list, so merging stale entries in would resurrect removed devices.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use om_proto::jid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDirectory {
    own_address: String,
    own_devices: BTreeSet<u32>,
    remote: HashMap<String, BTreeSet<u32>>,
}

impl DeviceDirectory {
    pub fn new(own_bare: &str) -> Self {
        Self {
            own_address: own_bare.to_owned(),
            own_devices: BTreeSet::new(),
            remote: HashMap::new(),
        }
    }

    /// Whether `address` (bare or full) refers to our own account.
    pub fn is_own(&self, address: &str) -> bool {
        jid::bare(address) == self.own_address
    }

    /// Cached devices for `address`. Unknown contacts yield an empty set,
    /// not an error; an empty set means "query first".
    pub fn devices_for(&self, address: &str) -> BTreeSet<u32> {
        let bare = jid::bare(address);
        if bare == self.own_address {
            return self.own_devices.clone();
        }
        self.remote.get(bare).cloned().unwrap_or_default()
    }

    pub fn own_devices(&self) -> &BTreeSet<u32> {
        &self.own_devices
    }

    /// Replace the cached set for a remote contact.
    pub fn set_devices(&mut self, address: &str, device_ids: BTreeSet<u32>) {
        self.remote.insert(jid::bare(address).to_owned(), device_ids);
    }

    /// Replace our own published set.
    pub fn set_own_devices(&mut self, device_ids: BTreeSet<u32>) {
        self.own_devices = device_ids;
    }
}
