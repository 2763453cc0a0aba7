//! Pending request table.
//!
//! Every IQ we send carries a generated ID; the entry recorded here says
//! what kind of response that ID is expected to resolve. Entries that
//! outlive the TTL are swept and logged, never retried. The peer will
//! either answer late (the response is then treated as unsolicited) or
//! the user restarts the conversation.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// What a pending request ID is waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingKind {
    /// A device-list query result for `peer`.
    DeviceListQuery { peer: String },
    /// A bundle fetch result for one device of `peer`.
    BundleFetch { peer: String, device_id: u32 },
}

#[derive(Debug)]
struct Pending {
    kind: PendingKind,
    issued_at: Instant,
}

#[derive(Debug)]
pub struct PendingRequests {
    entries: HashMap<String, Pending>,
    ttl: Duration,
}

impl Default for PendingRequests {
    fn default() -> Self {
        Self::new(Duration::from_secs(120))
    }
}

impl PendingRequests {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    pub fn insert(&mut self, request_id: String, kind: PendingKind) {
        self.entries.insert(
            request_id,
            Pending {
                kind,
                issued_at: Instant::now(),
            },
        );
    }

    /// Take the entry for `request_id`, if one is pending. Expired entries
    /// that have not been swept yet still resolve; a slow server beats a
    /// sweep race.
    pub fn resolve(&mut self, request_id: &str) -> Option<PendingKind> {
        self.entries.remove(request_id).map(|pending| pending.kind)
    }

    /// Remove entries older than the TTL and return them for logging.
    pub fn sweep(&mut self) -> Vec<(String, PendingKind)> {
        let ttl = self.ttl;
        let now = Instant::now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, pending)| now.duration_since(pending.issued_at) > ttl)
            .map(|(id, _)| id.clone())
            .collect();
        expired
            .into_iter()
            .filter_map(|id| {
                self.entries
                    .remove(&id)
                    .map(|pending| (id, pending.kind))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
