//! Active-conversation tracker.
//!
//! A chat is keyed by the peer's bare address and is in one of three
//! states: unknown, active, or deactivated. Deactivated chats stay
//! registered so an inbound encrypted message can flip them back to
//! active without redoing the handshake.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use om_proto::jid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ChatRecord {
    deactivated: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveChats {
    chats: HashMap<String, ChatRecord>,
}

impl ActiveChats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `peer` as active. Re-adding an existing chat re-activates
    /// it rather than resetting it.
    pub fn add(&mut self, peer: &str) {
        let bare = jid::bare(peer);
        match self.chats.get_mut(bare) {
            Some(record) if record.deactivated => {
                record.deactivated = false;
                debug!(target: "om_session", event = "chat_reactivated", peer = %bare);
            }
            Some(_) => {}
            None => {
                self.chats.insert(bare.to_owned(), ChatRecord::default());
                debug!(target: "om_session", event = "chat_added", peer = %bare);
            }
        }
    }

    /// Stop encrypting to `peer`. No-op for unregistered chats.
    pub fn deactivate(&mut self, peer: &str) {
        if let Some(record) = self.chats.get_mut(jid::bare(peer)) {
            record.deactivated = true;
        }
    }

    pub fn remove(&mut self, peer: &str) {
        self.chats.remove(jid::bare(peer));
    }

    pub fn is_registered(&self, peer: &str) -> bool {
        self.chats.contains_key(jid::bare(peer))
    }

    pub fn is_active(&self, peer: &str) -> bool {
        self.chats
            .get(jid::bare(peer))
            .map(|record| !record.deactivated)
            .unwrap_or(false)
    }

    pub fn is_deactivated(&self, peer: &str) -> bool {
        self.chats
            .get(jid::bare(peer))
            .map(|record| record.deactivated)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle() {
        let mut chats = ActiveChats::new();
        assert!(!chats.is_registered("bascht@yakshed.org"));

        chats.add("bascht@yakshed.org/profanity");
        assert!(chats.is_registered("bascht@yakshed.org"));
        assert!(chats.is_active("bascht@yakshed.org"));
        assert!(!chats.is_deactivated("bascht@yakshed.org"));

        chats.deactivate("bascht@yakshed.org");
        assert!(chats.is_registered("bascht@yakshed.org"));
        assert!(!chats.is_active("bascht@yakshed.org"));
        assert!(chats.is_deactivated("bascht@yakshed.org"));

        chats.remove("bascht@yakshed.org");
        assert!(!chats.is_registered("bascht@yakshed.org"));
    }

    #[test]
    fn re_add_reactivates() {
        let mut chats = ActiveChats::new();
        chats.add("bascht@yakshed.org");
        chats.deactivate("bascht@yakshed.org");
        chats.add("bascht@yakshed.org");
        assert!(chats.is_active("bascht@yakshed.org"));
    }

    #[test]
    fn deactivate_unknown_is_noop() {
        let mut chats = ActiveChats::new();
        chats.deactivate("stranger@example.org");
        assert!(!chats.is_registered("stranger@example.org"));
    }

    #[test]
    fn unknown_is_neither_active_nor_deactivated() {
        let chats = ActiveChats::new();
        assert!(!chats.is_active("stranger@example.org"));
        assert!(!chats.is_deactivated("stranger@example.org"));
    }
}
