//! Bare-address normalization.
//!
//! A bare JID (`user@host`) is the canonical key for every per-contact
//! structure in this layer. Resources (`/phone`, `/desktop`) identify a
//! connection, not a contact, and are stripped before any lookup.

/// Strip the resource suffix, if any.
pub fn bare(jid: &str) -> &str {
    match jid.rsplit_once('/') {
        Some((bare, _)) => bare,
        None => jid,
    }
}

/// The resource suffix, if the address carries one.
pub fn resource(jid: &str) -> Option<&str> {
    jid.rsplit_once('/').map(|(_, resource)| resource)
}
