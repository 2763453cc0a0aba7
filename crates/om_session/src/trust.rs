//! Pluggable device trust policy.
//!
//! Session builds consult the policy before any bundle is handed to the
//! engine; an untrusted device is skipped and logged.

pub trait TrustPolicy {
    fn is_trusted(&self, peer: &str, device_id: u32) -> bool;
}

/// Trusts every device unconditionally.
///
/// DEVELOPMENT ONLY. This exists so the handshake can be exercised before
/// a real verification flow is wired up; shipping it means any server can
/// inject a device that will silently receive message keys. Production
/// trust-on-first-use semantics are an open design question tracked in
/// DESIGN.md.
pub struct TrustAll;

impl TrustPolicy for TrustAll {
    fn is_trusted(&self, _peer: &str, _device_id: u32) -> bool {
        true
    }
}
