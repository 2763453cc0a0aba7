//! Collaborator trait for the host messaging runtime.
//!
//! The host owns the network connection, stanza delivery, and the UI.
//! Everything here is fire-and-forget from this layer's point of view;
//! retries and delivery guarantees are the host's business.

pub trait HostRuntime {
    /// Hand a validated stanza to the transport.
    fn send_stanza(&mut self, stanza: &str);

    /// Show a decrypted incoming message in the conversation window.
    fn display_incoming(&mut self, sender: &str, resource: Option<&str>, text: &str);

    /// Write a line to the host's console window.
    fn show_console(&mut self, text: &str);

    /// Advertise a capability namespace via service discovery.
    fn advertise_feature(&mut self, namespace: &str);

    /// Register tab-completion candidates for a command.
    fn completer_add(&mut self, command: &str, candidates: &[&str]);
}
