//! Connection-lifecycle surface the host drives.
//!
//! The plugin is the long-lived object; the [`Session`] inside it lives
//! exactly as long as one account connection. Hooks arriving with no
//! session (before connect, after disconnect) pass stanzas through
//! untouched.

use std::sync::Arc;

use tracing::{error, info};

use crate::commands::{Command, COMMAND, SUBCOMMANDS};
use crate::engine::EngineFactory;
use crate::error::DispatchError;
use crate::host::HostRuntime;
use crate::session::{AccountIdentity, Session};
use crate::trust::TrustPolicy;

pub struct OmemoPlugin<F: EngineFactory> {
    factory: F,
    trust: Arc<dyn TrustPolicy>,
    session: Option<Session<F::Engine>>,
}

impl<F: EngineFactory> OmemoPlugin<F> {
    pub fn new(factory: F, trust: Arc<dyn TrustPolicy>) -> Self {
        Self {
            factory,
            trust,
            session: None,
        }
    }

    pub fn session(&self) -> Option<&Session<F::Engine>> {
        self.session.as_ref()
    }

    /// Account connected. Opens the engine and runs the handshake. A
    /// failed engine open leaves the plugin dormant; a failed handshake
    /// keeps the session, later stanzas may still succeed.
    pub fn on_connect(&mut self, host: &mut dyn HostRuntime, account: &str, fulljid: &str) {
        host.completer_add(COMMAND, SUBCOMMANDS);

        let identity = AccountIdentity::new(account, fulljid);
        let engine = match self.factory.open(identity.bare()) {
            Ok(engine) => engine,
            Err(err) => {
                error!(
                    target: "om_session",
                    event = "engine_open_failed",
                    account = %identity.bare(),
                    error = %err,
                );
                return;
            }
        };

        let mut session = Session::new(identity, engine, Arc::clone(&self.trust));
        if let Err(err) = session.init(host) {
            error!(
                target: "om_session",
                event = "handshake_failed",
                error = %err,
            );
        }
        self.session = Some(session);
    }

    /// Account disconnected. Drops the session and with it the engine.
    pub fn on_disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            info!(
                target: "om_session",
                event = "session_closed",
                account = %session.account().bare(),
            );
        }
    }

    pub fn on_shutdown(&mut self) {
        self.on_disconnect();
    }

    /// Inbound `<message>` hook. `Ok(true)` means consumed.
    pub fn on_message_receive(
        &mut self,
        host: &mut dyn HostRuntime,
        raw: &str,
    ) -> Result<bool, DispatchError> {
        match self.session.as_mut() {
            Some(session) => session.handle_message(host, raw),
            None => Ok(false),
        }
    }

    /// Inbound `<iq>` hook. Returns whether it was consumed.
    pub fn on_iq_receive(&mut self, host: &mut dyn HostRuntime, raw: &str) -> bool {
        match self.session.as_mut() {
            Some(session) => session.handle_iq(host, raw),
            None => false,
        }
    }

    /// Outbound message hook. `Ok(Some(_))` replaces the stanza; on error
    /// the host must not send the original.
    pub fn on_message_send(&mut self, raw: &str) -> Result<Option<String>, DispatchError> {
        match self.session.as_mut() {
            Some(session) => session.encrypt_outgoing(raw),
            None => Ok(None),
        }
    }

    /// `/omemo` command entry point, `args` being everything after the
    /// command word.
    pub fn run_command(&mut self, host: &mut dyn HostRuntime, args: &[&str]) {
        let command = match Command::parse(args) {
            Some(command) => command,
            None => {
                host.show_console(
                    "Usage: /omemo start|end|announce|account|fulljid|show_devices",
                );
                return;
            }
        };

        let session = match self.session.as_mut() {
            Some(session) => session,
            None => {
                host.show_console("No account connected.");
                return;
            }
        };

        match command {
            Command::Start(peer) => {
                if let Err(err) = session.start_conversation(host, &peer) {
                    host.show_console(&format!("Could not start OMEMO for {peer}: {err}"));
                }
            }
            Command::End(peer) => {
                session.end_conversation(&peer);
                host.show_console(&format!("OMEMO ended for {peer}."));
            }
            Command::Announce => {
                if let Err(err) = session.announce_bundle(host) {
                    host.show_console(&format!("Could not announce bundle: {err}"));
                }
            }
            Command::Account => {
                host.show_console(session.account().bare());
            }
            Command::FullJid => {
                host.show_console(&session.account().fulljid);
            }
            Command::ShowDevices(peer) => {
                let devices = session.directory().devices_for(&peer);
                if devices.is_empty() {
                    host.show_console(&format!("No known devices for {peer}."));
                } else {
                    let list: Vec<String> =
                        devices.iter().map(|id| id.to_string()).collect();
                    host.show_console(&format!("{peer}: {}", list.join(", ")));
                }
            }
        }
    }
}
