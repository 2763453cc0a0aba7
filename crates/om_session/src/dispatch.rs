//! Inbound stanza routing.
//!
//! Handlers return whether the stanza was consumed. The failure rules
//! differ by how far recognition got:
//! - stanzas that never parse are not ours and are not consumed
//! - recognized protocol stanzas with broken contents are consumed and
//!   logged, so the host never renders raw protocol XML
//! - decrypt and encrypt failures surface as errors to the caller
//!
//! One continuation lives here: a device-list answer we asked for, on a
//! peer whose chat is active, triggers the bundle fetches that the
//! conversation start deferred.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use om_proto::{bundle, device_list, envelope, jid, stanza, IqClass, MessageClass};

use crate::correlate::PendingKind;
use crate::engine::CryptoEngine;
use crate::error::DispatchError;
use crate::host::HostRuntime;
use crate::session::Session;

/// Prefix shown before decrypted text in the conversation window.
const DISPLAY_PREFIX: &str = "[*OMEMO*]";

impl<E: CryptoEngine> Session<E> {
    /// Route an inbound `<message>`. `Ok(true)` means consumed; the host
    /// must not process the stanza further.
    pub fn handle_message(
        &mut self,
        host: &mut dyn HostRuntime,
        raw: &str,
    ) -> Result<bool, DispatchError> {
        let class = match stanza::classify_message(raw) {
            Ok(class) => class,
            Err(err) => {
                warn!(target: "om_session", event = "unparseable_message", error = %err);
                return Ok(false);
            }
        };

        match class {
            MessageClass::DeviceList => {
                match device_list::parse_update(raw) {
                    Ok(update) => self.apply_device_list(host, &update.sender, update.device_ids),
                    Err(err) => {
                        warn!(
                            target: "om_session",
                            event = "broken_device_list",
                            error = %err,
                        );
                    }
                }
                Ok(true)
            }
            MessageClass::Encrypted => {
                let inbound = match envelope::unpack(raw) {
                    Ok(inbound) => inbound,
                    Err(err) => {
                        warn!(
                            target: "om_session",
                            event = "broken_envelope",
                            error = %err,
                        );
                        return Ok(true);
                    }
                };
                let sender_bare = jid::bare(&inbound.sender).to_owned();
                let resource = jid::resource(&inbound.sender).map(str::to_owned);

                let plaintext = self
                    .engine
                    .decrypt(&sender_bare, &inbound.envelope)
                    .map_err(|source| DispatchError::Decrypt {
                        sender: sender_bare.clone(),
                        source,
                    })?;

                // Receiving ciphertext implies the peer wants encryption;
                // register (or re-activate) the chat so replies are
                // encrypted too.
                self.chats.add(&sender_bare);
                host.display_incoming(
                    &sender_bare,
                    resource.as_deref(),
                    &format!("{DISPLAY_PREFIX} {plaintext}"),
                );
                Ok(true)
            }
            MessageClass::Other => Ok(false),
        }
    }

    /// Route an inbound `<iq>`. Returns whether it was consumed.
    pub fn handle_iq(&mut self, host: &mut dyn HostRuntime, raw: &str) -> bool {
        for (req_id, kind) in self.pending.sweep() {
            warn!(
                target: "om_session",
                event = "request_expired",
                request_id = %req_id,
                kind = ?kind,
            );
        }

        let id = match stanza::stanza_id(raw) {
            Ok(id) => id,
            Err(err) => {
                warn!(target: "om_session", event = "unparseable_iq", error = %err);
                return false;
            }
        };
        let resolved = id.as_deref().and_then(|id| self.pending.resolve(id));

        let class = match stanza::classify_iq(raw) {
            Ok(class) => class,
            Err(_) => return false,
        };

        match class {
            IqClass::Bundle => {
                self.handle_bundle_response(raw, resolved.as_ref());
                true
            }
            IqClass::DeviceList => {
                match device_list::parse_update(raw) {
                    Ok(update) => {
                        self.apply_device_list(host, &update.sender, update.device_ids);
                        // Continuation of the conversation start: the
                        // device list we asked for has arrived, so the
                        // deferred bundle fetches can go out now.
                        if let Some(PendingKind::DeviceListQuery { peer }) = resolved {
                            if self.chats.is_active(&peer) {
                                if let Err(err) = self.fetch_bundles(host, &peer) {
                                    warn!(
                                        target: "om_session",
                                        event = "bundle_fetch_failed",
                                        peer = %peer,
                                        error = %err,
                                    );
                                }
                            }
                        }
                    }
                    Err(err) => {
                        warn!(
                            target: "om_session",
                            event = "broken_device_list",
                            error = %err,
                        );
                    }
                }
                true
            }
            IqClass::Other => {
                if let Some(kind) = resolved {
                    // Our request was answered with something we cannot
                    // read, most likely an error IQ. No retry.
                    warn!(
                        target: "om_session",
                        event = "request_failed",
                        kind = ?kind,
                    );
                    return true;
                }
                false
            }
        }
    }

    fn handle_bundle_response(&mut self, raw: &str, resolved: Option<&PendingKind>) {
        if resolved.is_none() {
            info!(target: "om_session", event = "unsolicited_bundle");
        }
        let response = match bundle::parse_response(raw) {
            Ok(response) => response,
            Err(err) => {
                warn!(target: "om_session", event = "broken_bundle", error = %err);
                return;
            }
        };
        if !self.trust.is_trusted(&response.sender, response.device_id) {
            info!(
                target: "om_session",
                event = "untrusted_device_skipped",
                peer = %response.sender,
                device_id = response.device_id,
            );
            return;
        }
        // One broken device must not block its siblings; the error stops
        // at this device.
        match self
            .engine
            .build_session(&response.sender, response.device_id, &response.bundle)
        {
            Ok(()) => {
                debug!(
                    target: "om_session",
                    event = "session_built",
                    peer = %response.sender,
                    device_id = response.device_id,
                );
            }
            Err(err) => {
                warn!(
                    target: "om_session",
                    event = "session_build_failed",
                    peer = %response.sender,
                    device_id = response.device_id,
                    error = %err,
                );
            }
        }
    }

    /// Store a received device set, mirrored into the engine. Our own
    /// list additionally gets repaired if it lost this device.
    fn apply_device_list(
        &mut self,
        host: &mut dyn HostRuntime,
        sender: &str,
        device_ids: BTreeSet<u32>,
    ) {
        info!(
            target: "om_session",
            event = "device_list_received",
            sender = %sender,
            devices = device_ids.len(),
        );
        if self.directory.is_own(sender) {
            let missing_self = !device_ids.contains(&self.engine.own_device_id());
            self.engine.set_own_devices(&device_ids);
            self.directory.set_own_devices(device_ids);
            if missing_self {
                info!(target: "om_session", event = "own_device_missing_republish");
                if let Err(err) = self.announce_device_list(host) {
                    warn!(
                        target: "om_session",
                        event = "device_list_republish_failed",
                        error = %err,
                    );
                }
            }
        } else {
            self.engine.set_devices(sender, &device_ids);
            self.directory.set_devices(sender, device_ids);
        }
        host.completer_add("/omemo start", &[sender]);
        host.completer_add("/omemo show_devices", &[sender]);
    }

    /// Intercept an outgoing plain message. `Ok(Some(_))` is the stanza to
    /// send instead; `Ok(None)` means send the original unchanged. Any
    /// error means the original must NOT be sent, or plaintext would leak
    /// into a conversation the user chose to encrypt.
    pub fn encrypt_outgoing(&mut self, raw: &str) -> Result<Option<String>, DispatchError> {
        let plain = match envelope::outgoing_plaintext(raw) {
            Ok(Some(plain)) => plain,
            Ok(None) => return Ok(None),
            Err(err) => {
                // Not a well-formed message from the host; nothing we can
                // inspect, nothing we encrypt.
                warn!(target: "om_session", event = "unparseable_outgoing", error = %err);
                return Ok(None);
            }
        };

        let bare = jid::bare(&plain.to).to_owned();
        if !self.chats.is_active(&bare) {
            return Ok(None);
        }

        let sealed = self
            .engine
            .create_message(&self.account.fulljid, &bare, &plain.body)
            .map_err(|source| DispatchError::Encrypt {
                recipient: bare.clone(),
                source,
            })?;
        let msg_id = self.request_ids.next_id("msg");
        let stanza = envelope::build_message(&plain.to, &self.account.fulljid, &msg_id, &sealed)
            .map_err(|source| DispatchError::InvalidOutbound {
                recipient: bare,
                source,
            })?;
        Ok(Some(stanza))
    }
}
