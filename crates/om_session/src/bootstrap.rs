//! Announce/query handshake and per-peer conversation start.
//!
//! Connect-time bootstrap publishes our key material and device list and
//! pulls our own published device list back down. Starting a conversation
//! with a peer issues a device-list query; the bundle fetches follow once
//! the answer arrives (see the dispatch continuation).

use tracing::{debug, info};

use om_proto::{bundle, device_list, jid, ns};

use crate::correlate::PendingKind;
use crate::engine::CryptoEngine;
use crate::error::SessionError;
use crate::host::HostRuntime;
use crate::session::Session;

impl<E: CryptoEngine> Session<E> {
    /// Connect-time handshake: advertise the notify capability, publish
    /// bundle and device list, then query our own list so other devices
    /// of this account show up in the directory.
    pub fn init(&mut self, host: &mut dyn HostRuntime) -> Result<(), SessionError> {
        host.advertise_feature(ns::DEVICE_LIST_NOTIFY);
        self.announce_bundle(host)?;
        self.announce_device_list(host)?;
        let own = self.account.bare().to_owned();
        self.query_device_list(host, &own)?;
        info!(
            target: "om_session",
            event = "session_initialized",
            account = %self.account.bare(),
            device_id = self.engine.own_device_id(),
        );
        Ok(())
    }

    /// Publish our current key bundle under the per-device PEP node.
    pub fn announce_bundle(&mut self, host: &mut dyn HostRuntime) -> Result<(), SessionError> {
        let key_bundle = self.engine.bundle()?;
        let req_id = self.request_ids.next_id("announce-bundle");
        let stanza = bundle::build_publish(
            &self.account.fulljid,
            &req_id,
            self.engine.own_device_id(),
            &key_bundle,
        )?;
        host.send_stanza(&stanza);
        debug!(
            target: "om_session",
            event = "bundle_announced",
            device_id = self.engine.own_device_id(),
        );
        Ok(())
    }

    /// Publish our device list: the cached own set plus this device.
    pub fn announce_device_list(&mut self, host: &mut dyn HostRuntime) -> Result<(), SessionError> {
        let mut device_ids = self.directory.own_devices().clone();
        device_ids.insert(self.engine.own_device_id());
        let req_id = self.request_ids.next_id("announce-dl");
        let stanza = device_list::build_publish(&self.account.fulljid, &req_id, &device_ids)?;
        host.send_stanza(&stanza);
        debug!(
            target: "om_session",
            event = "device_list_announced",
            devices = device_ids.len(),
        );
        Ok(())
    }

    /// Ask for `peer`'s published device list and record the pending
    /// request so the answer can be correlated.
    pub fn query_device_list(
        &mut self,
        host: &mut dyn HostRuntime,
        peer: &str,
    ) -> Result<(), SessionError> {
        let bare = jid::bare(peer);
        let req_id = self.request_ids.next_id("devlist-req");
        let stanza = device_list::build_query(&self.account.fulljid, bare, &req_id)?;
        self.pending.insert(
            req_id,
            PendingKind::DeviceListQuery {
                peer: bare.to_owned(),
            },
        );
        host.send_stanza(&stanza);
        Ok(())
    }

    /// Begin encrypting to `peer`: register the chat, refresh the device
    /// list, and fetch bundles for whatever devices are already cached.
    pub fn start_conversation(
        &mut self,
        host: &mut dyn HostRuntime,
        peer: &str,
    ) -> Result<(), SessionError> {
        let bare = jid::bare(peer).to_owned();
        self.chats.add(&bare);
        self.query_device_list(host, &bare)?;
        self.fetch_bundles(host, &bare)?;
        info!(target: "om_session", event = "conversation_started", peer = %bare);
        Ok(())
    }

    /// Fetch the bundle of every cached device of `peer`. With nothing
    /// cached yet this is a no-op; the device-list answer triggers the
    /// fetches instead.
    pub fn fetch_bundles(
        &mut self,
        host: &mut dyn HostRuntime,
        peer: &str,
    ) -> Result<(), SessionError> {
        let bare = jid::bare(peer).to_owned();
        let devices = self.directory.devices_for(&bare);
        if devices.is_empty() {
            debug!(
                target: "om_session",
                event = "bundle_fetch_deferred",
                peer = %bare,
            );
            return Ok(());
        }
        for device_id in devices {
            let req_id = self.request_ids.next_id("bundle-req");
            let stanza = bundle::build_query(&self.account.fulljid, &bare, &req_id, device_id)?;
            self.pending.insert(
                req_id,
                PendingKind::BundleFetch {
                    peer: bare.clone(),
                    device_id,
                },
            );
            host.send_stanza(&stanza);
        }
        Ok(())
    }

    /// Stop encrypting to `peer`. The chat stays registered; an inbound
    /// encrypted message re-activates it.
    pub fn end_conversation(&mut self, peer: &str) {
        let bare = jid::bare(peer);
        self.chats.deactivate(bare);
        info!(target: "om_session", event = "conversation_ended", peer = %bare);
    }
}
