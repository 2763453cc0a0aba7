//! Encrypted message envelope: one wrapped content key per recipient
//! device, an IV, and the AEAD payload.
//!
//! The builder is purely a serialization boundary; per-device fan-out is
//! decided by the crypto engine that produced the [`Envelope`].

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{error::StanzaError, ns, xml};

/// The wire structure inside `<encrypted>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Sending device's ID (`sid` on the header).
    pub sender_device_id: u32,
    pub iv: Vec<u8>,
    /// Wrapped content key per recipient device (`rid` keyed).
    pub keys: BTreeMap<u32, Vec<u8>>,
    pub payload: Vec<u8>,
}

/// An envelope unpacked from an inbound message stanza.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEnvelope {
    /// Sender as written on the stanza (may carry a resource).
    pub sender: String,
    pub envelope: Envelope,
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Recognized as encrypted but the required structure is absent.
    #[error("encrypted stanza is missing its {0}")]
    Missing(&'static str),

    #[error("invalid {field} value '{value}'")]
    InvalidValue { field: &'static str, value: String },

    #[error(transparent)]
    Stanza(#[from] StanzaError),
}

/// Unpack an inbound encrypted stanza into the decrypt input record.
pub fn unpack(raw: &str) -> Result<InboundEnvelope, EnvelopeError> {
    let doc = xml::parse(raw)?;
    let root = doc.root_element();

    let sender = root
        .attribute("from")
        .ok_or(EnvelopeError::Missing("sender"))?;

    let encrypted =
        xml::find(root, ns::OMEMO, "encrypted").ok_or(EnvelopeError::Missing("encrypted node"))?;
    let header =
        xml::find(encrypted, ns::OMEMO, "header").ok_or(EnvelopeError::Missing("header"))?;

    let raw_sid = header.attribute("sid").ok_or(EnvelopeError::Missing("sid"))?;
    let sender_device_id: u32 = raw_sid.parse().map_err(|_| EnvelopeError::InvalidValue {
        field: "sid",
        value: raw_sid.to_string(),
    })?;

    let iv_node = xml::find(header, ns::OMEMO, "iv").ok_or(EnvelopeError::Missing("iv"))?;
    let iv = b64_text(iv_node, "iv")?;

    let mut keys = BTreeMap::new();
    for key in header
        .children()
        .filter(|n| n.has_tag_name((ns::OMEMO, "key")))
    {
        let raw_rid = key.attribute("rid").ok_or(EnvelopeError::Missing("rid"))?;
        let rid: u32 = raw_rid.parse().map_err(|_| EnvelopeError::InvalidValue {
            field: "rid",
            value: raw_rid.to_string(),
        })?;
        keys.insert(rid, b64_text(key, "key")?);
    }

    let payload_node =
        xml::find(encrypted, ns::OMEMO, "payload").ok_or(EnvelopeError::Missing("payload"))?;
    let payload = b64_text(payload_node, "payload")?;

    Ok(InboundEnvelope {
        sender: sender.to_string(),
        envelope: Envelope {
            sender_device_id,
            iv,
            keys,
            payload,
        },
    })
}

/// Serialize an engine-produced envelope into an outbound chat message.
///
/// Carries a `<store/>` hint so offline servers keep the ciphertext.
pub fn build_message(
    to_jid: &str,
    from_fulljid: &str,
    msg_id: &str,
    envelope: &Envelope,
) -> Result<String, StanzaError> {
    let keys: String = envelope
        .keys
        .iter()
        .map(|(rid, key)| format!(r#"<key rid="{rid}">{key}</key>"#, key = BASE64.encode(key)))
        .collect();

    xml::validated(format!(
        r#"<message to="{to}" from="{from}" id="{id}" type="chat"><encrypted xmlns="{omemo}"><header sid="{sid}">{keys}<iv>{iv}</iv></header><payload>{payload}</payload></encrypted><store xmlns="{hints}"/></message>"#,
        to = xml::escape(to_jid),
        from = xml::escape(from_fulljid),
        id = xml::escape(msg_id),
        omemo = ns::OMEMO,
        sid = envelope.sender_device_id,
        iv = BASE64.encode(&envelope.iv),
        payload = BASE64.encode(&envelope.payload),
        hints = ns::HINTS,
    ))
}

/// An outgoing plain `<message>` with a body, as handed over by the host
/// before delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingPlain {
    /// Recipient as addressed by the host (may carry a resource).
    pub to: String,
    pub body: String,
}

/// Pull recipient and plaintext body out of an outgoing message stanza.
///
/// Returns `Ok(None)` when the stanza carries no body or no recipient;
/// nothing for this layer to encrypt, the host proceeds normally.
pub fn outgoing_plaintext(raw: &str) -> Result<Option<OutgoingPlain>, StanzaError> {
    let doc = xml::parse(raw)?;
    let root = doc.root_element();
    if root.tag_name().name() != "message" {
        return Ok(None);
    }

    let to = match root.attribute("to") {
        Some(to) => to,
        None => return Ok(None),
    };
    // Hosts emit <body> with or without the jabber:client namespace; match
    // on the local name.
    let body = root
        .descendants()
        .find(|n| n.tag_name().name() == "body")
        .and_then(|n| n.text());
    let body = match body {
        Some(body) => body,
        None => return Ok(None),
    };

    Ok(Some(OutgoingPlain {
        to: to.to_string(),
        body: body.to_string(),
    }))
}

fn b64_text(node: roxmltree::Node<'_, '_>, element: &'static str) -> Result<Vec<u8>, EnvelopeError> {
    let text: String = node
        .text()
        .ok_or(EnvelopeError::Missing(element))?
        .split_ascii_whitespace()
        .collect();
    BASE64
        .decode(text.as_bytes())
        .map_err(|source| EnvelopeError::Stanza(StanzaError::BadBase64 { element, source }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_envelope() -> Envelope {
        Envelope {
            sender_device_id: 1461841909,
            iv: vec![0xa; 16],
            keys: BTreeMap::from([(1260459496, vec![1, 2, 3]), (42, vec![4, 5])]),
            payload: b"ciphertext".to_vec(),
        }
    }

    #[test]
    fn build_then_unpack_round_trips() {
        let envelope = sample_envelope();
        let stanza =
            build_message("b@x", "a@x/res", "msg-1", &envelope).unwrap();
        let inbound = unpack(&stanza).unwrap();
        assert_eq!(inbound.sender, "a@x/res");
        assert_eq!(inbound.envelope, envelope);
    }

    #[test]
    fn message_addresses_and_key_count() {
        let envelope = sample_envelope();
        let stanza = build_message("b@x", "a@x/res", "msg-1", &envelope).unwrap();
        let doc = roxmltree::Document::parse(&stanza).unwrap();
        let root = doc.root_element();
        assert_eq!(root.attribute("to"), Some("b@x"));
        assert_eq!(root.attribute("from"), Some("a@x/res"));
        let keys = root
            .descendants()
            .filter(|n| n.tag_name().name() == "key")
            .count();
        assert_eq!(keys, envelope.keys.len());
        assert!(stanza.contains(r#"<store xmlns="urn:xmpp:hints"/>"#));
    }

    #[test]
    fn missing_header_is_malformed_envelope() {
        let stanza = build_message("b@x", "a@x/r", "m-1", &sample_envelope()).unwrap();
        let broken = stanza
            .replace("<header", "<haeder")
            .replace("</header>", "</haeder>");
        assert!(matches!(
            unpack(&broken),
            Err(EnvelopeError::Missing("header"))
        ));
    }

    #[test]
    fn missing_payload_is_malformed_envelope() {
        let stanza = build_message("b@x", "a@x/r", "m-1", &sample_envelope()).unwrap();
        let broken = stanza
            .replace("<payload>", "<p>")
            .replace("</payload>", "</p>");
        assert!(matches!(
            unpack(&broken),
            Err(EnvelopeError::Missing("payload"))
        ));
    }

    #[test]
    fn outgoing_plaintext_extracts_body() {
        let raw = r#"<message to="b@x/r" type="chat"><body>hi there</body></message>"#;
        let plain = outgoing_plaintext(raw).unwrap().unwrap();
        assert_eq!(plain.to, "b@x/r");
        assert_eq!(plain.body, "hi there");
    }

    #[test]
    fn outgoing_without_body_is_passed_over() {
        let raw = r#"<message to="b@x"><composing xmlns="http://jabber.org/protocol/chatstates"/></message>"#;
        assert!(outgoing_plaintext(raw).unwrap().is_none());
        assert!(outgoing_plaintext("<presence/>").unwrap().is_none());
    }
}
