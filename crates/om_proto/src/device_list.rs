//! Device-list wire shapes: the PEP publish, the query, and the update push.
//!
//! An update always carries the owner's complete device set; latest
//! snapshot wins, so consumers replace rather than merge.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{error::StanzaError, jid, ns, xml};

/// Parsed device-list update (push message or IQ query result).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceListUpdate {
    /// Bare address of the list owner.
    pub sender: String,
    pub device_ids: BTreeSet<u32>,
}

/// Extract sender and device set from a device-list stanza.
///
/// The sender is the stanza's `from`; some servers put it on the pubsub
/// `<event>` wrapper instead, so that is the fallback.
pub fn parse_update(raw: &str) -> Result<DeviceListUpdate, StanzaError> {
    let doc = xml::parse(raw)?;
    let root = doc.root_element();

    let sender = root
        .attribute("from")
        .or_else(|| {
            xml::find(root, ns::PUBSUB_EVENT, "event").and_then(|event| event.attribute("from"))
        })
        .ok_or(StanzaError::MissingAttribute("from"))?;

    let list = xml::find(root, ns::OMEMO, "list").ok_or(StanzaError::MissingElement("list"))?;

    let mut device_ids = BTreeSet::new();
    for device in list
        .children()
        .filter(|n| n.has_tag_name((ns::OMEMO, "device")))
    {
        let raw_id = device
            .attribute("id")
            .ok_or(StanzaError::MissingAttribute("id"))?;
        let id: u32 = raw_id.parse().map_err(|_| StanzaError::InvalidValue {
            field: "device id",
            value: raw_id.to_string(),
        })?;
        // Device IDs are positive integers.
        if id == 0 {
            return Err(StanzaError::InvalidValue {
                field: "device id",
                value: raw_id.to_string(),
            });
        }
        device_ids.insert(id);
    }

    Ok(DeviceListUpdate {
        sender: jid::bare(sender).to_string(),
        device_ids,
    })
}

/// Publish our own device set to the device-list PEP node.
pub fn build_publish(
    from_fulljid: &str,
    req_id: &str,
    device_ids: &BTreeSet<u32>,
) -> Result<String, StanzaError> {
    let devices: String = device_ids
        .iter()
        .map(|id| format!(r#"<device id="{id}"/>"#))
        .collect();

    xml::validated(format!(
        r#"<iq type="set" from="{from}" id="{id}"><pubsub xmlns="{pubsub}"><publish node="{node}"><item id="1"><list xmlns="{omemo}">{devices}</list></item></publish></pubsub></iq>"#,
        from = xml::escape(from_fulljid),
        id = xml::escape(req_id),
        pubsub = ns::PUBSUB,
        node = ns::DEVICE_LIST,
        omemo = ns::OMEMO,
    ))
}

/// Query a contact's device list (round-trip answered as an IQ result).
pub fn build_query(
    from_fulljid: &str,
    to_jid: &str,
    req_id: &str,
) -> Result<String, StanzaError> {
    xml::validated(format!(
        r#"<iq type="get" from="{from}" to="{to}" id="{id}"><pubsub xmlns="{pubsub}"><items node="{node}"/></pubsub></iq>"#,
        from = xml::escape(from_fulljid),
        to = xml::escape(to_jid),
        id = xml::escape(req_id),
        pubsub = ns::PUBSUB,
        node = ns::DEVICE_LIST,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const UPDATE: &str = r#"<message to="renevolution@yakshed.org/profanity" type="headline" from="bascht@yakshed.org"><event xmlns="http://jabber.org/protocol/pubsub#event"><items node="eu.siacs.conversations.axolotl.devicelist"><item id="1"><list xmlns="eu.siacs.conversations.axolotl"><device id="259621345"/><device id="584672103"/></list></item></items></event></message>"#;

    #[test]
    fn parses_push_update() {
        let update = parse_update(UPDATE).unwrap();
        assert_eq!(update.sender, "bascht@yakshed.org");
        assert_eq!(
            update.device_ids,
            BTreeSet::from([259621345, 584672103])
        );
    }

    #[test]
    fn sender_full_jid_is_normalized_to_bare() {
        let raw = UPDATE.replace(
            r#"from="bascht@yakshed.org""#,
            r#"from="bascht@yakshed.org/phone""#,
        );
        let update = parse_update(&raw).unwrap();
        assert_eq!(update.sender, "bascht@yakshed.org");
    }

    #[test]
    fn sender_falls_back_to_event_wrapper() {
        let raw = r#"<message type="headline"><event xmlns="http://jabber.org/protocol/pubsub#event" from="bascht@yakshed.org"><items node="eu.siacs.conversations.axolotl.devicelist"><item><list xmlns="eu.siacs.conversations.axolotl"><device id="7"/></list></item></items></event></message>"#;
        let update = parse_update(raw).unwrap();
        assert_eq!(update.sender, "bascht@yakshed.org");
    }

    #[test]
    fn rejects_missing_list() {
        let raw = r#"<message from="a@b"><event xmlns="http://jabber.org/protocol/pubsub#event"/></message>"#;
        assert!(matches!(
            parse_update(raw),
            Err(StanzaError::MissingElement("list"))
        ));
    }

    #[test]
    fn rejects_non_numeric_and_zero_ids() {
        let bad = UPDATE.replace("259621345", "owl");
        assert!(parse_update(&bad).is_err());
        let zero = UPDATE.replace("259621345", "0");
        assert!(parse_update(&zero).is_err());
    }

    #[test]
    fn publish_round_trips_through_parser() {
        let ids = BTreeSet::from([42, 7]);
        let stanza = build_publish("me@x/laptop", "announce-dl-1", &ids).unwrap();
        // A publish has no `from` fallback issue; reparse via the update
        // extractor to confirm the set survives intact.
        let reparsed = parse_update(&stanza).unwrap();
        assert_eq!(reparsed.device_ids, ids);
        assert_eq!(reparsed.sender, "me@x");
    }

    #[test]
    fn query_is_well_formed_and_escaped() {
        let stanza = build_query("me@x/r", "evil\"@x", "devlist-req-1").unwrap();
        assert!(stanza.contains("evil&quot;@x"));
        assert!(roxmltree::Document::parse(&stanza).is_ok());
    }
}
