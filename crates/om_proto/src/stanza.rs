//! Inbound stanza classification.
//!
//! Classification is structural, not substring-based: the stanza must be
//! well-formed XML, and the decision keys on namespace-qualified nodes and
//! exact PEP node names. First match wins; anything unrecognized is left
//! for the host's normal pipeline.

use roxmltree::Node;

use crate::{error::StanzaError, ns, xml};

/// What an inbound `<message>` stanza turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageClass {
    /// Device-list push via pubsub event.
    DeviceList,
    /// Carries an OMEMO `<encrypted>` element.
    Encrypted,
    /// Not ours; pass through.
    Other,
}

/// What an inbound `<iq>` stanza turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IqClass {
    /// Bundle fetch result (`{bundles-ns}:{device_id}` node).
    Bundle,
    /// Device-list query result.
    DeviceList,
    /// Not ours; pass through.
    Other,
}

pub fn classify_message(raw: &str) -> Result<MessageClass, StanzaError> {
    let doc = xml::parse(raw)?;
    let root = doc.root_element();

    if has_device_list_node(root) {
        return Ok(MessageClass::DeviceList);
    }
    if xml::find(root, ns::OMEMO, "encrypted").is_some() {
        return Ok(MessageClass::Encrypted);
    }
    Ok(MessageClass::Other)
}

pub fn classify_iq(raw: &str) -> Result<IqClass, StanzaError> {
    let doc = xml::parse(raw)?;
    let root = doc.root_element();

    if pep_nodes(root).any(|node| node.starts_with(ns::BUNDLES)) {
        return Ok(IqClass::Bundle);
    }
    if has_device_list_node(root) {
        return Ok(IqClass::DeviceList);
    }
    Ok(IqClass::Other)
}

/// The `id` attribute of a stanza, used to resolve pending requests.
pub fn stanza_id(raw: &str) -> Result<Option<String>, StanzaError> {
    let doc = xml::parse(raw)?;
    Ok(doc.root_element().attribute("id").map(str::to_string))
}

/// Exact match on the device-list node name. A capability advertisement
/// mentions `{device-list-ns}+notify` instead and therefore never matches
/// here; notify-only stanzas are not device-list updates.
fn has_device_list_node(root: Node<'_, '_>) -> bool {
    pep_nodes(root).any(|node| node == ns::DEVICE_LIST)
}

/// `node` attributes of pubsub containers (`<items>`/`<publish>`) anywhere
/// in the stanza.
fn pep_nodes<'a>(root: Node<'a, '_>) -> impl Iterator<Item = &'a str> {
    root.descendants().filter_map(|n| {
        let name = n.tag_name().name();
        if name == "items" || name == "publish" {
            n.attribute("node")
        } else {
            None
        }
    })
}
