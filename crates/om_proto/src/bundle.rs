//! Key-bundle wire shapes: per-device PEP publish, fetch query, and the
//! parsed response.
//!
//! A bundle is transient here; it travels from a peer's PEP node straight
//! into the crypto engine's session build; persistence belongs to the key
//! store behind the engine.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use roxmltree::Node;
use serde::{Deserialize, Serialize};

use crate::{error::StanzaError, jid, ns, xml};

/// Public key material a device publishes so others can start a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBundle {
    pub signed_prekey_id: u32,
    pub signed_prekey_public: Vec<u8>,
    pub signed_prekey_signature: Vec<u8>,
    pub identity_key: Vec<u8>,
    /// One-time prekeys, order preserved as published.
    pub prekeys: Vec<(u32, Vec<u8>)>,
}

/// A peer's answer to a bundle fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleResponse {
    /// Bare address of the publishing account.
    pub sender: String,
    /// Device the bundle belongs to, taken from the PEP node name suffix.
    pub device_id: u32,
    pub bundle: KeyBundle,
}

/// Parse a bundle IQ result.
pub fn parse_response(raw: &str) -> Result<BundleResponse, StanzaError> {
    let doc = xml::parse(raw)?;
    let root = doc.root_element();

    let sender = root
        .attribute("from")
        .ok_or(StanzaError::MissingAttribute("from"))?;

    // Results carry <items>; an echoed publish carries <publish>. Both name
    // the per-device node the same way.
    let items = xml::find(root, ns::PUBSUB, "items")
        .or_else(|| xml::find(root, ns::PUBSUB, "publish"))
        .ok_or(StanzaError::MissingElement("items"))?;
    let node_name = items
        .attribute("node")
        .ok_or(StanzaError::MissingAttribute("node"))?;
    let raw_device_id = node_name.rsplit(':').next().unwrap_or(node_name);
    let device_id: u32 = raw_device_id
        .parse()
        .map_err(|_| StanzaError::InvalidValue {
            field: "bundle node device id",
            value: raw_device_id.to_string(),
        })?;

    Ok(BundleResponse {
        sender: jid::bare(sender).to_string(),
        device_id,
        bundle: parse_bundle_node(root)?,
    })
}

/// Extract a [`KeyBundle`] from any scope containing a `<bundle>` element.
pub fn parse_bundle_node(scope: Node<'_, '_>) -> Result<KeyBundle, StanzaError> {
    let bundle = xml::find(scope, ns::OMEMO, "bundle").ok_or(StanzaError::MissingElement("bundle"))?;

    let spk = xml::find(bundle, ns::OMEMO, "signedPreKeyPublic")
        .ok_or(StanzaError::MissingElement("signedPreKeyPublic"))?;
    let raw_spk_id = spk
        .attribute("signedPreKeyId")
        .ok_or(StanzaError::MissingAttribute("signedPreKeyId"))?;
    let signed_prekey_id: u32 = raw_spk_id.parse().map_err(|_| StanzaError::InvalidValue {
        field: "signedPreKeyId",
        value: raw_spk_id.to_string(),
    })?;

    let signature = xml::find(bundle, ns::OMEMO, "signedPreKeySignature")
        .ok_or(StanzaError::MissingElement("signedPreKeySignature"))?;
    let identity = xml::find(bundle, ns::OMEMO, "identityKey")
        .ok_or(StanzaError::MissingElement("identityKey"))?;

    let prekeys_node =
        xml::find(bundle, ns::OMEMO, "prekeys").ok_or(StanzaError::MissingElement("prekeys"))?;
    let mut prekeys = Vec::new();
    for prekey in prekeys_node
        .children()
        .filter(|n| n.has_tag_name((ns::OMEMO, "preKeyPublic")))
    {
        let raw_id = prekey
            .attribute("preKeyId")
            .ok_or(StanzaError::MissingAttribute("preKeyId"))?;
        let id: u32 = raw_id.parse().map_err(|_| StanzaError::InvalidValue {
            field: "preKeyId",
            value: raw_id.to_string(),
        })?;
        prekeys.push((id, b64_text(prekey, "preKeyPublic")?));
    }

    Ok(KeyBundle {
        signed_prekey_id,
        signed_prekey_public: b64_text(spk, "signedPreKeyPublic")?,
        signed_prekey_signature: b64_text(signature, "signedPreKeySignature")?,
        identity_key: b64_text(identity, "identityKey")?,
        prekeys,
    })
}

/// Publish our own bundle under `{bundles-ns}:{device_id}`.
pub fn build_publish(
    from_jid: &str,
    req_id: &str,
    device_id: u32,
    bundle: &KeyBundle,
) -> Result<String, StanzaError> {
    let prekeys: String = bundle
        .prekeys
        .iter()
        .map(|(id, key)| {
            format!(
                r#"<preKeyPublic preKeyId="{id}">{key}</preKeyPublic>"#,
                key = BASE64.encode(key)
            )
        })
        .collect();

    xml::validated(format!(
        r#"<iq from="{from}" type="set" id="{id}"><pubsub xmlns="{pubsub}"><publish node="{bundles}:{device_id}"><item><bundle xmlns="{omemo}"><signedPreKeyPublic signedPreKeyId="{spk_id}">{spk}</signedPreKeyPublic><signedPreKeySignature>{sig}</signedPreKeySignature><identityKey>{ik}</identityKey><prekeys>{prekeys}</prekeys></bundle></item></publish></pubsub></iq>"#,
        from = xml::escape(from_jid),
        id = xml::escape(req_id),
        pubsub = ns::PUBSUB,
        bundles = ns::BUNDLES,
        omemo = ns::OMEMO,
        spk_id = bundle.signed_prekey_id,
        spk = BASE64.encode(&bundle.signed_prekey_public),
        sig = BASE64.encode(&bundle.signed_prekey_signature),
        ik = BASE64.encode(&bundle.identity_key),
    ))
}

/// Fetch one device's bundle from a peer.
pub fn build_query(
    from_jid: &str,
    to_jid: &str,
    req_id: &str,
    device_id: u32,
) -> Result<String, StanzaError> {
    xml::validated(format!(
        r#"<iq type="get" from="{from}" to="{to}" id="{id}"><pubsub xmlns="{pubsub}"><items node="{bundles}:{device_id}"/></pubsub></iq>"#,
        from = xml::escape(from_jid),
        to = xml::escape(to_jid),
        id = xml::escape(req_id),
        pubsub = ns::PUBSUB,
        bundles = ns::BUNDLES,
    ))
}

/// Decode a node's base64 text content, tolerating line-wrapped material.
fn b64_text(node: Node<'_, '_>, element: &'static str) -> Result<Vec<u8>, StanzaError> {
    let text: String = node
        .text()
        .ok_or(StanzaError::MissingElement(element))?
        .split_ascii_whitespace()
        .collect();
    BASE64
        .decode(text.as_bytes())
        .map_err(|source| StanzaError::BadBase64 { element, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bundle() -> KeyBundle {
        KeyBundle {
            signed_prekey_id: 5,
            signed_prekey_public: vec![1, 2, 3, 4],
            signed_prekey_signature: vec![9, 9, 9],
            identity_key: vec![7, 7],
            prekeys: vec![(12, vec![1]), (3, vec![2, 2]), (25, vec![3, 3, 3])],
        }
    }

    #[test]
    fn publish_then_parse_round_trips_all_fields() {
        let bundle = sample_bundle();
        let stanza = build_publish("me@yakshed.org", "announce-bundle-1", 4711, &bundle).unwrap();
        let response = parse_response(&stanza).unwrap();
        assert_eq!(response.sender, "me@yakshed.org");
        assert_eq!(response.device_id, 4711);
        // Includes prekey ordering.
        assert_eq!(response.bundle, bundle);
    }

    #[test]
    fn response_sender_is_bare() {
        let stanza =
            build_publish("me@yakshed.org/phone", "announce-bundle-1", 1, &sample_bundle())
                .unwrap();
        assert_eq!(parse_response(&stanza).unwrap().sender, "me@yakshed.org");
    }

    #[test]
    fn tolerates_line_wrapped_base64() {
        let stanza = build_publish("me@x", "r-1", 1, &sample_bundle())
            .unwrap()
            .replace("<identityKey>", "<identityKey>\n    ");
        let response = parse_response(&stanza).unwrap();
        assert_eq!(response.bundle.identity_key, vec![7, 7]);
    }

    #[test]
    fn missing_prekeys_is_an_error() {
        let stanza = build_publish("me@x", "r-1", 1, &sample_bundle()).unwrap();
        let broken = stanza.replace("<prekeys>", "<hmm>").replace("</prekeys>", "</hmm>");
        assert!(matches!(
            parse_response(&broken),
            Err(StanzaError::MissingElement("prekeys"))
        ));
    }

    #[test]
    fn bad_device_id_in_node_name_is_rejected() {
        let stanza = build_publish("me@x", "r-1", 1, &sample_bundle())
            .unwrap()
            .replace("bundles:1", "bundles:one");
        assert!(parse_response(&stanza).is_err());
    }

    // Bundles are serde-serializable so the host's key store can persist
    // them alongside the engine's session state.
    #[test]
    fn bundle_survives_serde() {
        let bundle = sample_bundle();
        let json = serde_json::to_string(&bundle).unwrap();
        let back: KeyBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bundle);
    }

    #[test]
    fn query_targets_the_device_node() {
        let stanza = build_query("me@x/r", "peer@x", "bundle-req-2", 259621345).unwrap();
        assert!(stanza.contains("eu.siacs.conversations.axolotl.bundles:259621345"));
        assert!(roxmltree::Document::parse(&stanza).is_ok());
    }
}
