//! Protocol namespace constants.
//!
//! The legacy `eu.siacs.conversations.axolotl` family is what deployed
//! OMEMO clients actually speak, so that is what we emit and match.

/// OMEMO payload namespace (`<list>`, `<bundle>`, `<encrypted>`).
pub const OMEMO: &str = "eu.siacs.conversations.axolotl";

/// PEP node carrying an account's device list.
pub const DEVICE_LIST: &str = "eu.siacs.conversations.axolotl.devicelist";

/// Capability string advertised to receive device-list pushes.
pub const DEVICE_LIST_NOTIFY: &str = "eu.siacs.conversations.axolotl.devicelist+notify";

/// PEP node prefix for per-device key bundles (`{BUNDLES}:{device_id}`).
pub const BUNDLES: &str = "eu.siacs.conversations.axolotl.bundles";

pub const PUBSUB: &str = "http://jabber.org/protocol/pubsub";
pub const PUBSUB_EVENT: &str = "http://jabber.org/protocol/pubsub#event";

/// `<store/>` processing hint carried on outbound encrypted messages.
pub const HINTS: &str = "urn:xmpp:hints";
