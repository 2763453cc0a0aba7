//! om_proto: Wire types and stanza codec for the OMEMO orchestration layer
//!
//! Everything on the wire is an XML stanza fragment (XEP-0384 over PEP).
//! Parsing always validates well-formedness before any field extraction;
//! building is template-based and every assembled stanza re-validates
//! through the parser before it is handed to the transport.
//!
//! # Modules
//! - `ns`         : protocol namespace constants
//! - `jid`        : bare-address normalization
//! - `stanza`     : inbound stanza classification
//! - `device_list`: device-list wire shapes (parse + build)
//! - `bundle`     : key-bundle wire shapes (parse + build)
//! - `envelope`   : encrypted message envelope (pack + unpack)
//! - `request_id` : per-category monotonic request IDs
//! - `error`      : codec error taxonomy

pub mod bundle;
pub mod device_list;
pub mod envelope;
pub mod error;
pub mod jid;
pub mod ns;
pub mod request_id;
pub mod stanza;

mod xml;

pub use bundle::{BundleResponse, KeyBundle};
pub use device_list::DeviceListUpdate;
pub use envelope::{Envelope, EnvelopeError, InboundEnvelope, OutgoingPlain};
pub use error::StanzaError;
pub use request_id::RequestIdGenerator;
pub use stanza::{IqClass, MessageClass};
