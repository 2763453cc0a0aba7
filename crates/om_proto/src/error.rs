//! Codec error taxonomy.
//!
//! `Malformed` covers input that is not well-formed XML at all; the other
//! variants cover recognized stanzas with missing or invalid pieces. None
//! of these are retried anywhere; recovery is the host's concern.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StanzaError {
    #[error("stanza is not well-formed XML: {0}")]
    Malformed(String),

    #[error("missing <{0}> element")]
    MissingElement(&'static str),

    #[error("missing '{0}' attribute")]
    MissingAttribute(&'static str),

    #[error("invalid {field} value '{value}'")]
    InvalidValue { field: &'static str, value: String },

    #[error("invalid base64 in <{element}>: {source}")]
    BadBase64 {
        element: &'static str,
        source: base64::DecodeError,
    },
}
