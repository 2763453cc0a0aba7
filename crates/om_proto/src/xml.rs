//! Thin helpers over roxmltree, plus text escaping for the builders.
//!
//! Builders assemble stanzas from templates where every dynamic value lands
//! in a text or attribute position only, escaped; [`validated`] then re-runs
//! the parser over the result so nothing structurally broken ever reaches
//! the transport.

use roxmltree::{Document, Node};

use crate::error::StanzaError;

pub fn parse(raw: &str) -> Result<Document<'_>, StanzaError> {
    Document::parse(raw).map_err(|e| StanzaError::Malformed(e.to_string()))
}

/// First descendant of `scope` with the given namespace-qualified name.
pub fn find<'a, 'input>(
    scope: Node<'a, 'input>,
    ns: &str,
    name: &str,
) -> Option<Node<'a, 'input>> {
    scope.descendants().find(|n| n.has_tag_name((ns, name)))
}

/// Escape a dynamic value for insertion into a text or attribute position.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Re-validate an assembled stanza before hand-off.
pub fn validated(stanza: String) -> Result<String, StanzaError> {
    Document::parse(&stanza).map_err(|e| StanzaError::Malformed(e.to_string()))?;
    Ok(stanza)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(escape(r#"a<b>&"c'"#), "a&lt;b&gt;&amp;&quot;c&apos;");
    }

    #[test]
    fn parse_rejects_unbalanced_markup() {
        assert!(parse("<iq><pubsub></iq>").is_err());
        assert!(validated("<iq".to_string()).is_err());
    }

    #[test]
    fn find_matches_namespace_qualified_names() {
        let raw = r#"<m><list xmlns="urn:x"><device id="1"/></list></m>"#;
        let doc = parse(raw).unwrap();
        assert!(find(doc.root_element(), "urn:x", "list").is_some());
        assert!(find(doc.root_element(), "urn:y", "list").is_none());
    }
}
