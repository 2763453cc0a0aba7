//! Per-category monotonic request IDs.
//!
//! IDs correlate a request stanza with its later response. They are unique
//! and observably increasing within a category for the lifetime of the
//! generator; collisions across categories are fine because the category
//! prefix disambiguates.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct RequestIdGenerator {
    last_seq: HashMap<String, u64>,
}

impl RequestIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next ID for `category`, e.g. `bundle-req-3`.
    pub fn next_id(&mut self, category: &str) -> String {
        let seq = self.last_seq.entry(category.to_string()).or_insert(0);
        *seq += 1;
        format!("{category}-{seq}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_within_category() {
        let mut gen = RequestIdGenerator::new();
        assert_eq!(gen.next_id("bundle-req"), "bundle-req-1");
        assert_eq!(gen.next_id("bundle-req"), "bundle-req-2");
        assert_eq!(gen.next_id("bundle-req"), "bundle-req-3");
    }

    #[test]
    fn categories_count_independently() {
        let mut gen = RequestIdGenerator::new();
        gen.next_id("devlist-req");
        gen.next_id("devlist-req");
        assert_eq!(gen.next_id("announce"), "announce-1");
        assert_eq!(gen.next_id("devlist-req"), "devlist-req-3");
    }
}
