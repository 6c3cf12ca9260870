//! Core types for Tallyspin

use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of a document in the remote store
///
/// Documents live in flat collections and are addressed by a
/// collection name plus a document id, `"counters/clicks"` being the
/// shared click tally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocKey {
    collection: String,
    id: String,
}

impl DocKey {
    /// Create a key from a collection name and document id
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// The collection this document belongs to
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The document id within its collection
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Schema of the shared counter document
///
/// A missing `count` field deserializes to 0, the same way a missing
/// document reads as a zero tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterDoc {
    /// Total accepted clicks across every client that shares the document
    #[serde(default)]
    pub count: u64,
}

impl CounterDoc {
    /// The document that should replace this one after a single click
    pub fn incremented(self) -> Self {
        Self {
            count: self.count.saturating_add(1),
        }
    }
}

/// Format a tally with thousands grouping for display (`1000` -> `"1,000"`)
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dockey_display() {
        let key = DocKey::new("counters", "clicks");
        assert_eq!(key.to_string(), "counters/clicks");
        assert_eq!(key.collection(), "counters");
        assert_eq!(key.id(), "clicks");
    }

    #[test]
    fn test_counter_doc_defaults_missing_count() {
        let doc: CounterDoc = serde_json::from_str("{}").unwrap();
        assert_eq!(doc.count, 0);

        let doc: CounterDoc = serde_json::from_str(r#"{"count": 42}"#).unwrap();
        assert_eq!(doc.count, 42);
    }

    #[test]
    fn test_counter_doc_incremented() {
        assert_eq!(CounterDoc { count: 0 }.incremented().count, 1);
        assert_eq!(CounterDoc { count: u64::MAX }.incremented().count, u64::MAX);
    }

    #[test]
    fn test_format_count_grouping() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(42), "42");
        assert_eq!(format_count(100), "100");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(999_999), "999,999");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }
}
