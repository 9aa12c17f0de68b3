use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One normalized job posting extracted from a board document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub company: String,
    pub role: String,
    pub location: String,
    /// Application URL, when the row carried one.
    pub link: Option<String>,
    /// Identifier of the board the posting came from.
    pub source: String,
}

impl Posting {
    pub fn key(&self) -> PostingKey {
        PostingKey::for_fields(&self.company, &self.role, &self.location)
    }
}

/// Deduplication identity of a posting. Derived, never assigned: two rows
/// with the same company, role, and location are the same posting even when
/// their link markup differs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostingKey(String);

impl PostingKey {
    /// Hash of the lowercased, trimmed field tuple. md5 is used as a cheap
    /// stable 128-bit digest; nothing here is a security boundary.
    pub fn for_fields(company: &str, role: &str, location: &str) -> Self {
        let canonical = format!(
            "{}_{}_{}",
            company.trim().to_lowercase(),
            role.trim().to_lowercase(),
            location.trim().to_lowercase()
        );
        Self(format!("{:x}", md5::compute(canonical.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Postings last seen for one source, keyed for deduplication.
pub type SourceSnapshot = BTreeMap<PostingKey, Posting>;

/// Aggregate persisted state: one sub-map per monitored source.
pub type Snapshot = BTreeMap<String, SourceSnapshot>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_ignores_case_and_surrounding_whitespace() {
        let a = PostingKey::for_fields("  Acme Corp ", "SWE Intern", " New York, NY");
        let b = PostingKey::for_fields("acme corp", "swe intern", "new york, ny");
        assert_eq!(a, b);
    }

    #[test]
    fn key_separates_fields() {
        let a = PostingKey::for_fields("Acme", "SWE", "NY");
        let b = PostingKey::for_fields("Acme", "SWE NY", "");
        assert_ne!(a, b);
    }

    #[test]
    fn link_does_not_affect_identity() {
        let base = Posting {
            company: "Acme".to_string(),
            role: "SWE Intern".to_string(),
            location: "NY".to_string(),
            link: Some("https://a.example".to_string()),
            source: "org/board".to_string(),
        };
        let mut relisted = base.clone();
        relisted.link = None;
        assert_eq!(base.key(), relisted.key());
    }
}
