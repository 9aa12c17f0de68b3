use super::record::{Posting, SourceSnapshot};

/// Compare freshly extracted postings against the stored set for one source.
///
/// Returns the postings whose key has not been seen before, in extraction
/// order, together with the full replacement snapshot for the source. Stale
/// entries simply fall out of the replacement map; removals are never
/// reported.
pub fn diff(current: &[Posting], stored: &SourceSnapshot) -> (Vec<Posting>, SourceSnapshot) {
    let mut fresh = Vec::new();
    let mut updated = SourceSnapshot::new();

    for posting in current {
        let key = posting.key();
        if !stored.contains_key(&key) {
            fresh.push(posting.clone());
        }
        updated.insert(key, posting.clone());
    }

    (fresh, updated)
}
