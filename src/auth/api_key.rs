//! Static API key allow-list.
//!
//! Long-lived operator-managed credentials, configured as a comma-separated
//! list (`MCP_API_KEYS`). Membership checks are constant-time per key so
//! response timing does not leak which configured key a candidate was
//! closest to.

use subtle::ConstantTimeEq;

/// An immutable set of static API keys, parsed once at startup.
#[derive(Clone, Default)]
pub struct ApiKeySet {
    keys: Vec<String>,
}

impl ApiKeySet {
    /// Parse a comma-separated key list. Entries are trimmed; empty
    /// entries are discarded.
    pub fn from_delimited(raw: &str) -> Self {
        let keys = raw
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        Self { keys }
    }

    /// Number of configured keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// `true` if no keys are configured; the validator then never accepts.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Check a candidate against every configured key.
    ///
    /// Each comparison is constant-time in the key bytes; a length
    /// mismatch counts as "no match" for that key and the scan continues
    /// rather than aborting.
    pub fn is_valid(&self, candidate: &str) -> bool {
        let candidate = candidate.as_bytes();
        let mut matched = false;
        for key in &self.keys {
            let key = key.as_bytes();
            let same = key.len() == candidate.len() && bool::from(candidate.ct_eq(key));
            matched |= same;
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trims_and_drops_empties() {
        let set = ApiKeySet::from_delimited(" alpha , ,beta,, gamma ");
        assert_eq!(set.len(), 3);
        assert!(set.is_valid("alpha"));
        assert!(set.is_valid("beta"));
        assert!(set.is_valid("gamma"));
        assert!(!set.is_valid(""));
        assert!(!set.is_valid(" alpha "));
    }

    #[test]
    fn empty_config_never_matches() {
        let set = ApiKeySet::from_delimited("");
        assert!(set.is_empty());
        assert!(!set.is_valid("anything"));
        assert!(!set.is_valid(""));
    }

    #[test]
    fn rejects_near_misses() {
        let set = ApiKeySet::from_delimited("super-secret-key");
        assert!(set.is_valid("super-secret-key"));
        // Different length
        assert!(!set.is_valid("super-secret-ke"));
        assert!(!set.is_valid("super-secret-key2"));
        // Same length, different bytes
        assert!(!set.is_valid("super-secret-keY"));
        // Prefix / suffix of the real key
        assert!(!set.is_valid("super"));
        assert!(!set.is_valid("key"));
    }

    #[test]
    fn scan_continues_past_length_mismatch() {
        // The first key has a different length than the candidate; the
        // second still matches.
        let set = ApiKeySet::from_delimited("short,much-longer-key");
        assert!(set.is_valid("much-longer-key"));
        assert!(set.is_valid("short"));
    }
}
