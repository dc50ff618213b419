//! Canonical hierarchical paths (`Default/10.0.0.0/8/10.0.1.0/24`,
//! `Internal/example.com`) and their content-addressed cache key.

use sha2::{Digest, Sha256};

/// A normalized hierarchical path: whitespace trimmed, no doubled or
/// trailing `/`. Two paths that are `Eq` are guaranteed to resolve to the
/// same cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalPath(String);

impl CanonicalPath {
    pub fn new(raw: &str) -> Self {
        let canonical = raw
            .trim()
            .split('/')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Self(canonical)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A stable content-address for this path, used as the resolver disk
    /// cache's filename so repeated runs amortize lookups across
    /// processes.
    pub fn content_address(&self, type_hint: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(type_hint.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.0.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl std::fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_slashes_and_whitespace() {
        let a = CanonicalPath::new("Default/ 10.0.0.0/8 //10.0.1.0/24");
        let b = CanonicalPath::new("Default/10.0.0.0/8/10.0.1.0/24");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "Default/10.0.0.0/8/10.0.1.0/24");
    }

    #[test]
    fn content_address_is_deterministic_and_type_scoped() {
        let path = CanonicalPath::new("Internal/example.com");
        let a = path.content_address("Zone");
        let b = path.content_address("Zone");
        let c = path.content_address("View");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
