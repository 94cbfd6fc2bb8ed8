//! Run-scoped body deduplication

use sha1::{Digest, Sha1};
use std::collections::HashSet;
use std::fmt;

/// SHA-1 of a decoded body, as lowercase hex
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Sha1::digest(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprints seen so far in one run, in insertion order
#[derive(Debug, Default)]
pub struct SeenFingerprints {
    order: Vec<Fingerprint>,
    index: HashSet<Fingerprint>,
}

impl SeenFingerprints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fingerprint; returns `false` if it was already present
    pub fn insert(&mut self, fingerprint: Fingerprint) -> bool {
        if self.index.contains(&fingerprint) {
            return false;
        }
        self.index.insert(fingerprint.clone());
        self.order.push(fingerprint);
        true
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.index.contains(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fingerprint> {
        self.order.iter()
    }
}
