//! Content fingerprints for attribute sets.

use sha2::{Digest, Sha256};

/// Incremental SHA-256 fingerprint over tagged, separated components.
///
/// Every component is prefixed with a one-byte tag and terminated with a NUL
/// so that `("ab", "c")` and `("a", "bc")` never collide.
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    pub fn new() -> Self {
        Fingerprint {
            hasher: Sha256::new(),
        }
    }

    /// Add a string component under the given tag.
    pub fn update_tagged(&mut self, tag: u8, s: &str) -> &mut Self {
        self.hasher.update([tag]);
        self.hasher.update(s.as_bytes());
        self.hasher.update(b"\0");
        self
    }

    /// Add an untagged string component.
    pub fn update_str(&mut self, s: &str) -> &mut Self {
        self.update_tagged(b's', s)
    }

    /// Finalize as a lowercase hex string.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self::new()
    }
}
