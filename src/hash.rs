//! Content hashing for document sets
//!
//! A [`ChangeSignature`] is a hex-encoded SHA-256 digest over the sorted list
//! of logical paths of a document set. Each path is followed by a NUL byte so
//! that `["a/b", "c"]` and `["a", "b/c"]` produce different digests.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Entry separator fed to the digest after every path.
const SEPARATOR: u8 = 0;

/// Opaque fingerprint of a set of logical paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSignature(String);

impl ChangeSignature {
    /// Wrap a previously computed hex digest (e.g. one read back from state).
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(12);
        &self.0[..end]
    }
}

impl fmt::Display for ChangeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the signature of a collection of paths.
///
/// The input is sorted before hashing, so discovery order never affects the
/// result. An empty input yields the digest of zero bytes.
pub fn compute_signature<I, S>(paths: I) -> ChangeSignature
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut sorted: Vec<S> = paths.into_iter().collect();
    sorted.sort_by(|a, b| a.as_ref().cmp(b.as_ref()));

    let mut hasher = Sha256::new();
    for path in &sorted {
        hasher.update(path.as_ref().as_bytes());
        hasher.update([SEPARATOR]);
    }
    ChangeSignature(hex::encode(hasher.finalize()))
}
