//! Identity types for stored artifacts

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Prefix used by [`compute_content_digest`].
pub const DIGEST_PREFIX: &str = "sha256:";

/// Hierarchical artifact identifier, e.g. `root/child/key`.
///
/// Identifiers are normalised on construction so that joining behaves like a
/// filesystem path join: `root.join("a").join("k")` and `root.join("a/k")`
/// resolve to the same identifier and therefore alias the same storage slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Create a normalised identifier.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(normalize(raw.as_ref()))
    }

    /// Join a child segment (which may itself contain `/`).
    ///
    /// Leading `/` on the segment is ignored, so the result always stays
    /// under the current path. Only a root identifier can be absolute.
    pub fn join(&self, segment: impl AsRef<str>) -> Self {
        let segment = segment.as_ref().trim_start_matches('/');
        if self.0.is_empty() {
            return Self::new(segment);
        }
        Self::new(format!("{}/{}", self.0, segment))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn normalize(raw: &str) -> String {
    let absolute = raw.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in raw.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                // Never climb above the root of the identifier.
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push(part);
                }
            }
            _ => parts.push(part),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Identifier {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for Identifier {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

/// Compute the SHA-256 digest of content as `sha256:<hex>`.
pub fn compute_content_digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{}", DIGEST_PREFIX, hex::encode(hasher.finalize()))
}
