use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Cache address of a provider response: `<sequence>_<sha256 of prompt bytes>`.
///
/// The key is a pure function of the sequence number and the exact prompt
/// bytes, so replaying the same prompt for the same requirement always
/// lands on the same entry.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Hash the prompt bytes and prefix the digest with the sequence number.
    pub fn compute(sequence: usize, prompt: &[u8]) -> Self {
        let digest = Sha256::digest(prompt);
        Self(format!("{}_{}", sequence, hex::encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Sequence number the key was computed for.
    pub fn sequence(&self) -> usize {
        self.0
            .split_once('_')
            .and_then(|(seq, _)| seq.parse().ok())
            .unwrap_or_default()
    }

    /// Name of the file holding the cached response.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }

    /// Sequence plus the first 8 digest chars, used in log lines.
    pub fn short(&self) -> &str {
        let end = self.0.find('_').map(|i| i + 9).unwrap_or(self.0.len());
        &self.0[..end.min(self.0.len())]
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({})", self.short())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
