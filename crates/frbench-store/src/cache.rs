use crate::error::StoreError;
use frbench_core::hash::CacheKey;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-backed store of raw provider responses.
///
/// Entries live at `<base>/<sequence>_<sha256>.json`. There is no in-memory
/// layer: every lookup reads durable storage, so the cache survives restarts
/// and is shared between runs. Writes are atomic (temp file + rename).
#[derive(Debug, Clone)]
pub struct ResponseCache {
    base: PathBuf,
}

impl ResponseCache {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Partition of `root` owned by one provider/model pair:
    /// `<root>/<provider>/<model>`.
    pub fn for_model(root: impl AsRef<Path>, provider: &str, model: &str) -> Self {
        Self::new(root.as_ref().join(provider).join(model))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.base.join(key.file_name())
    }

    /// Read a cached response. Any read failure counts as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<Vec<u8>> {
        match fs::read(self.entry_path(key)) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    debug!(key = key.short(), error = %e, "cache read failed, treating as miss");
                }
                None
            }
        }
    }

    /// Store a response, replacing any previous entry for the key.
    pub fn put(&self, key: &CacheKey, bytes: &[u8]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.base)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.persist(self.entry_path(key))
            .map_err(|e| StoreError::Io(e.error))?;

        debug!(key = key.short(), bytes = bytes.len(), "cached response");
        Ok(())
    }

    /// Remove one entry. Fails if the entry does not exist.
    pub fn delete(&self, key: &CacheKey) -> Result<(), StoreError> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::CacheEntryNotFound(key.to_string()))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Remove the whole partition recursively. A missing partition is not an error.
    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_dir_all(&self.base) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_in(dir: &tempfile::TempDir) -> ResponseCache {
        ResponseCache::for_model(dir.path().join("cache"), "anth", "claude-3-haiku-20240307")
    }

    #[test]
    fn put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        let key = CacheKey::compute(1, b"prompt");

        cache.put(&key, b"{\"content\":[]}").unwrap();
        assert_eq!(cache.get(&key).unwrap(), b"{\"content\":[]}");
    }

    #[test]
    fn layout_is_provider_model_key() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        let key = CacheKey::compute(2, b"prompt");
        cache.put(&key, b"{}").unwrap();

        let expected = dir
            .path()
            .join("cache/anth/claude-3-haiku-20240307")
            .join(format!("{}.json", key.as_str()));
        assert!(expected.is_file());
    }

    #[test]
    fn get_missing_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        assert!(cache.get(&CacheKey::compute(1, b"nothing")).is_none());
    }

    #[test]
    fn put_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        let key = CacheKey::compute(1, b"p");
        cache.put(&key, b"first").unwrap();
        cache.put(&key, b"second").unwrap();
        assert_eq!(cache.get(&key).unwrap(), b"second");
    }

    #[test]
    fn delete_then_get_misses() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        let key = CacheKey::compute(1, b"p");
        cache.put(&key, b"data").unwrap();

        cache.delete(&key).unwrap();
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn delete_missing_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        let result = cache.delete(&CacheKey::compute(1, b"p"));
        assert!(matches!(result, Err(StoreError::CacheEntryNotFound(_))));
    }

    #[test]
    fn clear_removes_partition_only() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("cache");
        let a = ResponseCache::for_model(&root, "openai", "gpt-4o");
        let b = ResponseCache::for_model(&root, "openai", "gpt-4o-mini");
        let key = CacheKey::compute(1, b"p");
        a.put(&key, b"a").unwrap();
        b.put(&key, b"b").unwrap();

        a.clear().unwrap();
        assert!(a.get(&key).is_none());
        assert_eq!(b.get(&key).unwrap(), b"b");
        // clearing twice is fine
        a.clear().unwrap();
    }

    #[test]
    fn partitions_do_not_share_entries() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("cache");
        let a = ResponseCache::for_model(&root, "google", "gemini-1.5-pro-001");
        let b = ResponseCache::for_model(&root, "google", "gemini-1.5-flash-latest");
        let key = CacheKey::compute(3, b"same prompt");
        a.put(&key, b"answer").unwrap();
        assert!(b.get(&key).is_none());
    }
}
