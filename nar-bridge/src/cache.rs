use lru::LruCache;
use nar_bridge_store::Node;
use nix_compat::nixhash::NixHash;
use parking_lot::Mutex;
use std::{num::NonZeroUsize, sync::Arc};

/// What the NAR endpoint needs to know about a NAR, without asking the
/// backend again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NarCacheEntry {
    /// The (unnamed) root node.
    pub root_node: Node,
    pub nar_size: u64,
}

/// Maps a NAR hash, in its `sha256:…` string form, to [NarCacheEntry].
///
/// Populated when rendering narinfo, read when a NAR is requested. Holds at
/// most `capacity` entries, evicting the least recently used one.
#[derive(Clone)]
pub struct NarCache {
    inner: Arc<Mutex<LruCache<String, NarCacheEntry>>>,
}

impl NarCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Inserts or replaces the entry for `key`.
    pub fn put(&self, key: String, entry: NarCacheEntry) {
        self.inner.lock().put(key, entry);
    }

    /// Returns a copy of the entry for `key`, and marks it as recently used.
    pub fn get(&self, key: &str) -> Option<NarCacheEntry> {
        self.inner.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds the key a NAR is stored under in the [NarCache].
pub fn nar_hash_key(nar_sha256: &[u8; 32]) -> String {
    NixHash::Sha256(*nar_sha256).to_nix_nixbase32_string()
}
