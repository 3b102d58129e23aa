//! Gateway traits.

use async_trait::async_trait;
use crate::error::Result;
use crate::types::{CacheEntry, Fingerprint};

/// Response cache keyed by request fingerprint.
///
/// `get` and `set` are each atomic for a single key; nothing else is
/// guaranteed across calls.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Look up a previously computed entry.
    async fn get(&self, key: &Fingerprint) -> Result<Option<CacheEntry>>;

    /// Store an entry. A second write for the same key overwrites the first.
    async fn set(&self, key: &Fingerprint, entry: CacheEntry) -> Result<()>;
}
