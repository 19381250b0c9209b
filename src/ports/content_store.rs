//! Content Store Port - Content-Addressable Storage Interface
//!
//! Immutable `add` (content id derived from the bytes, pinned) plus
//! the three mutable-directory operations needed to keep a
//! latest-by-round-number mirror of the reports.

use async_trait::async_trait;

use crate::domain::artifact::ContentId;

/// Trait for content-addressable storage providers.
#[async_trait]
pub trait ContentStore: Send + Sync + 'static {
  /// Upload and pin `bytes` under a display `name`.
  ///
  /// Identical bytes always yield the identical content id.
  async fn add(&self, name: &str, bytes: Vec<u8>) -> anyhow::Result<ContentId>;

  /// Create a mutable directory (and its parents) if missing.
  async fn make_dir(&self, path: &str) -> anyhow::Result<()>;

  /// Remove a mutable path. Returns `false` if nothing was there.
  async fn remove(&self, path: &str) -> anyhow::Result<bool>;

  /// Link existing content at a mutable path.
  async fn link(&self, cid: &ContentId, path: &str) -> anyhow::Result<()>;

  /// Check if the store is reachable.
  async fn is_healthy(&self) -> bool;
}
