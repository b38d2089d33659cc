//! The embedded key/value store adapter.
//!
//! This is the one seam the core filesystem engine talks through to reach
//! persistence. Two implementations exist: [`memory::MemoryStore`] (used by
//! the test suite) and [`sled_store::SledStore`] (the real backend used by
//! `kvfsd`).

pub mod memory;
pub mod sled_store;

use crate::error::FsError;
use crate::ident::Id;

/// Minimal contract the core needs from the embedded store: point lookup,
/// size probe, whole-value replace, append, and delete.
pub trait Store: Send + Sync {
    fn get(&self, key: &Id) -> Result<Option<Vec<u8>>, FsError>;

    fn get_size(&self, key: &Id) -> Result<Option<u64>, FsError> {
        Ok(self.get(key)?.map(|v| v.len() as u64))
    }

    fn put(&self, key: &Id, value: &[u8]) -> Result<(), FsError>;

    /// Append `value` to whatever is currently stored under `key` (treating
    /// an absent key as empty). Implementations need not be atomic with
    /// respect to concurrent writers — the core's serial delivery model
    /// makes that unnecessary.
    fn append(&self, key: &Id, value: &[u8]) -> Result<(), FsError>;

    fn delete(&self, key: &Id) -> Result<(), FsError>;
}
