//! In-memory `Store` backed by `dashmap`, used by the test suite.

use dashmap::DashMap;

use crate::error::FsError;
use crate::ident::Id;
use crate::store::Store;

#[derive(Default)]
pub struct MemoryStore {
    map: DashMap<Id, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &Id) -> Result<Option<Vec<u8>>, FsError> {
        Ok(self.map.get(key).map(|v| v.clone()))
    }

    fn put(&self, key: &Id, value: &[u8]) -> Result<(), FsError> {
        self.map.insert(*key, value.to_vec());
        Ok(())
    }

    fn append(&self, key: &Id, value: &[u8]) -> Result<(), FsError> {
        self.map.entry(*key).or_default().extend_from_slice(value);
        Ok(())
    }

    fn delete(&self, key: &Id) -> Result<(), FsError> {
        self.map.remove(key);
        Ok(())
    }
}
