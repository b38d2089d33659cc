//! `sled`-backed `Store` used by the `kvfsd` binary for real mounts.

use std::path::Path;

use crate::error::FsError;
use crate::ident::Id;
use crate::store::Store;

pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FsError> {
        let db = sled::open(path).map_err(FsError::from)?;
        Ok(SledStore { db })
    }
}

impl Store for SledStore {
    fn get(&self, key: &Id) -> Result<Option<Vec<u8>>, FsError> {
        Ok(self.db.get(key.0).map_err(FsError::from)?.map(|ivec| ivec.to_vec()))
    }

    fn put(&self, key: &Id, value: &[u8]) -> Result<(), FsError> {
        self.db.insert(key.0, value).map_err(FsError::from)?;
        Ok(())
    }

    fn append(&self, key: &Id, value: &[u8]) -> Result<(), FsError> {
        let mut current = self.get(key)?.unwrap_or_default();
        current.extend_from_slice(value);
        self.put(key, &current)
    }

    fn delete(&self, key: &Id) -> Result<(), FsError> {
        self.db.remove(key.0).map_err(FsError::from)?;
        Ok(())
    }
}
