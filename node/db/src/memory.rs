// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{Error, Store};
use parking_lot::RwLock;
use std::collections::HashMap;

/// A thread-safe in-memory `HashMap` store.
#[derive(Debug, Default)]
pub struct MemoryDB {
    db: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl Store for MemoryDB {
    fn write<K, V>(&self, key: K, value: V) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.db
            .write()
            .insert(key.as_ref().to_vec(), value.as_ref().to_vec());
        Ok(())
    }

    fn delete<K>(&self, key: K) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
    {
        self.db.write().remove(key.as_ref());
        Ok(())
    }

    fn read<K>(&self, key: K) -> Result<Option<Vec<u8>>, Error>
    where
        K: AsRef<[u8]>,
    {
        Ok(self.db.read().get(key.as_ref()).cloned())
    }

    fn exists<K>(&self, key: K) -> Result<bool, Error>
    where
        K: AsRef<[u8]>,
    {
        Ok(self.db.read().contains_key(key.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_db_write_read() {
        let db = MemoryDB::default();
        let key = [1];
        let value = [1];
        assert!(!db.exists(key).unwrap());
        db.write(key, value).unwrap();
        assert!(db.exists(key).unwrap());
        assert_eq!(db.read(key).unwrap(), Some(value.to_vec()));
    }

    #[test]
    fn mem_db_delete() {
        let db = MemoryDB::default();
        let key = [0];
        db.write(key, [1]).unwrap();
        db.delete(key).unwrap();
        assert!(!db.exists(key).unwrap());
        assert_eq!(db.read(key).unwrap(), None);
    }
}
