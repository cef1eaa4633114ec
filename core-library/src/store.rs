//! Record store adapter
//!
//! Owns the boxed [`RecordStore`] bridge and decides when its handle is open.
//! The handle is opened lazily by whichever operation needs it and closed at
//! the end of that operation: after a single read or write outside a batch,
//! and always at [`end_batch`](RecordStoreAdapter::end_batch).

use bridge_traits::database::{RecordNumber, RecordStore, RecordStoreConfig};
use bytes::Bytes;
use std::path::Path;
use tracing::debug;

use crate::error::{LibraryError, Result};

pub struct RecordStoreAdapter {
    store: Box<dyn RecordStore>,
    config: RecordStoreConfig,
    in_batch: bool,
}

impl RecordStoreAdapter {
    pub fn new(store: Box<dyn RecordStore>, config: RecordStoreConfig) -> Self {
        Self {
            store,
            config,
            in_batch: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn is_open(&self) -> bool {
        self.store.is_open()
    }

    pub fn in_batch(&self) -> bool {
        self.in_batch
    }

    /// Open the store if it is not open yet
    pub fn open(&mut self) -> Result<()> {
        if !self.store.is_open() {
            self.store.open(&self.config.path, self.config.version)?;
            debug!(path = ?self.config.path, "Opened record store");
        }
        Ok(())
    }

    /// Close the store, ending any open batch first
    pub fn close(&mut self) -> Result<()> {
        if self.in_batch {
            self.in_batch = false;
            if self.store.is_open() {
                self.store.end_batch()?;
            }
        }
        if self.store.is_open() {
            self.store.close()?;
            debug!(path = ?self.config.path, "Closed record store");
        }
        Ok(())
    }

    /// Highest record number in use. Requires an open store.
    pub fn count(&self) -> Result<RecordNumber> {
        if !self.store.is_open() {
            return Err(LibraryError::StoreNotOpen);
        }
        Ok(self.store.count()?)
    }

    /// Read one slot from an open store, leaving it open
    pub fn read(&mut self, rrn: RecordNumber) -> Result<Option<Bytes>> {
        if !self.store.is_open() {
            return Err(LibraryError::StoreNotOpen);
        }
        Ok(self.store.read(rrn)?)
    }

    /// Read one slot, opening the store if needed and closing it afterwards
    /// unless a batch is open
    pub fn read_single(&mut self, rrn: RecordNumber) -> Result<Option<Bytes>> {
        self.open()?;
        let result = self.store.read(rrn).map_err(LibraryError::from);
        self.close_unless_batch()?;
        result
    }

    /// Allocate the record number for a new record
    pub fn allocate(&mut self) -> Result<RecordNumber> {
        self.open()?;
        Ok(self.store.next_free()?)
    }

    /// Write one record, closing the store afterwards unless a batch is open
    pub fn write(&mut self, rrn: RecordNumber, data: &[u8]) -> Result<()> {
        self.open()?;
        let max = self.store.record_size();
        if data.len() > max {
            self.close_unless_batch()?;
            return Err(LibraryError::RecordTooLarge {
                rrn,
                size: data.len(),
                max,
            });
        }

        let result = self.store.write(rrn, data).map_err(LibraryError::from);
        self.close_unless_batch()?;
        result
    }

    /// Defer the store's per-write housekeeping until [`end_batch`](Self::end_batch)
    pub fn start_batch(&mut self) -> Result<()> {
        self.open()?;
        if !self.in_batch {
            self.store.start_batch()?;
            self.in_batch = true;
            debug!("Started write batch");
        }
        Ok(())
    }

    /// Flush deferred housekeeping and close the store
    pub fn end_batch(&mut self) -> Result<()> {
        if self.in_batch {
            debug!("Ending write batch");
        }
        self.close()
    }

    fn close_unless_batch(&mut self) -> Result<()> {
        if self.in_batch {
            Ok(())
        } else {
            self.close()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::BridgeError;
    use mockall::predicate::eq;

    mockall::mock! {
        Store {}
        impl RecordStore for Store {
            fn open(&mut self, path: &Path, version: u32) -> std::result::Result<(), BridgeError>;
            fn close(&mut self) -> std::result::Result<(), BridgeError>;
            fn is_open(&self) -> bool;
            fn read(&mut self, rrn: RecordNumber) -> std::result::Result<Option<Bytes>, BridgeError>;
            fn write(&mut self, rrn: RecordNumber, data: &[u8]) -> std::result::Result<(), BridgeError>;
            fn clear(&mut self, rrn: RecordNumber) -> std::result::Result<(), BridgeError>;
            fn count(&self) -> std::result::Result<RecordNumber, BridgeError>;
            fn next_free(&mut self) -> std::result::Result<RecordNumber, BridgeError>;
            fn record_size(&self) -> usize;
            fn start_batch(&mut self) -> std::result::Result<(), BridgeError>;
            fn end_batch(&mut self) -> std::result::Result<(), BridgeError>;
        }
    }

    fn config() -> RecordStoreConfig {
        RecordStoreConfig::new("/data/musicdb.dat", 10)
    }

    /// `is_open` reports closed until the first call, open afterwards
    fn opens_once(store: &mut MockStore) {
        let mut open = false;
        store.expect_is_open().returning(move || {
            let was = open;
            open = true;
            was
        });
    }

    #[test]
    fn test_read_single_opens_and_closes() {
        let mut store = MockStore::new();
        opens_once(&mut store);
        store
            .expect_open()
            .withf(|path, version| path.to_str() == Some("/data/musicdb.dat") && *version == 10)
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_read()
            .with(eq(4))
            .times(1)
            .returning(|_| Ok(Some(Bytes::from_static(b"FILE\n..a.mp3\n"))));
        store.expect_close().times(1).returning(|| Ok(()));

        let mut adapter = RecordStoreAdapter::new(Box::new(store), config());
        let bytes = adapter.read_single(4).unwrap().unwrap();
        assert_eq!(bytes.as_ref(), b"FILE\n..a.mp3\n");
    }

    #[test]
    fn test_open_failure_propagates() {
        let mut store = MockStore::new();
        store.expect_is_open().return_const(false);
        store
            .expect_open()
            .returning(|_, _| Err(BridgeError::StoreError("locked".to_string())));

        let mut adapter = RecordStoreAdapter::new(Box::new(store), config());
        assert!(matches!(
            adapter.read_single(1),
            Err(LibraryError::Bridge(BridgeError::StoreError(_)))
        ));
    }

    #[test]
    fn test_read_requires_open_store() {
        let mut store = MockStore::new();
        store.expect_is_open().return_const(false);

        let mut adapter = RecordStoreAdapter::new(Box::new(store), config());
        assert!(matches!(adapter.read(1), Err(LibraryError::StoreNotOpen)));
        assert!(matches!(adapter.count(), Err(LibraryError::StoreNotOpen)));
    }

    #[test]
    fn test_write_rejects_oversized_record() {
        let mut store = MockStore::new();
        opens_once(&mut store);
        store.expect_open().returning(|_, _| Ok(()));
        store.expect_record_size().return_const(16usize);
        store.expect_write().never();
        store.expect_close().times(1).returning(|| Ok(()));

        let mut adapter = RecordStoreAdapter::new(Box::new(store), config());
        let err = adapter.write(1, &[b'x'; 17]).unwrap_err();
        assert!(matches!(
            err,
            LibraryError::RecordTooLarge {
                rrn: 1,
                size: 17,
                max: 16
            }
        ));
    }

    #[test]
    fn test_batch_keeps_store_open() {
        let mut store = MockStore::new();
        opens_once(&mut store);
        store.expect_open().times(1).returning(|_, _| Ok(()));
        store.expect_start_batch().times(1).returning(|| Ok(()));
        store.expect_record_size().return_const(2048usize);
        store.expect_write().times(2).returning(|_, _| Ok(()));
        store.expect_end_batch().times(1).returning(|| Ok(()));
        store.expect_close().times(1).returning(|| Ok(()));

        let mut adapter = RecordStoreAdapter::new(Box::new(store), config());
        adapter.start_batch().unwrap();
        adapter.write(1, b"one").unwrap();
        adapter.write(2, b"two").unwrap();
        assert!(adapter.in_batch());
        adapter.end_batch().unwrap();
        assert!(!adapter.in_batch());
    }
}
