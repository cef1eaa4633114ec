//! Fixed-slot Record Store
//!
//! A single file made of a small text header followed by equally sized
//! slots. Slot `n` (1-based) starts at `HEADER_SIZE + (n - 1) * record_size`.
//!
//! ```text
//! +-----------------------------+  offset 0
//! | #VERSION=10\n               |
//! | #RASIZE=2048\n              |
//! | #RACOUNT=3\n  NUL padding   |
//! +-----------------------------+  offset 128
//! | slot 1 (payload, NUL pad)   |
//! +-----------------------------+  offset 128 + 2048
//! | slot 2                      |
//! ...
//! ```
//!
//! A slot whose first byte is NUL is empty. Payloads must not contain NUL.

use bridge_traits::{
    database::{RecordNumber, RecordStore, DEFAULT_RECORD_SIZE},
    error::{BridgeError, Result},
};
use bytes::Bytes;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Size of the text header at the start of the file
pub const HEADER_SIZE: usize = 128;

const VERSION_KEY: &str = "#VERSION=";
const SIZE_KEY: &str = "#RASIZE=";
const COUNT_KEY: &str = "#RACOUNT=";

/// Single-file fixed-slot record store
pub struct FileRecordStore {
    record_size: usize,
    handle: Option<OpenStore>,
}

struct OpenStore {
    file: File,
    path: PathBuf,
    version: u32,
    count: RecordNumber,
    allocated: RecordNumber,
    in_batch: bool,
    header_dirty: bool,
}

struct Header {
    version: u32,
    record_size: usize,
    count: RecordNumber,
}

impl Header {
    fn encode(&self) -> [u8; HEADER_SIZE] {
        let text = format!(
            "{}{}\n{}{}\n{}{}\n",
            VERSION_KEY, self.version, SIZE_KEY, self.record_size, COUNT_KEY, self.count
        );
        let mut buf = [0u8; HEADER_SIZE];
        let len = text.len().min(HEADER_SIZE);
        buf[..len].copy_from_slice(&text.as_bytes()[..len]);
        buf
    }

    fn decode(buf: &[u8]) -> Result<Self> {
        let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        let text = std::str::from_utf8(&buf[..end])
            .map_err(|e| BridgeError::StoreError(format!("Header is not UTF-8: {}", e)))?;

        let mut version = None;
        let mut record_size = None;
        let mut count = None;
        for line in text.lines() {
            if let Some(v) = line.strip_prefix(VERSION_KEY) {
                version = v.trim().parse().ok();
            } else if let Some(v) = line.strip_prefix(SIZE_KEY) {
                record_size = v.trim().parse().ok();
            } else if let Some(v) = line.strip_prefix(COUNT_KEY) {
                count = v.trim().parse().ok();
            }
        }

        match (version, record_size, count) {
            (Some(version), Some(record_size), Some(count)) if record_size > 0 => Ok(Self {
                version,
                record_size,
                count,
            }),
            _ => Err(BridgeError::StoreError(format!(
                "Malformed header: {:?}",
                text
            ))),
        }
    }
}

impl FileRecordStore {
    /// Create a closed store using the default slot size
    pub fn new() -> Self {
        Self::with_record_size(DEFAULT_RECORD_SIZE)
    }

    /// Create a closed store that creates new files with `record_size` slots
    ///
    /// Existing files keep the slot size recorded in their header.
    pub fn with_record_size(record_size: usize) -> Self {
        Self {
            record_size,
            handle: None,
        }
    }

    fn handle(&self) -> Result<&OpenStore> {
        self.handle
            .as_ref()
            .ok_or_else(|| BridgeError::StoreError("Record store is not open".to_string()))
    }

    fn handle_mut(&mut self) -> Result<&mut OpenStore> {
        self.handle
            .as_mut()
            .ok_or_else(|| BridgeError::StoreError("Record store is not open".to_string()))
    }

    fn offset(&self, rrn: RecordNumber) -> u64 {
        HEADER_SIZE as u64 + u64::from(rrn - 1) * self.record_size as u64
    }

    fn write_slot(&mut self, rrn: RecordNumber, data: &[u8]) -> Result<()> {
        let mut slot = vec![0u8; self.record_size];
        slot[..data.len()].copy_from_slice(data);
        let offset = self.offset(rrn);

        let handle = self.handle_mut()?;
        handle.file.seek(SeekFrom::Start(offset))?;
        handle.file.write_all(&slot)?;
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        let record_size = self.record_size;
        let handle = self.handle_mut()?;
        let header = Header {
            version: handle.version,
            record_size,
            count: handle.count,
        };
        handle.file.seek(SeekFrom::Start(0))?;
        handle.file.write_all(&header.encode())?;
        handle.header_dirty = false;
        debug!(path = ?handle.path, count = handle.count, "Wrote record store header");
        Ok(())
    }

    fn sync_header(&mut self) -> Result<()> {
        if self.handle()?.header_dirty {
            self.write_header()?;
        }
        Ok(())
    }
}

impl Default for FileRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for FileRecordStore {
    fn open(&mut self, path: &Path, version: u32) -> Result<()> {
        if self.handle.is_some() {
            self.close()?;
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let len = file.metadata()?.len();

        let count = if len == 0 {
            self.handle = Some(OpenStore {
                file,
                path: path.to_path_buf(),
                version,
                count: 0,
                allocated: 0,
                in_batch: false,
                header_dirty: true,
            });
            self.write_header()?;
            info!(path = ?path, version, record_size = self.record_size, "Created record store");
            0
        } else {
            let mut buf = [0u8; HEADER_SIZE];
            file.read_exact(&mut buf)?;
            let header = Header::decode(&buf)?;
            if header.version != version {
                return Err(BridgeError::StoreError(format!(
                    "Version mismatch in {}: found {}, expected {}",
                    path.display(),
                    header.version,
                    version
                )));
            }
            if header.record_size != self.record_size {
                warn!(
                    path = ?path,
                    configured = self.record_size,
                    found = header.record_size,
                    "Using slot size from existing store"
                );
                self.record_size = header.record_size;
            }
            self.handle = Some(OpenStore {
                file,
                path: path.to_path_buf(),
                version,
                count: header.count,
                allocated: header.count,
                in_batch: false,
                header_dirty: false,
            });
            header.count
        };

        debug!(path = ?path, count, "Opened record store");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.handle.is_none() {
            return Ok(());
        }
        self.sync_header()?;
        if let Some(mut handle) = self.handle.take() {
            handle.file.flush()?;
            debug!(path = ?handle.path, "Closed record store");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    fn read(&mut self, rrn: RecordNumber) -> Result<Option<Bytes>> {
        let count = self.handle()?.count;
        if rrn == 0 || rrn > count {
            return Ok(None);
        }

        let offset = self.offset(rrn);
        let mut slot = vec![0u8; self.record_size];
        let handle = self.handle_mut()?;
        handle.file.seek(SeekFrom::Start(offset))?;

        // The last slot may be short if the file was truncated
        let mut filled = 0;
        while filled < slot.len() {
            let n = handle.file.read(&mut slot[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 || slot[0] == 0 {
            return Ok(None);
        }
        let end = slot[..filled].iter().position(|&b| b == 0).unwrap_or(filled);
        slot.truncate(end);
        Ok(Some(Bytes::from(slot)))
    }

    fn write(&mut self, rrn: RecordNumber, data: &[u8]) -> Result<()> {
        if rrn == 0 {
            return Err(BridgeError::StoreError(
                "Record numbers start at 1".to_string(),
            ));
        }
        if data.len() > self.record_size {
            return Err(BridgeError::StoreError(format!(
                "Record {} is {} bytes, slot size is {}",
                rrn,
                data.len(),
                self.record_size
            )));
        }

        self.write_slot(rrn, data)?;

        let handle = self.handle_mut()?;
        if rrn > handle.count {
            handle.count = rrn;
            handle.header_dirty = true;
        }
        handle.allocated = handle.allocated.max(rrn);
        let in_batch = handle.in_batch;
        debug!(rrn, len = data.len(), "Wrote record");

        if !in_batch {
            self.sync_header()?;
        }
        Ok(())
    }

    fn clear(&mut self, rrn: RecordNumber) -> Result<()> {
        let count = self.handle()?.count;
        if rrn == 0 || rrn > count {
            return Ok(());
        }
        self.write_slot(rrn, &[])?;
        debug!(rrn, "Cleared record");
        Ok(())
    }

    fn count(&self) -> Result<RecordNumber> {
        Ok(self.handle()?.count)
    }

    fn next_free(&mut self) -> Result<RecordNumber> {
        let handle = self.handle_mut()?;
        handle.allocated = handle.allocated.max(handle.count) + 1;
        Ok(handle.allocated)
    }

    fn record_size(&self) -> usize {
        self.record_size
    }

    fn start_batch(&mut self) -> Result<()> {
        self.handle_mut()?.in_batch = true;
        Ok(())
    }

    fn end_batch(&mut self) -> Result<()> {
        self.handle_mut()?.in_batch = false;
        self.sync_header()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_count(path: &Path) -> RecordNumber {
        let bytes = std::fs::read(path).unwrap();
        Header::decode(&bytes[..HEADER_SIZE]).unwrap().count
    }

    #[test]
    fn test_header_encoding() {
        let header = Header {
            version: 10,
            record_size: 2048,
            count: 3,
        };
        let buf = header.encode();
        assert!(buf.starts_with(b"#VERSION=10\n#RASIZE=2048\n#RACOUNT=3\n"));
        assert_eq!(buf[HEADER_SIZE - 1], 0);

        let decoded = Header::decode(&buf).unwrap();
        assert_eq!(decoded.count, 3);
        assert!(Header::decode(b"garbage\0\0").is_err());
    }

    #[test]
    fn test_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("musicdb.dat");

        let mut store = FileRecordStore::new();
        store.open(&path, 10).unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.next_free().unwrap(), 1);

        store.write(1, b"FILE\n..a.mp3\n").unwrap();
        store.write(3, b"FILE\n..c.mp3\n").unwrap();
        assert_eq!(store.count().unwrap(), 3);

        assert_eq!(store.read(1).unwrap().unwrap().as_ref(), b"FILE\n..a.mp3\n");
        assert!(store.read(2).unwrap().is_none());
        assert!(store.read(4).unwrap().is_none());
        assert!(store.read(0).unwrap().is_none());
        store.close().unwrap();

        let expected_len = HEADER_SIZE + 3 * DEFAULT_RECORD_SIZE;
        assert_eq!(std::fs::metadata(&path).unwrap().len(), expected_len as u64);

        let mut store = FileRecordStore::new();
        store.open(&path, 10).unwrap();
        assert_eq!(store.count().unwrap(), 3);
        assert_eq!(store.read(3).unwrap().unwrap().as_ref(), b"FILE\n..c.mp3\n");
    }

    #[test]
    fn test_shorter_rewrite_does_not_leak_old_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileRecordStore::with_record_size(256);
        store.open(&dir.path().join("db.dat"), 1).unwrap();

        store.write(1, b"a long first version").unwrap();
        store.write(1, b"short").unwrap();
        assert_eq!(store.read(1).unwrap().unwrap().as_ref(), b"short");
    }

    #[test]
    fn test_clear_creates_hole() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileRecordStore::new();
        store.open(&dir.path().join("db.dat"), 10).unwrap();

        store.write(1, b"one").unwrap();
        store.write(2, b"two").unwrap();
        store.clear(1).unwrap();

        assert!(store.read(1).unwrap().is_none());
        assert_eq!(store.read(2).unwrap().unwrap().as_ref(), b"two");
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_record_too_large() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileRecordStore::with_record_size(256);
        store.open(&dir.path().join("db.dat"), 10).unwrap();

        let data = vec![b'x'; 257];
        assert!(matches!(
            store.write(1, &data),
            Err(BridgeError::StoreError(_))
        ));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_version_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.dat");

        let mut store = FileRecordStore::new();
        store.open(&path, 10).unwrap();
        store.close().unwrap();

        let mut store = FileRecordStore::new();
        assert!(store.open(&path, 11).is_err());
        assert!(!store.is_open());
    }

    #[test]
    fn test_existing_slot_size_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.dat");

        let mut store = FileRecordStore::with_record_size(512);
        store.open(&path, 10).unwrap();
        store.write(2, b"two").unwrap();
        store.close().unwrap();

        let mut store = FileRecordStore::new();
        store.open(&path, 10).unwrap();
        assert_eq!(store.record_size(), 512);
        assert_eq!(store.read(2).unwrap().unwrap().as_ref(), b"two");
    }

    #[test]
    fn test_batch_defers_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.dat");

        let mut store = FileRecordStore::new();
        store.open(&path, 10).unwrap();
        store.start_batch().unwrap();
        for rrn in 1..=3 {
            let next = store.next_free().unwrap();
            assert_eq!(next, rrn);
            store.write(next, b"record").unwrap();
        }
        assert_eq!(header_count(&path), 0);

        store.end_batch().unwrap();
        assert_eq!(header_count(&path), 3);

        store.write(4, b"record").unwrap();
        assert_eq!(header_count(&path), 4);
    }

    #[test]
    fn test_next_free_does_not_repeat() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileRecordStore::new();
        store.open(&dir.path().join("db.dat"), 10).unwrap();

        assert_eq!(store.next_free().unwrap(), 1);
        assert_eq!(store.next_free().unwrap(), 2);
    }

    #[test]
    fn test_closed_store_errors() {
        let mut store = FileRecordStore::new();
        assert!(store.read(1).is_err());
        assert!(store.write(1, b"x").is_err());
        assert!(store.count().is_err());
        store.close().unwrap();
    }
}
