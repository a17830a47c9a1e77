use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, PoisonError, RwLock};

use super::{FileStore, RecordIter, StoredFile, header_of, inspect, records};
use crate::error::StoreError;

/// Keeps uploaded bytes in memory. Used by tests and one-shot CLI runs.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    files: RwLock<HashMap<String, Arc<[u8]>>>,
}

impl MemoryFileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn bytes(&self, file_id: &str) -> Result<Arc<[u8]>, StoreError> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(file_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("file", file_id))
    }
}

impl FileStore for MemoryFileStore {
    fn put(&self, file_id: &str, bytes: &[u8]) -> Result<StoredFile, StoreError> {
        let (columns, row_count) = inspect(file_id, bytes)?;
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(file_id.to_string(), Arc::from(bytes));
        Ok(StoredFile {
            storage_path: format!("memory://{file_id}"),
            columns,
            row_count,
        })
    }

    fn open(&self, file_id: &str) -> Result<RecordIter, StoreError> {
        records(file_id, Cursor::new(self.bytes(file_id)?))
    }

    fn columns(&self, file_id: &str) -> Result<Vec<String>, StoreError> {
        header_of(file_id, Cursor::new(self.bytes(file_id)?))
    }

    fn remove(&self, file_id: &str) -> Result<(), StoreError> {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(file_id);
        Ok(())
    }
}
