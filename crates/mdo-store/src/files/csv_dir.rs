use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use super::{FileStore, RecordIter, StoredFile, header_of, inspect, records};
use crate::error::StoreError;

/// Stores each upload as `<root>/<file_id>.csv`.
#[derive(Debug, Clone)]
pub struct CsvDirStore {
    root: PathBuf,
}

impl CsvDirStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn path_of(&self, file_id: &str) -> PathBuf {
        self.root.join(format!("{file_id}.csv"))
    }

    fn open_file(&self, file_id: &str) -> Result<BufReader<File>, StoreError> {
        match File::open(self.path_of(file_id)) {
            Ok(file) => Ok(BufReader::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::not_found("file", file_id))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl FileStore for CsvDirStore {
    fn put(&self, file_id: &str, bytes: &[u8]) -> Result<StoredFile, StoreError> {
        let (columns, row_count) = inspect(file_id, bytes)?;
        fs::create_dir_all(&self.root)?;
        let path = self.path_of(file_id);
        fs::write(&path, bytes)?;
        tracing::debug!(file_id, path = %path.display(), row_count, "stored upload");
        Ok(StoredFile {
            storage_path: path.display().to_string(),
            columns,
            row_count,
        })
    }

    fn open(&self, file_id: &str) -> Result<RecordIter, StoreError> {
        records(file_id, self.open_file(file_id)?)
    }

    fn columns(&self, file_id: &str) -> Result<Vec<String>, StoreError> {
        header_of(file_id, self.open_file(file_id)?)
    }

    fn remove(&self, file_id: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_of(file_id)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
