//! Uploaded-file storage.
//!
//! Files are stored as CSV bytes with a mandatory header row. Opening a file
//! yields a fresh iterator every time, so a failed or cancelled pass can be
//! restarted by re-opening. Row indices are 0-based over data rows (the header
//! is not counted).

mod csv_dir;
mod memory;

pub use csv_dir::CsvDirStore;
pub use memory::MemoryFileStore;

use std::collections::BTreeSet;
use std::io::Read;

use mdo_core::entities::RawRecord;

use crate::error::StoreError;

/// Iterator over the data rows of one stored file.
pub type RecordIter = Box<dyn Iterator<Item = Result<RawRecord, StoreError>> + Send>;

/// What the store learned about a file when it accepted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Store-specific location (a filesystem path for [`CsvDirStore`]).
    pub storage_path: String,
    /// Header columns in file order.
    pub columns: Vec<String>,
    pub row_count: usize,
}

/// Storage backend for uploaded tabular files.
///
/// Implementations are synchronous: rows are consumed by the mapper as a
/// plain iterator.
pub trait FileStore: Send + Sync {
    /// Validate and store `bytes` under `file_id`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Malformed` or `StoreError::Csv` if the bytes are
    /// not a CSV table with a header row, `StoreError::Io` if they cannot be
    /// written.
    fn put(&self, file_id: &str, bytes: &[u8]) -> Result<StoredFile, StoreError>;

    /// Iterate the data rows of a stored file.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if nothing is stored under `file_id`.
    fn open(&self, file_id: &str) -> Result<RecordIter, StoreError>;

    /// Header columns of a stored file.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if nothing is stored under `file_id`.
    fn columns(&self, file_id: &str) -> Result<Vec<String>, StoreError>;

    /// Remove a stored file. Removing an unknown id is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the backing storage cannot be modified.
    fn remove(&self, file_id: &str) -> Result<(), StoreError>;
}

fn csv_reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(source)
}

fn read_header<R: Read>(file_id: &str, reader: &mut csv::Reader<R>) -> Result<Vec<String>, StoreError> {
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if columns.iter().all(String::is_empty) {
        return Err(StoreError::Malformed {
            file_id: file_id.to_string(),
            message: "missing header row".to_string(),
        });
    }
    let mut seen = BTreeSet::new();
    for column in columns.iter().filter(|c| !c.is_empty()) {
        if !seen.insert(column.as_str()) {
            return Err(StoreError::Malformed {
                file_id: file_id.to_string(),
                message: format!("duplicate column '{column}'"),
            });
        }
    }
    Ok(columns)
}

/// Decode every row once to reject undecodable uploads before storing them.
pub(crate) fn inspect(file_id: &str, bytes: &[u8]) -> Result<(Vec<String>, usize), StoreError> {
    let mut reader = csv_reader(bytes);
    let columns = read_header(file_id, &mut reader)?;
    let mut row_count = 0;
    for record in reader.records() {
        record?;
        row_count += 1;
    }
    Ok((columns, row_count))
}

pub(crate) fn header_of<R: Read>(file_id: &str, source: R) -> Result<Vec<String>, StoreError> {
    read_header(file_id, &mut csv_reader(source))
}

pub(crate) fn records<R: Read + Send + 'static>(
    file_id: &str,
    source: R,
) -> Result<RecordIter, StoreError> {
    let mut reader = csv_reader(source);
    let columns = read_header(file_id, &mut reader)?;
    let file_id = file_id.to_string();
    let iter = reader
        .into_records()
        .enumerate()
        .map(move |(row_index, record)| {
            let record = record?;
            // Short rows leave trailing columns absent; unnamed columns are dropped.
            let values = columns
                .iter()
                .zip(record.iter())
                .filter(|(column, _)| !column.is_empty())
                .map(|(column, cell)| (column.clone(), cell.to_string()))
                .collect();
            Ok(RawRecord {
                file_id: file_id.clone(),
                row_index,
                values,
            })
        });
    Ok(Box::new(iter))
}
