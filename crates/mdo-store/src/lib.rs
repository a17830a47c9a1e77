//! # mdo-store
//!
//! External-interface seams of the harmonization pipeline.
//!
//! - [`RunStore`]: async persistence of the run aggregate (runs, uploaded file
//!   metadata, mappings, canonical entities, validation results). The
//!   orchestrator talks to persistence exclusively through this trait;
//!   [`MemoryRunStore`] is the bundled backend.
//! - [`FileStore`]: storage of uploaded tabular files and restartable
//!   iteration over their rows as [`mdo_core::entities::RawRecord`]s.
//!   [`MemoryFileStore`] keeps bytes in memory, [`CsvDirStore`] writes them
//!   under a directory.

pub mod error;
pub mod files;
pub mod runs;

pub use error::StoreError;
pub use files::{CsvDirStore, FileStore, MemoryFileStore, RecordIter, StoredFile};
pub use runs::{MemoryRunStore, RunStore};
