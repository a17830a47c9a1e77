//! Entity structs for the run aggregate.
//!
//! A `Run` is the root; every other struct here exists only in the context of
//! a run and is superseded or deleted together with it. All structs derive
//! `Serialize`, `Deserialize`, and `JsonSchema` for persistence, export, and
//! schema validation.

mod canonical;
mod file;
mod finding;
mod mapping;
mod record;
mod run;

pub use canonical::CanonicalEntity;
pub use file::UploadedFile;
pub use finding::{SeverityCounts, ValidationFinding, ValidationResult};
pub use mapping::MappingConfig;
pub use record::{MappedRecord, RawRecord, RecordRef};
pub use run::Run;
