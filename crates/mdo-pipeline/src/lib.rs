//! # mdo-pipeline
//!
//! The harmonization and validation pipeline.
//!
//! ```text
//! raw files + mapping ─► mapper ─► mapped records per entity type
//!                                        │
//!                                        ├─► harmonizer ─► canonical entity graph
//!                                        │                        │
//!                                        └────────► rules ◄───────┘
//!                                                     │
//!                                            ValidationResult
//! ```
//!
//! [`Orchestrator`] sequences the stages per run, enforces the run state
//! machine, and guards each run with a lease so at most one stage works on it
//! at a time. Recoverable data problems never surface as errors: they become
//! findings on the run's validation result.

pub mod cancel;
pub mod coerce;
pub mod error;
pub mod export;
pub mod harmonizer;
pub mod lease;
pub mod mapper;
pub mod orchestrator;
pub mod rule_ids;
pub mod rules;

pub use cancel::{CancelToken, Cancelled};
pub use error::PipelineError;
pub use export::{ExportBundle, Manifest};
pub use harmonizer::{HarmonizeSummary, HarmonizedSet};
pub use lease::{LeaseGuard, LeaseMap};
pub use mapper::MappedSet;
pub use orchestrator::{HarmonizeReport, NewMapping, Orchestrator, PipelineSettings};
pub use rules::{LevelFindings, RuleSet};
