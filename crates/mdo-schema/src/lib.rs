//! # mdo-schema
//!
//! Canonical schema registry for the multiomic data orchestrator.
//!
//! This crate provides:
//! - `SchemaRegistry`: read-only store of schema templates keyed by id
//! - Built-in vendor templates embedded at compile time
//! - Structural validation of template JSON against the JSON Schema generated
//!   from `mdo_core::schema::SchemaDefinition`
//! - Semantic checks (identity keys, parent lineage, rule field references)
//!
//! ## Architecture
//!
//! Schema definition types live in `mdo-core` with `#[derive(JsonSchema)]`.
//! This crate imports those types and provides loading, validation, and
//! lookup. The pipeline depends on it to resolve a mapping's target schema.

mod check;
pub mod error;
pub mod registry;

pub use error::SchemaError;
pub use registry::SchemaRegistry;
