//! # mdo-core
//!
//! Core types, ID generation, and error types for the multiomic data
//! orchestrator.
//!
//! This crate provides the foundational types shared across all MDO crates:
//! - Entity structs for the run aggregate (runs, files, mappings, records,
//!   canonical entities, validation findings and results)
//! - Typed field values produced by column coercion
//! - Schema definition types referenced by mappings and rules
//! - Status enums with the run state machine
//! - ID prefix constants and generation helpers
//! - Cross-cutting error types

pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod schema;
pub mod value;
