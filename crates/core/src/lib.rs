//! # dopo Core
//!
//! Domain types, traits, and error definitions for dopo, the LCA sector
//! analysis tool. This crate has **no framework dependencies**: it defines
//! the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The external LCA calculator is a trait here ([`LcaEngine`]).
//! Implementations live in `dopo-inventory`. This enables:
//! - Swapping engines via configuration
//! - Testing the whole pipeline with an in-memory engine
//! - Clean dependency graph (all crates depend inward on core)

pub mod activity;
pub mod engine;
pub mod error;
pub mod method;
pub mod table;

// Re-export key types at crate root for ergonomics
pub use activity::{Activity, ActivityKey, ActivitySet, Classification};
pub use engine::{Breakdown, EngineContext, LcaEngine};
pub use error::{EngineError, ExportError, FilterError};
pub use method::{MethodDescriptor, MethodInfo};
pub use table::{IDENTITY_COLUMNS, OTHER_COLUMN, ScoreRow, ScoreTable, TOTAL_COLUMN};
