//! UUID, typed identifier and sharded-path utilities.
//!
//! Medico stores surgical cases under sharded directories derived from a UUID.
//!
//! To keep path derivation deterministic and consistent across the codebase, Medico uses a
//! *canonical* UUID representation for storage identifiers: **32 lowercase hexadecimal
//! characters** (no hyphens).
//!
//! This crate provides:
//! - A small wrapper type ([`ShardableUuid`]) that *guarantees* the canonical format once
//!   constructed, plus the sharding logic used by the file-backed case store.
//! - Typed identifiers ([`CaseId`], [`HospitalId`], [`ProcedureId`], [`UserId`]) so that a case
//!   id can never be passed where a user id is expected.
//!
//! ## Canonical UUID form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! ## Sharded directory layout
//! For a canonical UUID `u`, cases are stored under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Example:
//! `case_data/cases/55/0e/550e8400e29b41d4a716446655440000/case.yaml`

mod ids;
mod service;

// Re-export public types
pub use ids::{CaseId, HospitalId, ProcedureId, UserId};
pub use service::{ShardableUuid, Uuid};

/// Error type for UUID operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for UUID operations.
pub type UuidResult<T> = Result<T, UuidError>;
