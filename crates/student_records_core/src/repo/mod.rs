//! Record gateways over the SQLite store.
//!
//! # Responsibility
//! - Define the generic CRUD contract (`RecordGateway`) and its SQLite
//!   implementation.
//! - Specialize it for students (major resolution, id-returning insert).
//! - Isolate SQL details from callers.
//!
//! # Invariants
//! - Each gateway call opens its own session; calls never compose into one
//!   transaction.
//! - Absence is `Ok(None)`, never an error, for single-row lookups.

use crate::model::major::Major;

pub mod fields;
pub mod gateway;
pub mod record;
pub mod student_repo;

/// Gateway bound to [`Major`] records.
pub type MajorGateway<'store> = gateway::SqliteGateway<'store, Major>;
