//! Record models for majors and students.
//!
//! # Responsibility
//! - Define the transient record views materialized per gateway call.
//! - Define typed inputs used to build insert field maps.
//!
//! # Invariants
//! - Records are identified by store-generated integer ids.
//! - `Major::count_students` equals the number of students referencing it,
//!   maintained by the store (see `db::migrations`).

pub mod major;
pub mod student;

/// Store-generated primary key shared by every record kind.
pub type RecordId = i64;
