//! Data-access core for the student records service.
//! This crate owns the store schema and the Major/Student counter invariant.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use config::{ConfigError, LoggingConfig, MajorAssignment, StoreConfig};
pub use db::{DbError, DbResult, Session, Store};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::major::{Major, NewMajor};
pub use model::student::{NewStudent, Student};
pub use model::RecordId;
pub use repo::fields::FieldMap;
pub use repo::gateway::{RecordGateway, RepoError, RepoResult, SqliteGateway};
pub use repo::record::{MajorMember, Projection, Record};
pub use repo::student_repo::StudentGateway;
pub use repo::MajorGateway;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
