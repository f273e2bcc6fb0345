//! Binding between record models and their SQLite tables.
//!
//! # Responsibility
//! - Name each record's table and column set.
//! - Decode rows into records, rejecting invalid persisted state.
//! - Convert typed inputs and records into field maps and projections.

use super::fields::FieldMap;
use super::gateway::{RepoError, RepoResult};
use crate::model::major::{Major, NewMajor};
use crate::model::student::{NewStudent, Student};
use crate::model::RecordId;
use rusqlite::Row;
use serde::Serialize;

/// JSON-object view of a record, optionally enriched with resolved fields.
pub type Projection = serde_json::Map<String, serde_json::Value>;

/// A record kind stored in exactly one table.
pub trait Record: Serialize + Sized {
    const TABLE: &'static str;
    /// Every column, primary key first. Filters and assignments may use any
    /// of them.
    const COLUMNS: &'static [&'static str];

    fn from_row(row: &Row<'_>) -> RepoResult<Self>;

    fn id(&self) -> RecordId;

    /// Comma-separated column list, optionally qualified by a table alias.
    fn select_list(qualifier: Option<&str>) -> String {
        Self::COLUMNS
            .iter()
            .map(|column| match qualifier {
                Some(alias) => format!("{alias}.\"{column}\""),
                None => format!("\"{column}\""),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn to_projection(&self) -> RepoResult<Projection> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(other) => Err(RepoError::InvalidData(format!(
                "{} record serialized to non-object `{other}`",
                Self::TABLE
            ))),
            Err(err) => Err(RepoError::InvalidData(format!(
                "{} record failed to serialize: {err}",
                Self::TABLE
            ))),
        }
    }
}

/// A record that references a major through `major_id`.
pub trait MajorMember: Record {
    fn major_id(&self) -> Option<RecordId>;
}

impl Record for Major {
    const TABLE: &'static str = "majors";
    const COLUMNS: &'static [&'static str] =
        &["id", "major_name", "major_description", "count_students"];

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let raw_count: i64 = row.get("count_students")?;
        let count_students = u32::try_from(raw_count).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid count_students value `{raw_count}` in majors.count_students"
            ))
        })?;

        Ok(Self {
            id: row.get("id")?,
            major_name: row.get("major_name")?,
            major_description: row.get("major_description")?,
            count_students,
        })
    }

    fn id(&self) -> RecordId {
        self.id
    }
}

impl Record for Student {
    const TABLE: &'static str = "students";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "first_name",
        "last_name",
        "email",
        "enrollment_year",
        "course",
        "special_notes",
        "major_id",
    ];

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            email: row.get("email")?,
            enrollment_year: row.get("enrollment_year")?,
            course: row.get("course")?,
            special_notes: row.get("special_notes")?,
            major_id: row.get("major_id")?,
        })
    }

    fn id(&self) -> RecordId {
        self.id
    }
}

impl MajorMember for Student {
    fn major_id(&self) -> Option<RecordId> {
        self.major_id
    }
}

impl From<&NewMajor> for FieldMap {
    fn from(value: &NewMajor) -> Self {
        FieldMap::new()
            .text("major_name", value.major_name.as_str())
            .optional_text("major_description", value.major_description.clone())
    }
}

impl From<&NewStudent> for FieldMap {
    fn from(value: &NewStudent) -> Self {
        FieldMap::new()
            .text("first_name", value.first_name.as_str())
            .text("last_name", value.last_name.as_str())
            .text("email", value.email.as_str())
            .integer("enrollment_year", i64::from(value.enrollment_year))
            .integer("course", i64::from(value.course))
            .optional_text("special_notes", value.special_notes.clone())
            .optional_integer("major_id", value.major_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_list_qualifies_columns() {
        assert_eq!(
            Major::select_list(Some("m")),
            "m.\"id\", m.\"major_name\", m.\"major_description\", m.\"count_students\""
        );
    }

    #[test]
    fn new_student_fields_cover_only_known_columns() {
        let input = NewStudent::new("Ada", "Lovelace", "ada@example.com").in_major(7);
        let fields = FieldMap::from(&input);
        fields.validate_for::<Student>().unwrap();
        assert_eq!(fields.len(), Student::COLUMNS.len() - 1);
        assert!(fields.get("id").is_none());
    }

    #[test]
    fn projection_keeps_field_names() {
        let major = Major {
            id: 3,
            major_name: "Geology".to_string(),
            major_description: None,
            count_students: 2,
        };
        let projection = major.to_projection().unwrap();
        assert_eq!(projection["major_name"], "Geology");
        assert_eq!(projection["count_students"], 2);
        assert!(projection["major_description"].is_null());
    }
}
