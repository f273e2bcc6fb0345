//! Student record.

use super::RecordId;
use serde::{Deserialize, Serialize};

/// One enrolled student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    /// Unique across all students.
    pub email: String,
    pub enrollment_year: i32,
    pub course: i32,
    pub special_notes: Option<String>,
    /// `None` only when the store runs with `MajorAssignment::Optional`.
    pub major_id: Option<RecordId>,
}

/// Insert input for a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub enrollment_year: i32,
    pub course: i32,
    pub special_notes: Option<String>,
    pub major_id: Option<RecordId>,
}

impl NewStudent {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            enrollment_year: 2024,
            course: 1,
            special_notes: None,
            major_id: None,
        }
    }

    pub fn in_major(mut self, major_id: RecordId) -> Self {
        self.major_id = Some(major_id);
        self
    }

    pub fn enrolled(mut self, enrollment_year: i32, course: i32) -> Self {
        self.enrollment_year = enrollment_year;
        self.course = course;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.special_notes = Some(notes.into());
        self
    }
}
