//! Major record.

use super::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A field of study that students enroll in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Major {
    pub id: RecordId,
    /// Unique across all majors.
    pub major_name: String,
    pub major_description: Option<String>,
    /// Number of students inserted with this major. Never decremented.
    pub count_students: u32,
}

impl Display for Major {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Major(id={}, major_name={:?})", self.id, self.major_name)
    }
}

/// Insert input for a major. The counter always starts at the store default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMajor {
    pub major_name: String,
    pub major_description: Option<String>,
}

impl NewMajor {
    pub fn new(major_name: impl Into<String>) -> Self {
        Self {
            major_name: major_name.into(),
            major_description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.major_description = Some(description.into());
        self
    }
}
