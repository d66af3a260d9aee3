use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A program of study, as stored in the `courses` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    #[serde(rename = "course_name")]
    pub name: String,
}

impl Course {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// An examinable unit, as stored in the `subjects` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    #[serde(rename = "subject_name")]
    pub name: String,
    /// Owning course id.
    #[serde(rename = "subject_of", default)]
    pub course_id: String,
}

impl Subject {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        course_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            course_id: course_id.into(),
        }
    }
}

/// Overall exam period of a course, persisted separately from subject assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamWindow {
    pub course_id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ExamWindow {
    pub fn new(course_id: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            course_id: course_id.into(),
            start,
            end,
        }
    }
}
