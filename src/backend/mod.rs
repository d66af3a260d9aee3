//! Client side of the PocketBase-style records API holding courses, subjects and exam windows.
//!
//! Reads return typed results so that a failed request can be told apart from an empty
//! collection. Front ends that only need a selection list use [`courses_or_empty`] and
//! [`subjects_or_empty`], which keep the old behaviour of showing nothing on failure.

use crate::model::{Course, ExamWindow, Subject};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

pub mod http;

pub use http::HttpBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response payload: {0}")]
    Decode(String),
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else if err.is_builder() {
            BackendError::InvalidUrl(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Result of a single exam-window write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    /// True only for HTTP 200.
    pub success: bool,
    pub status: u16,
    /// Raw response body, shown to the user when the save failed.
    pub body: String,
}

impl SaveOutcome {
    pub fn from_response(status: u16, body: String) -> Self {
        Self {
            success: status == 200,
            status,
            body,
        }
    }
}

pub trait Backend {
    fn fetch_courses(&self) -> BackendResult<Vec<Course>>;
    fn fetch_subjects(&self, course_id: &str) -> BackendResult<Vec<Subject>>;
    /// One write attempt. Any HTTP response is `Ok`; only transport failures are `Err`.
    /// There is no idempotency key, so calling this again after a timeout may store
    /// a second record.
    fn save_exam_window(&self, window: &ExamWindow) -> BackendResult<SaveOutcome>;
}

impl<B: Backend + ?Sized> Backend for &B {
    fn fetch_courses(&self) -> BackendResult<Vec<Course>> {
        (**self).fetch_courses()
    }

    fn fetch_subjects(&self, course_id: &str) -> BackendResult<Vec<Subject>> {
        (**self).fetch_subjects(course_id)
    }

    fn save_exam_window(&self, window: &ExamWindow) -> BackendResult<SaveOutcome> {
        (**self).save_exam_window(window)
    }
}

pub fn courses_or_empty<B: Backend + ?Sized>(backend: &B) -> Vec<Course> {
    match backend.fetch_courses() {
        Ok(courses) => courses,
        Err(err) => {
            warn!(error = %err, "course fetch failed, showing no courses");
            Vec::new()
        }
    }
}

pub fn subjects_or_empty<B: Backend + ?Sized>(backend: &B, course_id: &str) -> Vec<Subject> {
    match backend.fetch_subjects(course_id) {
        Ok(subjects) => subjects,
        Err(err) => {
            warn!(course_id, error = %err, "subject fetch failed, showing no subjects");
            Vec::new()
        }
    }
}
