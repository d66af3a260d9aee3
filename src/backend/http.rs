use super::{Backend, BackendError, BackendResult, SaveOutcome};
use crate::config::BackendConfig;
use crate::model::{Course, ExamWindow, Subject};
use chrono::NaiveDate;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const COURSES_PATH: &str = "/api/collections/courses/records";
const SUBJECTS_PATH: &str = "/api/collections/subjects/records";
const EXAMS_PATH: &str = "/api/collections/exams/records";

/// Timestamp layout the exams collection expects, e.g. `2025-03-01T00:00:00.000000Z`.
pub const EXAM_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

#[derive(Debug, Deserialize)]
struct RecordPage<T> {
    items: Vec<T>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamWindowRecord {
    course_exam_start_date: String,
    course_exam_end_date: String,
    exam_of: String,
}

impl From<&ExamWindow> for ExamWindowRecord {
    fn from(window: &ExamWindow) -> Self {
        Self {
            course_exam_start_date: format_exam_timestamp(window.start),
            course_exam_end_date: format_exam_timestamp(window.end),
            exam_of: window.course_id.clone(),
        }
    }
}

pub fn format_exam_timestamp(date: NaiveDate) -> String {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.format(EXAM_TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

/// Blocking client for the records API.
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> BackendResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| BackendError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.trimmed_base_url(), path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn fetch_items<T: DeserializeOwned>(&self, request: RequestBuilder) -> BackendResult<Vec<T>> {
        let response = self.authorize(request).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let page: RecordPage<T> = response.json()?;
        Ok(page.items)
    }
}

impl Backend for HttpBackend {
    fn fetch_courses(&self) -> BackendResult<Vec<Course>> {
        let url = self.url(COURSES_PATH);
        debug!(%url, per_page = self.config.page_size, "fetching courses");
        let request = self
            .client
            .get(&url)
            .query(&[("perPage", self.config.page_size.to_string())]);
        let courses: Vec<Course> = self.fetch_items(request)?;
        info!(count = courses.len(), "fetched courses");
        Ok(courses)
    }

    fn fetch_subjects(&self, course_id: &str) -> BackendResult<Vec<Subject>> {
        let url = self.url(SUBJECTS_PATH);
        let filter = format!("subject_of=\"{course_id}\"");
        debug!(%url, %filter, "fetching subjects");
        let request = self.client.get(&url).query(&[("filter", filter)]);
        let subjects: Vec<Subject> = self.fetch_items(request)?;
        info!(course_id, count = subjects.len(), "fetched subjects");
        Ok(subjects)
    }

    fn save_exam_window(&self, window: &ExamWindow) -> BackendResult<SaveOutcome> {
        let url = self.url(EXAMS_PATH);
        let record = ExamWindowRecord::from(window);
        debug!(%url, course_id = %window.course_id, "saving exam window");
        let response = self
            .authorize(self.client.post(&url).json(&record))
            .send()?;
        let status = response.status().as_u16();
        let body = response.text().unwrap_or_default();
        let outcome = SaveOutcome::from_response(status, body);
        if outcome.success {
            info!(course_id = %window.course_id, "exam window saved");
        } else {
            warn!(course_id = %window.course_id, status, "exam window save rejected");
        }
        Ok(outcome)
    }
}
