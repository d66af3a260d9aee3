use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use parking_lot::RwLock;
use polars::prelude::{DataFrame, PolarsResult};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{
    AssignmentBook, AssignmentPolicy, AssignmentRejection, DateSlot, ExamCalendar,
    ExamCalendarConfig, PDF_FILE_NAME, PDF_MEDIA_TYPE, Subject, TimeRange, Timetable,
    TimetableRow, config::MAX_WINDOW_DAYS, render_pdf,
};

#[derive(Clone)]
pub struct AppState {
    calendar: Arc<RwLock<ExamCalendar>>,
}

impl AppState {
    pub fn new(calendar: ExamCalendar) -> Self {
        Self {
            calendar: Arc::new(RwLock::new(calendar)),
        }
    }

    fn calendar(&self) -> ExamCalendar {
        self.calendar.read().clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    Invalid(String),
    Rejected(AssignmentRejection),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }

    fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<AssignmentRejection> for ApiError {
    fn from(value: AssignmentRejection) -> Self {
        ApiError::Rejected(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Rejected(rejection) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "assignment_rejected",
                rejection.to_string(),
            ),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct DateRangeRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRangeRequest {
    fn check(&self) -> Result<(), ApiError> {
        check_window(self.start, self.end)
    }
}

fn check_window(start: NaiveDate, end: NaiveDate) -> Result<(), ApiError> {
    let span = end.signed_duration_since(start).num_days();
    if span > MAX_WINDOW_DAYS {
        return Err(ApiError::invalid(format!(
            "window spans {span} days, at most {MAX_WINDOW_DAYS} are allowed"
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct AssignmentRequest {
    pub subject_id: String,
    #[serde(default)]
    pub dates: Vec<NaiveDate>,
    #[serde(default)]
    pub time: TimeRange,
}

#[derive(Debug, Deserialize)]
pub struct BuildTimetableRequest {
    #[serde(default)]
    pub policy: AssignmentPolicy,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub assignments: Vec<AssignmentRequest>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TimetableResponse {
    pub columns: Vec<String>,
    pub rows: Vec<TimetableRow>,
}

impl TimetableResponse {
    fn from_dataframe(df: &DataFrame) -> PolarsResult<Self> {
        Ok(Self {
            columns: df.get_column_names().iter().map(|c| c.to_string()).collect(),
            rows: Timetable::from_dataframe(df)?.rows().to_vec(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PdfRequest {
    pub rows: Vec<TimetableRow>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/calendar", get(get_calendar).put(update_calendar))
        .route("/dates", post(list_dates))
        .route("/timetable", post(build_timetable))
        .route("/timetable/pdf", post(timetable_pdf))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, calendar: ExamCalendar) -> std::io::Result<()> {
    let state = AppState::new(calendar);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_calendar(State(state): State<AppState>) -> Json<ExamCalendarConfig> {
    Json(state.calendar().to_config())
}

async fn update_calendar(
    State(state): State<AppState>,
    Json(config): Json<ExamCalendarConfig>,
) -> Result<Json<ExamCalendarConfig>, ApiError> {
    let calendar =
        ExamCalendar::from_config(&config).map_err(|err| ApiError::invalid(err.to_string()))?;
    let current = calendar.to_config();
    *state.calendar.write() = calendar;
    Ok(Json(current))
}

async fn list_dates(
    State(state): State<AppState>,
    Json(range): Json<DateRangeRequest>,
) -> Result<Json<Vec<DateSlot>>, ApiError> {
    range.check()?;
    Ok(Json(state.calendar().available_slots(range.start, range.end)))
}

async fn build_timetable(
    State(state): State<AppState>,
    Json(request): Json<BuildTimetableRequest>,
) -> Result<Json<TimetableResponse>, ApiError> {
    check_window(request.start, request.end)?;
    let mut book = AssignmentBook::new(
        request.policy,
        state.calendar(),
        request.start,
        request.end,
        request.subjects,
    );
    for assignment in request.assignments {
        book.assign(&assignment.subject_id, &assignment.dates, assignment.time)?;
    }
    let timetable = book.complete_timetable()?;
    info!(policy = %request.policy, rows = timetable.len(), "timetable built over http");
    let table = timetable
        .to_dataframe()
        .and_then(|df| TimetableResponse::from_dataframe(&df))
        .map_err(|err| ApiError::internal(err.to_string()))?;
    Ok(Json(table))
}

async fn timetable_pdf(Json(request): Json<PdfRequest>) -> Result<Response, ApiError> {
    let timetable = Timetable::from_rows(request.rows);
    let bytes = render_pdf(&timetable).map_err(|err| ApiError::internal(err.to_string()))?;
    let disposition = format!("attachment; filename=\"{PDF_FILE_NAME}\"");
    Ok((
        [
            (header::CONTENT_TYPE, PDF_MEDIA_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
