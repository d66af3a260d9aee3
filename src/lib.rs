pub mod assignment;
pub mod backend;
pub mod calendar;
pub mod config;
pub mod export;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod logging;
pub mod model;
pub mod session;
pub mod timetable;

pub use assignment::{Assignment, AssignmentBook, AssignmentPolicy, AssignmentRejection, TimeRange};
pub use backend::{
    Backend, BackendError, BackendResult, HttpBackend, SaveOutcome, courses_or_empty,
    subjects_or_empty,
};
pub use calendar::{CalendarError, DateSlot, ExamCalendar, ExamCalendarConfig, Unavailable};
pub use config::{BackendConfig, ConfigError, TimetableConfig};
pub use export::{
    ExportError, PDF_FILE_NAME, PDF_MEDIA_TYPE, load_timetable_from_csv, load_timetable_from_json,
    render_pdf, save_timetable_to_csv, save_timetable_to_json, save_timetable_to_pdf,
    write_timetable_csv,
};
pub use model::{Course, ExamWindow, Subject};
pub use session::{Generated, SessionError, TimetableSession};
pub use timetable::{Timetable, TimetableRow};
