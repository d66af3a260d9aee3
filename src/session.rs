use crate::assignment::{Assignment, AssignmentBook, AssignmentRejection, TimeRange};
use crate::backend::{Backend, BackendResult, SaveOutcome, courses_or_empty, subjects_or_empty};
use crate::calendar::{CalendarError, ExamCalendar};
use crate::config::{ConfigError, MAX_WINDOW_DAYS, TimetableConfig};
use crate::model::{Course, ExamWindow, Subject};
use crate::timetable::Timetable;
use chrono::{Local, NaiveDate, TimeDelta};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no course selected")]
    NoCourseSelected,
    #[error("unknown course '{0}'")]
    UnknownCourse(String),
    #[error(transparent)]
    Rejected(#[from] AssignmentRejection),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error("window spans {days} days, at most {max} are allowed")]
    WindowTooLong { days: i64, max: i64 },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Output of one `generate` call.
#[derive(Debug)]
pub struct Generated {
    pub timetable: Timetable,
    /// Present when the exam window was sent. A transport failure is kept here so the
    /// timetable is still delivered.
    pub saved: Option<BackendResult<SaveOutcome>>,
}

/// In-memory selections of one interactive run.
pub struct TimetableSession<B: Backend> {
    backend: B,
    config: TimetableConfig,
    calendar: ExamCalendar,
    courses: Vec<Course>,
    selected: Option<Course>,
    book: Option<AssignmentBook>,
}

impl<B: Backend> TimetableSession<B> {
    pub fn new(backend: B, config: TimetableConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let calendar = ExamCalendar::from_config(&config.calendar)?;
        Ok(Self {
            backend,
            config,
            calendar,
            courses: Vec::new(),
            selected: None,
            book: None,
        })
    }

    pub fn config(&self) -> &TimetableConfig {
        &self.config
    }

    pub fn calendar(&self) -> &ExamCalendar {
        &self.calendar
    }

    /// Fetches courses; a failed read leaves the list empty.
    pub fn load_courses(&mut self) -> &[Course] {
        self.courses = courses_or_empty(&self.backend);
        &self.courses
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn selected_course(&self) -> Option<&Course> {
        self.selected.as_ref()
    }

    pub fn book(&self) -> Option<&AssignmentBook> {
        self.book.as_ref()
    }

    fn book_mut(&mut self) -> Result<&mut AssignmentBook, SessionError> {
        self.book.as_mut().ok_or(SessionError::NoCourseSelected)
    }

    fn default_window(&self) -> (NaiveDate, NaiveDate) {
        let today = Local::now().date_naive();
        let end = TimeDelta::try_days(self.config.default_window_days)
            .and_then(|span| today.checked_add_signed(span))
            .unwrap_or(NaiveDate::MAX);
        (today, end)
    }

    /// Selects a course by exact display name and opens a book over the default window.
    pub fn select_course(&mut self, name: &str) -> Result<&Course, SessionError> {
        let course = self
            .courses
            .iter()
            .find(|course| course.name == name)
            .cloned()
            .ok_or_else(|| SessionError::UnknownCourse(name.to_string()))?;
        let (start, end) = match &self.book {
            Some(book) => book.window(),
            None => self.default_window(),
        };
        self.open_book(course, start, end);
        self.selected.as_ref().ok_or(SessionError::NoCourseSelected)
    }

    fn open_book(&mut self, course: Course, start: NaiveDate, end: NaiveDate) {
        let subjects = subjects_or_empty(&self.backend, &course.id);
        info!(course = %course.name, subjects = subjects.len(), "course selected");
        self.book = Some(AssignmentBook::new(
            self.config.policy,
            self.calendar.clone(),
            start,
            end,
            subjects,
        ));
        self.selected = Some(course);
    }

    pub fn subjects(&self) -> &[Subject] {
        self.book.as_ref().map(|b| b.subjects()).unwrap_or(&[])
    }

    /// Moves the window; returns subjects whose entries had to be dropped.
    pub fn set_window(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<String>, SessionError> {
        let span = end.signed_duration_since(start).num_days();
        if span > MAX_WINDOW_DAYS {
            return Err(SessionError::WindowTooLong {
                days: span,
                max: MAX_WINDOW_DAYS,
            });
        }
        let calendar = self.calendar.clone();
        let dropped = self.book_mut()?.rebase(start, end, calendar);
        if !dropped.is_empty() {
            warn!(?dropped, "assignments dropped after window change");
        }
        Ok(dropped)
    }

    /// Adds a holiday; returns subjects whose entries had to be dropped.
    pub fn add_holiday(&mut self, date: NaiveDate) -> Vec<String> {
        self.calendar.add_holiday(date);
        let calendar = self.calendar.clone();
        match self.book.as_mut() {
            Some(book) => {
                let (start, end) = book.window();
                book.rebase(start, end, calendar)
            }
            None => Vec::new(),
        }
    }

    pub fn assign(
        &mut self,
        subject_id: &str,
        dates: &[NaiveDate],
        time: TimeRange,
    ) -> Result<&Assignment, SessionError> {
        Ok(self.book_mut()?.assign(subject_id, dates, time)?)
    }

    pub fn assign_one(
        &mut self,
        subject_id: &str,
        date: NaiveDate,
        time: TimeRange,
    ) -> Result<&Assignment, SessionError> {
        self.assign(subject_id, &[date], time)
    }

    pub fn unassign(&mut self, subject_id: &str) -> Result<Option<Assignment>, SessionError> {
        Ok(self.book_mut()?.unassign(subject_id))
    }

    pub fn preview(&self) -> Result<Timetable, SessionError> {
        let book = self.book.as_ref().ok_or(SessionError::NoCourseSelected)?;
        Ok(book.build_timetable())
    }

    /// Builds the timetable and, when `persist` is set, sends the exam window once.
    /// Nothing is sent while a `Strict` book still has pending subjects.
    pub fn generate(&self, persist: bool) -> Result<Generated, SessionError> {
        let book = self.book.as_ref().ok_or(SessionError::NoCourseSelected)?;
        let course = self.selected.as_ref().ok_or(SessionError::NoCourseSelected)?;
        let timetable = book.complete_timetable()?;
        info!(course = %course.name, rows = timetable.len(), "timetable generated");

        let saved = if persist {
            let (start, end) = book.window();
            let window = ExamWindow::new(course.id.clone(), start, end);
            let result = self.backend.save_exam_window(&window);
            if let Err(err) = &result {
                warn!(error = %err, "exam window not saved");
            }
            Some(result)
        } else {
            None
        };
        Ok(Generated { timetable, saved })
    }
}
