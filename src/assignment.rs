//! Pairing subjects with exam dates and times.
//!
//! An [`AssignmentBook`] runs under exactly one [`AssignmentPolicy`]:
//!
//! * `Strict`: one date per subject, no date shared between subjects.
//! * `MultiSelect`: any number of dates per subject from the open-date pool, sharing allowed.
//!
//! Every call validates first and only then mutates, so a rejected call leaves the
//! book as it was and the front end can simply ask again.

use crate::calendar::{DateSlot, ExamCalendar, Unavailable, weekday_name};
use crate::model::Subject;
use crate::timetable::{Timetable, TimetableRow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const TIME_SEPARATOR: &str = " to ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentPolicy {
    #[default]
    Strict,
    MultiSelect,
}

impl AssignmentPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentPolicy::Strict => "strict",
            AssignmentPolicy::MultiSelect => "multi_select",
        }
    }
}

impl FromStr for AssignmentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(AssignmentPolicy::Strict),
            "multi" | "multi_select" | "multi-select" => Ok(AssignmentPolicy::MultiSelect),
            other => Err(format!("unknown assignment policy '{other}'")),
        }
    }
}

impl fmt::Display for AssignmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-text start and end of an exam. Never validated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

impl TimeRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Splits on the first `" to "`; without one the whole text is the start.
    pub fn parse(text: &str) -> Self {
        match text.split_once(TIME_SEPARATOR) {
            Some((start, end)) => Self::new(start.trim(), end.trim()),
            None => Self::new(text.trim(), ""),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.start, TIME_SEPARATOR, self.end)
    }
}

fn dmy(date: &NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn weekday_label(weekday: &chrono::Weekday) -> &'static str {
    weekday_name(*weekday)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignmentRejection {
    #[error("Unknown subject '{subject_id}'.")]
    UnknownSubject { subject_id: String },
    #[error("Exactly one date must be chosen per subject (got {count}).")]
    ExpectedSingleDate { count: usize },
    #[error(
        "The date {} is outside the timetable window {} - {}.",
        dmy(.date),
        dmy(.start),
        dmy(.end)
    )]
    OutsideWindow {
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },
    #[error("The date {} is a {}. Please choose a different date.", dmy(.date), weekday_label(.weekday))]
    DisallowedWeekday {
        date: NaiveDate,
        weekday: chrono::Weekday,
    },
    #[error("The date {} is a holiday. Please choose a different date.", dmy(.date))]
    Holiday { date: NaiveDate },
    #[error(
        "The date {} is already selected for {}. Please choose a different date.",
        dmy(.date),
        .subject
    )]
    AlreadyClaimed { date: NaiveDate, subject: String },
    #[error("No exam date chosen for {}.", .subjects.join(", "))]
    MissingDates { subjects: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub subject_id: String,
    pub subject_name: String,
    /// Ascending, no duplicates.
    pub dates: Vec<NaiveDate>,
    pub time: TimeRange,
}

pub struct AssignmentBook {
    policy: AssignmentPolicy,
    calendar: ExamCalendar,
    start: NaiveDate,
    end: NaiveDate,
    subjects: Vec<Subject>,
    entries: HashMap<String, Assignment>,
}

impl AssignmentBook {
    pub fn new(
        policy: AssignmentPolicy,
        calendar: ExamCalendar,
        start: NaiveDate,
        end: NaiveDate,
        subjects: Vec<Subject>,
    ) -> Self {
        Self {
            policy,
            calendar,
            start,
            end,
            subjects,
            entries: HashMap::new(),
        }
    }

    pub fn policy(&self) -> AssignmentPolicy {
        self.policy
    }

    pub fn calendar(&self) -> &ExamCalendar {
        &self.calendar
    }

    pub fn window(&self) -> (NaiveDate, NaiveDate) {
        (self.start, self.end)
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// Date offered first for each subject.
    pub fn default_date(&self) -> NaiveDate {
        self.start
    }

    pub fn valid_dates(&self) -> Vec<DateSlot> {
        self.calendar.available_slots(self.start, self.end)
    }

    pub fn assignment(&self, subject_id: &str) -> Option<&Assignment> {
        self.entries.get(subject_id)
    }

    pub fn pending_subjects(&self) -> Vec<&Subject> {
        self.subjects
            .iter()
            .filter(|subject| !self.entries.contains_key(&subject.id))
            .collect()
    }

    /// Subject holding `date`, ignoring `except`.
    pub fn claimed_by(&self, date: NaiveDate, except: Option<&str>) -> Option<&Assignment> {
        self.subjects
            .iter()
            .filter(|subject| Some(subject.id.as_str()) != except)
            .filter_map(|subject| self.entries.get(&subject.id))
            .find(|entry| entry.dates.contains(&date))
    }

    fn subject(&self, subject_id: &str) -> Result<&Subject, AssignmentRejection> {
        self.subjects
            .iter()
            .find(|subject| subject.id == subject_id)
            .ok_or_else(|| AssignmentRejection::UnknownSubject {
                subject_id: subject_id.to_string(),
            })
    }

    fn check_open(&self, date: NaiveDate) -> Result<(), AssignmentRejection> {
        if date < self.start || date > self.end {
            return Err(AssignmentRejection::OutsideWindow {
                date,
                start: self.start,
                end: self.end,
            });
        }
        match self.calendar.unavailability(date) {
            Some(Unavailable::DisallowedWeekday(weekday)) => {
                Err(AssignmentRejection::DisallowedWeekday { date, weekday })
            }
            Some(Unavailable::Holiday) => Err(AssignmentRejection::Holiday { date }),
            None => Ok(()),
        }
    }

    /// Validates one candidate date for a subject without changing the book.
    pub fn check_date(&self, subject_id: &str, date: NaiveDate) -> Result<(), AssignmentRejection> {
        self.subject(subject_id)?;
        self.check_open(date)?;
        if self.policy == AssignmentPolicy::Strict {
            if let Some(owner) = self.claimed_by(date, Some(subject_id)) {
                return Err(AssignmentRejection::AlreadyClaimed {
                    date,
                    subject: owner.subject_name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Records `dates` and `time` for a subject, replacing any previous entry.
    pub fn assign(
        &mut self,
        subject_id: &str,
        dates: &[NaiveDate],
        time: TimeRange,
    ) -> Result<&Assignment, AssignmentRejection> {
        let subject_name = self.subject(subject_id)?.name.clone();
        if self.policy == AssignmentPolicy::Strict && dates.len() != 1 {
            return Err(AssignmentRejection::ExpectedSingleDate { count: dates.len() });
        }
        for date in dates {
            self.check_date(subject_id, *date)?;
        }

        let mut dates = dates.to_vec();
        dates.sort();
        dates.dedup();

        let entry = Assignment {
            subject_id: subject_id.to_string(),
            subject_name,
            dates,
            time,
        };
        self.entries.insert(subject_id.to_string(), entry);
        Ok(&self.entries[subject_id])
    }

    pub fn assign_one(
        &mut self,
        subject_id: &str,
        date: NaiveDate,
        time: TimeRange,
    ) -> Result<&Assignment, AssignmentRejection> {
        self.assign(subject_id, &[date], time)
    }

    pub fn unassign(&mut self, subject_id: &str) -> Option<Assignment> {
        self.entries.remove(subject_id)
    }

    /// Moves the book to a new window and calendar. Entries are replayed in subject
    /// order; the ids of subjects whose entry no longer validates are returned and
    /// those subjects become pending again.
    pub fn rebase(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
        calendar: ExamCalendar,
    ) -> Vec<String> {
        self.start = start;
        self.end = end;
        self.calendar = calendar;

        let mut previous = std::mem::take(&mut self.entries);
        let order: Vec<String> = self.subjects.iter().map(|s| s.id.clone()).collect();
        let mut dropped = Vec::new();
        for subject_id in order {
            let Some(entry) = previous.remove(&subject_id) else {
                continue;
            };
            if self.assign(&subject_id, &entry.dates, entry.time).is_err() {
                dropped.push(subject_id);
            }
        }
        dropped
    }

    /// Final timetable. Under `Strict` every subject must hold its date first; the
    /// rejection names the subjects still pending.
    pub fn complete_timetable(&self) -> Result<Timetable, AssignmentRejection> {
        if self.policy == AssignmentPolicy::Strict {
            let pending: Vec<String> = self
                .pending_subjects()
                .into_iter()
                .map(|subject| subject.name.clone())
                .collect();
            if !pending.is_empty() {
                return Err(AssignmentRejection::MissingDates { subjects: pending });
            }
        }
        Ok(self.build_timetable())
    }

    /// Rows in subject order, one per assigned date.
    pub fn build_timetable(&self) -> Timetable {
        let rows = self
            .subjects
            .iter()
            .filter_map(|subject| self.entries.get(&subject.id))
            .flat_map(|entry| {
                entry
                    .dates
                    .iter()
                    .map(|date| TimetableRow::new(*date, &entry.subject_name, &entry.time))
            })
            .collect();
        Timetable::from_rows(rows)
    }
}
