use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// A calendar date that is open for exams, paired with its weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateSlot {
    pub date: NaiveDate,
    pub weekday: Weekday,
}

impl DateSlot {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            weekday: date.weekday(),
        }
    }

    /// English weekday name, e.g. "Monday".
    pub fn weekday_name(&self) -> &'static str {
        weekday_name(self.weekday)
    }
}

impl fmt::Display for DateSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.date.format("%d/%m/%Y"), self.weekday_name())
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Why a date cannot carry an exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    DisallowedWeekday(Weekday),
    Holiday,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("exam calendar must leave at least one weekday open for exams")]
    NoSchedulableWeekday,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamCalendar {
    holidays: HashSet<NaiveDate>,
    disallowed_days: HashSet<Weekday>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamCalendarConfig {
    #[serde(default = "default_disallowed_days")]
    disallowed_days: Vec<Weekday>,
    #[serde(default)]
    holidays: Vec<NaiveDate>,
}

fn default_disallowed_days() -> Vec<Weekday> {
    vec![Weekday::Sun]
}

impl Default for ExamCalendar {
    /// Sundays closed, no holidays.
    fn default() -> Self {
        Self {
            holidays: HashSet::new(),
            disallowed_days: HashSet::from([Weekday::Sun]),
        }
    }
}

impl ExamCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn custom<I, J>(disallowed_days: I, holidays: J) -> Result<Self, CalendarError>
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let config = ExamCalendarConfig::new(disallowed_days, holidays);
        Self::from_config(&config)
    }

    pub fn from_config(config: &ExamCalendarConfig) -> Result<Self, CalendarError> {
        let disallowed_days: HashSet<Weekday> = config.disallowed_days.iter().copied().collect();
        if disallowed_days.len() == Self::ALL_WEEKDAYS.len() {
            return Err(CalendarError::NoSchedulableWeekday);
        }
        Ok(Self {
            holidays: config.holidays.iter().copied().collect(),
            disallowed_days,
        })
    }

    pub fn to_config(&self) -> ExamCalendarConfig {
        ExamCalendarConfig::from(self)
    }

    /// Add a single holiday
    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    /// Add multiple holidays at once
    pub fn add_holidays(&mut self, dates: &[NaiveDate]) {
        self.holidays.extend(dates);
    }

    pub fn remove_holiday(&mut self, date: NaiveDate) -> bool {
        self.holidays.remove(&date)
    }

    /// Add the same holiday for multiple years.
    /// Invalid dates (Feb 29 outside leap years) are skipped.
    pub fn add_recurring_holiday(&mut self, month: u32, day: u32, start_year: i32, end_year: i32) {
        for year in start_year..=end_year {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                self.holidays.insert(date);
            }
        }
    }

    pub fn set_disallowed_days(&mut self, days: Vec<Weekday>) -> Result<(), CalendarError> {
        let days: HashSet<Weekday> = days.into_iter().collect();
        if days.len() == Self::ALL_WEEKDAYS.len() {
            return Err(CalendarError::NoSchedulableWeekday);
        }
        self.disallowed_days = days;
        Ok(())
    }

    /// Disallowed weekdays, Monday first.
    pub fn disallowed_days(&self) -> Vec<Weekday> {
        Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| self.disallowed_days.contains(day))
            .collect()
    }

    pub fn is_disallowed_weekday(&self, weekday: Weekday) -> bool {
        self.disallowed_days.contains(&weekday)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    pub fn unavailability(&self, date: NaiveDate) -> Option<Unavailable> {
        let weekday = date.weekday();
        if self.disallowed_days.contains(&weekday) {
            Some(Unavailable::DisallowedWeekday(weekday))
        } else if self.holidays.contains(&date) {
            Some(Unavailable::Holiday)
        } else {
            None
        }
    }

    /// Check if a date can carry an exam
    pub fn is_available(&self, date: NaiveDate) -> bool {
        self.unavailability(date).is_none()
    }

    /// All open dates in `[start, end]`, ascending. Empty when `start > end`.
    pub fn available_days_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        start
            .iter_days()
            .take_while(|day| *day <= end)
            .filter(|day| self.is_available(*day))
            .collect()
    }

    pub fn available_slots(&self, start: NaiveDate, end: NaiveDate) -> Vec<DateSlot> {
        self.available_days_in_range(start, end)
            .into_iter()
            .map(DateSlot::new)
            .collect()
    }

    /// Count open dates in a range
    pub fn count_available_days(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        start
            .iter_days()
            .take_while(|day| *day <= end)
            .filter(|day| self.is_available(*day))
            .count() as i64
    }
}

impl ExamCalendarConfig {
    pub fn new<I, J>(disallowed_days: I, holidays: J) -> Self
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let mut disallowed: Vec<Weekday> = disallowed_days.into_iter().collect();
        disallowed.sort_by_key(|wd| wd.num_days_from_monday());
        disallowed.dedup_by(|a, b| a.num_days_from_monday() == b.num_days_from_monday());

        let mut holidays: Vec<NaiveDate> = holidays.into_iter().collect();
        holidays.sort();
        holidays.dedup();

        Self {
            disallowed_days: disallowed,
            holidays,
        }
    }

    pub fn disallowed_days(&self) -> &[Weekday] {
        &self.disallowed_days
    }

    pub fn holidays(&self) -> &[NaiveDate] {
        &self.holidays
    }
}

impl Default for ExamCalendarConfig {
    fn default() -> Self {
        ExamCalendarConfig::from(&ExamCalendar::default())
    }
}

impl From<&ExamCalendar> for ExamCalendarConfig {
    fn from(calendar: &ExamCalendar) -> Self {
        let mut holidays: Vec<NaiveDate> = calendar.holidays.iter().copied().collect();
        holidays.sort();

        Self {
            disallowed_days: calendar.disallowed_days(),
            holidays,
        }
    }
}
