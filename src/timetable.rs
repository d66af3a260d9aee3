use crate::assignment::TimeRange;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const DATE_FORMAT: &str = "%d/%m/%Y";
pub const COLUMNS: [&str; 3] = ["Date", "Subject", "Time"];

/// One rendered line of the timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Time")]
    pub time: String,
}

impl TimetableRow {
    pub fn new(date: NaiveDate, subject: &str, time: &TimeRange) -> Self {
        Self {
            date: date.format(DATE_FORMAT).to_string(),
            subject: subject.to_string(),
            time: time.to_string(),
        }
    }

    pub fn cells(&self) -> [&str; 3] {
        [&self.date, &self.subject, &self.time]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timetable {
    rows: Vec<TimetableRow>,
}

impl Timetable {
    pub fn from_rows(rows: Vec<TimetableRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[TimetableRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let dates: Vec<&str> = self.rows.iter().map(|r| r.date.as_str()).collect();
        let subjects: Vec<&str> = self.rows.iter().map(|r| r.subject.as_str()).collect();
        let times: Vec<&str> = self.rows.iter().map(|r| r.time.as_str()).collect();
        df!(
            COLUMNS[0] => dates,
            COLUMNS[1] => subjects,
            COLUMNS[2] => times
        )
    }

    pub fn from_dataframe(df: &DataFrame) -> PolarsResult<Self> {
        let dates = df.column(COLUMNS[0])?.str()?;
        let subjects = df.column(COLUMNS[1])?.str()?;
        let times = df.column(COLUMNS[2])?.str()?;
        let mut rows = Vec::with_capacity(df.height());
        for idx in 0..df.height() {
            rows.push(TimetableRow {
                date: dates.get(idx).unwrap_or_default().to_string(),
                subject: subjects.get(idx).unwrap_or_default().to_string(),
                time: times.get(idx).unwrap_or_default().to_string(),
            });
        }
        Ok(Self { rows })
    }

    /// Boxed plain-text table for terminals, drawn from the DataFrame view.
    pub fn render_text_table(&self) -> PolarsResult<String> {
        Ok(render_dataframe(&self.to_dataframe()?))
    }
}

fn cell_text(value: AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    }
}

/// Renders any DataFrame as a boxed table, one line per row.
pub fn render_dataframe(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();
    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| col.get(row_idx).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = names.iter().map(|n| n.chars().count()).collect();
    for row in &cells {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_line(&mut out, &names, &widths);
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        push_line(&mut out, row, &widths);
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    out.push('|');
    for (cell, width) in cells.iter().zip(widths) {
        out.push(' ');
        out.push_str(cell);
        let pad = width.saturating_sub(cell.chars().count());
        out.push_str(&" ".repeat(pad));
        out.push(' ');
        out.push('|');
    }
    out.push('\n');
}
