use crate::timetable::{COLUMNS, Timetable, TimetableRow};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub mod pdf;

pub use pdf::{
    PDF_FILE_NAME, PDF_MEDIA_TYPE, PageLayout, layout_pages, render_pdf, save_timetable_to_pdf,
};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("pdf error: {0}")]
    Pdf(String),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Writes `Date,Subject,Time` followed by one record per row.
pub fn write_timetable_csv<W: Write>(timetable: &Timetable, writer: W) -> ExportResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(COLUMNS)?;
    for row in timetable.rows() {
        writer.write_record(row.cells())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_timetable_to_csv<P: AsRef<Path>>(timetable: &Timetable, path: P) -> ExportResult<()> {
    let file = File::create(path.as_ref())?;
    write_timetable_csv(timetable, file)?;
    info!(path = %path.as_ref().display(), rows = timetable.len(), "timetable written as csv");
    Ok(())
}

pub fn load_timetable_from_csv<P: AsRef<Path>>(path: P) -> ExportResult<Timetable> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let headers = reader.headers()?.clone();
    if headers.iter().collect::<Vec<_>>() != COLUMNS {
        return Err(ExportError::InvalidData(format!(
            "expected columns {:?}, found {:?}",
            COLUMNS,
            headers.iter().collect::<Vec<_>>()
        )));
    }
    let mut rows = Vec::new();
    for record in reader.deserialize::<TimetableRow>() {
        rows.push(record?);
    }
    Ok(Timetable::from_rows(rows))
}

pub fn save_timetable_to_json<P: AsRef<Path>>(timetable: &Timetable, path: P) -> ExportResult<()> {
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, timetable)?;
    info!(path = %path.as_ref().display(), rows = timetable.len(), "timetable written as json");
    Ok(())
}

pub fn load_timetable_from_json<P: AsRef<Path>>(path: P) -> ExportResult<Timetable> {
    let file = File::open(path)?;
    let timetable: Timetable = serde_json::from_reader(file)?;
    Ok(timetable)
}
