//! Fixed-layout PDF rendering of a timetable.
//!
//! Layout is computed first as plain data ([`layout_pages`]) and only then drawn with
//! printpdf, so cell geometry can be checked without parsing PDF bytes.
//!
//! Geometry: A4 portrait, 10 mm left/top margin, columns 40/90/60 mm, rows 10 mm, all
//! cells bordered. A row that would cross the 20 mm bottom margin starts a new page;
//! the header is printed once, on the first page.

use super::{ExportError, ExportResult};
use crate::timetable::{COLUMNS, Timetable};
use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};
use std::fs;
use std::path::Path;
use tracing::info;

pub const PDF_FILE_NAME: &str = "timetable.pdf";
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 10.0;
pub const BOTTOM_MARGIN_MM: f32 = 20.0;
pub const COLUMN_WIDTHS_MM: [f32; 3] = [40.0, 90.0, 60.0];
pub const ROW_HEIGHT_MM: f32 = 10.0;
pub const FONT_SIZE_PT: f32 = 12.0;
const CELL_PADDING_MM: f32 = 1.0;
const LINE_WIDTH_PT: f32 = 0.567;
const PT_TO_MM: f32 = 25.4 / 72.0;

#[derive(Debug, Clone, PartialEq)]
pub struct CellLayout {
    /// Left edge, mm from the left of the page.
    pub x: f32,
    /// Top edge, mm from the top of the page.
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub text: String,
    pub bold: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageLayout {
    pub cells: Vec<CellLayout>,
}

fn push_row(page: &mut PageLayout, y: f32, texts: &[&str], bold: bool) {
    let mut x = MARGIN_MM;
    for (text, width) in texts.iter().zip(COLUMN_WIDTHS_MM) {
        page.cells.push(CellLayout {
            x,
            y,
            width,
            height: ROW_HEIGHT_MM,
            text: text.to_string(),
            bold,
        });
        x += width;
    }
}

pub fn layout_pages(timetable: &Timetable) -> Vec<PageLayout> {
    let break_at = PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM;
    let mut pages = Vec::new();
    let mut page = PageLayout::default();
    let mut y = MARGIN_MM;

    push_row(&mut page, y, &COLUMNS, true);
    y += ROW_HEIGHT_MM;

    for row in timetable.rows() {
        if y + ROW_HEIGHT_MM > break_at {
            pages.push(std::mem::take(&mut page));
            y = MARGIN_MM;
        }
        push_row(&mut page, y, &row.cells(), false);
        y += ROW_HEIGHT_MM;
    }
    pages.push(page);
    pages
}

fn draw_cell(
    layer: &PdfLayerReference,
    cell: &CellLayout,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    let top = PAGE_HEIGHT_MM - cell.y;
    let bottom = top - cell.height;
    let left = cell.x;
    let right = cell.x + cell.width;
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(left), Mm(top)), false),
            (Point::new(Mm(right), Mm(top)), false),
            (Point::new(Mm(right), Mm(bottom)), false),
            (Point::new(Mm(left), Mm(bottom)), false),
        ],
        is_closed: true,
    });

    if cell.text.is_empty() {
        return;
    }
    // baseline: vertically centred, as the classic cell layout does
    let baseline = cell.y + cell.height / 2.0 + 0.3 * FONT_SIZE_PT * PT_TO_MM;
    let font = if cell.bold { bold } else { regular };
    layer.use_text(
        cell.text.as_str(),
        FONT_SIZE_PT,
        Mm(cell.x + CELL_PADDING_MM),
        Mm(PAGE_HEIGHT_MM - baseline),
        font,
    );
}

fn pdf_error(err: impl std::fmt::Display) -> ExportError {
    ExportError::Pdf(err.to_string())
}

/// Encodes the timetable as PDF bytes.
pub fn render_pdf(timetable: &Timetable) -> ExportResult<Vec<u8>> {
    let pages = layout_pages(timetable);
    let (doc, first_page, first_layer) = PdfDocument::new(
        "Timetable",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Timetable",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    for (idx, page) in pages.iter().enumerate() {
        let layer = if idx == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_idx, layer_idx) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Timetable");
            doc.get_page(page_idx).get_layer(layer_idx)
        };
        layer.set_outline_thickness(LINE_WIDTH_PT);
        for cell in &page.cells {
            draw_cell(&layer, cell, &regular, &bold);
        }
    }

    let bytes = doc.save_to_bytes().map_err(pdf_error)?;
    info!(
        rows = timetable.len(),
        pages = pages.len(),
        bytes = bytes.len(),
        "timetable rendered as pdf"
    );
    Ok(bytes)
}

pub fn save_timetable_to_pdf<P: AsRef<Path>>(timetable: &Timetable, path: P) -> ExportResult<()> {
    let bytes = render_pdf(timetable)?;
    fs::write(path, bytes)?;
    Ok(())
}
