//! CSV renderer.
//!
//! Serializes flat records as delimited, quoted text straight to an
//! `io::Write` sink. Nothing is accumulated; every call writes through.

use crate::model::ExportRecord;
use crate::render::{FIELD_NAMES, RenderFormat, Renderer, field_value};
use std::io::Write;

/// A [`Renderer`] emitting delimiter-separated rows.
pub struct CsvRenderer<W: Write> {
    out: W,
    format: RenderFormat,
}

impl<W: Write> CsvRenderer<W> {
    /// Create a renderer with an explicit format.
    pub fn new(out: W, format: RenderFormat) -> Self {
        Self { out, format }
    }

    /// Create a renderer for the "Excel CSV" variant (`,` / CRLF / `"`).
    pub fn excel_csv(out: W) -> Self {
        Self::new(out, RenderFormat::excel_csv())
    }

    fn render_one(&mut self, record: &ExportRecord) -> std::io::Result<()> {
        for (i, name) in FIELD_NAMES.iter().enumerate() {
            if i > 0 {
                self.out.write_all(self.format.field_separator.as_bytes())?;
            }
            let value = field_value(record, name).render();
            self.out
                .write_all(self.format.quote_field(&value).as_bytes())?;
        }
        self.out.write_all(self.format.record_separator.as_bytes())
    }
}

impl<W: Write> Renderer for CsvRenderer<W> {
    fn render_header(&mut self) -> std::io::Result<()> {
        for (i, name) in FIELD_NAMES.iter().enumerate() {
            if i > 0 {
                self.out.write_all(self.format.field_separator.as_bytes())?;
            }
            self.out.write_all(name.as_bytes())?;
        }
        self.out.write_all(self.format.record_separator.as_bytes())
    }

    fn render_partial_results(&mut self, records: &[ExportRecord]) -> std::io::Result<()> {
        for record in records {
            self.render_one(record)?;
        }
        Ok(())
    }

    fn render_footer(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    fn fini(&mut self) {}
}
