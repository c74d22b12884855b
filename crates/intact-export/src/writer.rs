//! Buffered output files for the per-entry line formats
//!
//! A [`LineWriter`] writes the format header on creation and flushes after
//! every record, so a failure part-way through a run leaves every record
//! written so far on disk. The file is flushed again when the writer is
//! finished or dropped.

use crate::error::{ExportError, Result};
use crate::lines::{FormatVersion, LineFormat};
use chrono::NaiveDate;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct LineWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    format: LineFormat,
    records: usize,
    finished: bool,
}

impl LineWriter {
    /// Create (or truncate) `path` and write the header of `format`
    pub fn create(
        path: impl AsRef<Path>,
        format: LineFormat,
        version: FormatVersion,
        generated_by: &str,
        date: NaiveDate,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !format.supports(version) {
            return Err(ExportError::Config(format!(
                "{} output does not support version {}",
                format, version
            )));
        }

        let file = File::create(&path).map_err(|e| ExportError::sink(&path, e))?;
        let mut writer = Self {
            writer: BufWriter::new(file),
            path,
            format,
            records: 0,
            finished: false,
        };

        let header = format!(
            "{}\n!generated-by: {}\n!date-generated: {}\n",
            format.version_header(version),
            generated_by,
            date.format("%Y-%m-%d")
        );
        writer.write_and_flush(&header)?;
        debug!(path = %writer.path.display(), %format, %version, "Opened output file");

        Ok(writer)
    }

    fn write_and_flush(&mut self, text: &str) -> Result<()> {
        self.writer
            .write_all(text.as_bytes())
            .and_then(|()| self.writer.flush())
            .map_err(|e| ExportError::sink(&self.path, e))
    }

    /// Append one rendered record; empty records are ignored
    pub fn write_record(&mut self, record: &str) -> Result<()> {
        if record.is_empty() {
            return Ok(());
        }
        self.write_and_flush(record)?;
        self.records += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> LineFormat {
        self.format
    }

    pub fn records(&self) -> usize {
        self.records
    }

    /// Flush and close, returning the number of records written
    pub fn finish(mut self) -> Result<usize> {
        self.finished = true;
        self.writer
            .flush()
            .map_err(|e| ExportError::sink(&self.path, e))?;
        Ok(self.records)
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.writer.flush() {
                warn!(path = %self.path.display(), error = %e, "Failed to flush output on drop");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    #[test]
    fn test_header_and_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.gpad");

        let mut writer = LineWriter::create(&path, LineFormat::Go, FormatVersion::V2, "IntAct", date()).unwrap();
        writer.write_record("a\tb\t\n").unwrap();
        writer.write_record("").unwrap();
        writer.write_record("c\td\t\n").unwrap();
        assert_eq!(writer.finish().unwrap(), 2);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "!gpad-version: 2.0\n!generated-by: IntAct\n!date-generated: 2024-05-17\na\tb\t\nc\td\t\n"
        );
    }

    #[test]
    fn test_records_visible_before_finish() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.dr");

        let mut writer = LineWriter::create(&path, LineFormat::Dr, FormatVersion::V1, "IntAct", date()).unwrap();
        writer.write_record("P1\tIntAct\tP1\t1\t\n").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("P1\tIntAct\tP1\t1\t\n"));
        drop(writer);
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let dir = TempDir::new().unwrap();
        let result = LineWriter::create(dir.path().join("out.cc"), LineFormat::Cc, FormatVersion::V2, "IntAct", date());
        assert!(matches!(result, Err(ExportError::Config(_))));
    }

    #[test]
    fn test_missing_directory_is_sink_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.gpi");
        let result = LineWriter::create(&path, LineFormat::Gpi, FormatVersion::V1, "IntAct", date());
        assert!(matches!(result, Err(ExportError::Sink { .. })));
    }
}
