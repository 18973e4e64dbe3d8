//! JSON report writer
//!
//! The only output format this crate produces — the teacher's analyzer
//! also emitted HTML, CSV and Markdown reports, but a simulation or
//! optimiser result is consumed by other tooling far more often than read
//! by a person, so JSON is the one format kept.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::errors::SchedulerError;

pub struct JsonReportWriter;

impl JsonReportWriter {
    pub fn write_to_file<T: Serialize>(path: &Path, report: &T) -> Result<(), SchedulerError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, report)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn write_to_stdout<T: Serialize>(report: &T) -> Result<(), SchedulerError> {
        let json = serde_json::to_string_pretty(report)?;
        println!("{json}");
        Ok(())
    }
}
