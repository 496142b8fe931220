use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use rust_xlsxwriter::{Format, Note, Workbook, XlsxError};
use tracing::{debug, info};

use crate::record::{EarthquakeRecord, FIELD_NAMES};

pub const SHEET_NAME: &str = "Earthquake Data";

const BLANK_NOTE: &str = "Blank cell: field not present in the catalog text. A 0 is a reported value.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Xlsx,
    Json,
}

impl ExportFormat {
    /// Guess from the file extension, defaulting to xlsx.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Xlsx,
        }
    }
}

/// Render all records and write them to `path` in one step. Nothing is left
/// at `path` if rendering or writing fails.
pub fn write_records(records: &[EarthquakeRecord], path: &Path, format: ExportFormat) -> Result<()> {
    let bytes = match format {
        ExportFormat::Xlsx => render_xlsx(records).context("building workbook")?,
        ExportFormat::Json => serde_json::to_vec_pretty(records).context("serializing records")?,
    };
    write_atomic(path, &bytes).with_context(|| format!("writing {}", path.display()))?;
    info!("File saved: {} ({} records)", path.display(), records.len());
    Ok(())
}

pub fn render_xlsx(records: &[EarthquakeRecord]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in FIELD_NAMES.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *name, &header)?;
        sheet.insert_note(0, col, &Note::new(BLANK_NOTE))?;
    }
    sheet.set_freeze_panes(1, 0)?;

    for (i, record) in records.iter().enumerate() {
        let row = i as u32 + 1;
        for (col, value) in record.values().into_iter().enumerate() {
            if let Some(v) = value {
                sheet.write_number(row, col as u16, v)?;
            }
        }
    }

    workbook.save_to_buffer()
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = part_path(path);
    if let Err(e) = fs::write(&tmp, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    debug!("Wrote {} bytes to {}", bytes.len(), tmp.display());
    fs::rename(&tmp, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

// ── Tests ──
