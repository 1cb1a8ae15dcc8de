use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, DataType, Reader};
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};
use crate::models::RawRecord;

const REQUIRED_COLUMNS: [&str; 3] = ["date", "unique_code", "updated_at"];
const SPREADSHEET_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

#[derive(serde::Deserialize)]
struct CsvRow {
    date: String,
    unique_code: String,
    /// Free-text duration; the export names this column `updated_at`.
    updated_at: String,
    #[serde(rename = "Pilnas vardas", default)]
    full_name: Option<String>,
    #[serde(rename = "miestas", default)]
    city: Option<String>,
}

/// Spreadsheet and CSV exports in `dir`, sorted by file name.
pub fn input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(PipelineError::NoInputData(dir.to_path_buf()));
        }
        Err(source) => {
            return Err(PipelineError::Io {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| PipelineError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if !path.is_file() {
            continue;
        }
        // Office keeps `~$name.xlsx` lock files next to open workbooks.
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with('.') || name.starts_with("~$"));
        if hidden || format_of(&path).is_none() {
            warn!(path = %path.display(), "skipping unsupported input file");
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputFormat {
    Csv,
    Spreadsheet,
}

fn format_of(path: &Path) -> Option<InputFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if ext == "csv" {
        Some(InputFormat::Csv)
    } else if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
        Some(InputFormat::Spreadsheet)
    } else {
        None
    }
}

pub fn load_file(path: &Path) -> Result<Vec<RawRecord>> {
    let records = match format_of(path) {
        Some(InputFormat::Spreadsheet) => load_workbook(path)?,
        _ => load_csv(path)?,
    };
    debug!(path = %path.display(), rows = records.len(), "loaded input file");
    Ok(records)
}

fn load_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(|source| malformed(path, source))?;

    let headers = reader
        .headers()
        .map_err(|source| malformed(path, source))?
        .clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(PipelineError::MissingColumn {
                path: path.to_path_buf(),
                column,
            });
        }
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let raw = result.map_err(|source| malformed(path, source))?;
        let line = raw.position().map(|p| p.line()).unwrap_or(0);
        let row: CsvRow = raw
            .deserialize(Some(&headers))
            .map_err(|source| malformed(path, source))?;

        records.push(RawRecord {
            origin: format!("{}:{}", path.display(), line),
            volunteer_id: row.unique_code,
            date: row.date,
            duration_text: row.updated_at,
            full_name: row.full_name,
            city: row.city,
        });
    }
    Ok(records)
}

/// Rows of the first worksheet; the first non-empty row is the header.
fn load_workbook(path: &Path) -> Result<Vec<RawRecord>> {
    let workbook_error = |source| PipelineError::Workbook {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook = open_workbook_auto(path).map_err(workbook_error)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PipelineError::NoWorksheet {
            path: path.to_path_buf(),
        })?
        .map_err(workbook_error)?;

    let first_row = range.start().map(|(row, _)| row as u64).unwrap_or(0);
    let mut rows = range
        .rows()
        .enumerate()
        .filter(|(_, cells)| cells.iter().any(|cell| !cell.is_empty()));
    let Some((_, header)) = rows.next() else {
        return Ok(Vec::new());
    };
    let header: Vec<String> = header
        .iter()
        .map(|cell| cell_text(cell).unwrap_or_default().trim().to_string())
        .collect();

    let column = |name: &'static str| {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| PipelineError::MissingColumn {
                path: path.to_path_buf(),
                column: name,
            })
    };
    let date_col = column("date")?;
    let id_col = column("unique_code")?;
    let duration_col = column("updated_at")?;
    let name_col = header.iter().position(|h| h == "Pilnas vardas");
    let city_col = header.iter().position(|h| h == "miestas");

    let cell = |cells: &[Data], col: Option<usize>| {
        col.and_then(|col| cells.get(col)).and_then(cell_text)
    };

    let mut records = Vec::new();
    for (index, cells) in rows {
        records.push(RawRecord {
            origin: format!("{}:{}", path.display(), first_row + index as u64 + 1),
            volunteer_id: cell(cells, Some(id_col)).unwrap_or_default(),
            date: cell(cells, Some(date_col)).unwrap_or_default(),
            duration_text: cell(cells, Some(duration_col)).unwrap_or_default(),
            full_name: cell(cells, name_col),
            city: cell(cells, city_col),
        });
    }
    Ok(records)
}

/// Cell contents as the text a CSV export of the same sheet would hold.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => {
            Some(text.clone())
        }
        Data::Int(value) => Some(value.to_string()),
        Data::Float(value) => Some(value.to_string()),
        Data::Bool(value) => Some(value.to_string()),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|value| value.format("%Y-%m-%d %H:%M:%S").to_string()),
        Data::Error(err) => Some(err.to_string()),
    }
}

/// Every export in `dir`, concatenated in file-name order.
pub fn load_dir(dir: &Path) -> Result<Vec<RawRecord>> {
    let files = input_files(dir)?;
    let mut records = Vec::new();
    for path in &files {
        records.extend(load_file(path)?);
    }

    if records.is_empty() {
        return Err(PipelineError::NoInputData(dir.to_path_buf()));
    }
    info!(files = files.len(), rows = records.len(), dir = %dir.display(), "loaded input");
    Ok(records)
}

fn malformed(path: &Path, source: csv::Error) -> PipelineError {
    PipelineError::MalformedRow {
        path: path.to_path_buf(),
        source,
    }
}
