use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, XlsxError};
use serde::Serialize;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::models::{DataQuality, EnrichedRow};
use crate::month::Month;

pub const WORK_VIEW: &str = "work";
pub const DID_NOT_WORK_VIEW: &str = "did_not_work";
pub const ALL_VIEW: &str = "all";

const COLUMNS: [&str; 8] = [
    "month",
    "unique_code",
    "total_minutes",
    "rolling_sum",
    "exceeds_threshold",
    "first_month_longterm",
    "Pilnas vardas",
    "miestas",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportViews {
    pub first_month: Month,
    pub latest_month: Month,
    /// Long-term at the latest month and logged time in it.
    pub work: Vec<EnrichedRow>,
    /// Long-term at the latest month but logged nothing in it.
    pub did_not_work: Vec<EnrichedRow>,
    pub all: Vec<EnrichedRow>,
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    first_month: String,
    latest_month: String,
    generated_on: NaiveDate,
    volunteers: usize,
    work: usize,
    did_not_work: usize,
    all: usize,
    data_quality: &'a DataQuality,
}

/// Returns `None` when there are no rows to report on.
pub fn select_views(rows: Vec<EnrichedRow>) -> Option<ReportViews> {
    let first_month = rows.iter().map(|row| row.month).min()?;
    let latest_month = rows.iter().map(|row| row.month).max()?;

    let (work, did_not_work): (Vec<EnrichedRow>, Vec<EnrichedRow>) = rows
        .iter()
        .filter(|row| row.month == latest_month && row.exceeds_threshold)
        .cloned()
        .partition(|row| row.total_minutes > 0);

    Some(ReportViews {
        first_month,
        latest_month,
        work,
        did_not_work,
        all: rows,
    })
}

pub fn report_name(first: Month, last: Month, generated_on: NaiveDate) -> String {
    format!(
        "savanoriai_{}-{}_sugeneruota_{}",
        first.label(),
        last.label(),
        generated_on.format("%Y-%m-%d")
    )
}

pub fn build_report(views: &ReportViews, quality: &DataQuality, generated_on: NaiveDate) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Long-term Volunteer Report");
    let _ = writeln!(
        output,
        "Months {} to {} (generated {})",
        views.first_month.label(),
        views.latest_month.label(),
        generated_on
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Worked in {}", views.latest_month.label());

    if views.work.is_empty() {
        let _ = writeln!(output, "No long-term volunteers logged time this month.");
    } else {
        for row in &views.work {
            let _ = writeln!(
                output,
                "- {} ({}, {}) {} min this month, {} min over the window, long-term since {}",
                display_name(row),
                row.volunteer_id,
                row.city.as_deref().unwrap_or("unknown city"),
                row.total_minutes,
                row.rolling_sum,
                first_label(row)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Did Not Work in {}", views.latest_month.label());

    if views.did_not_work.is_empty() {
        let _ = writeln!(output, "Every long-term volunteer logged time this month.");
    } else {
        for row in &views.did_not_work {
            let _ = writeln!(
                output,
                "- {} ({}, {}) {} min over the window, long-term since {}",
                display_name(row),
                row.volunteer_id,
                row.city.as_deref().unwrap_or("unknown city"),
                row.rolling_sum,
                first_label(row)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Data Quality");
    let _ = writeln!(
        output,
        "- {} input rows, {} duplicates removed, {} records used",
        quality.input_rows, quality.duplicates_removed, quality.records_kept
    );

    if quality.unparseable.is_empty() {
        let _ = writeln!(output, "- All durations were readable.");
    } else {
        let _ = writeln!(
            output,
            "- {} durations could not be read and were counted as no time:",
            quality.unparseable_count()
        );
        for entry in &quality.unparseable {
            let _ = writeln!(output, "  - {}: \"{}\"", entry.volunteer_id, entry.text);
        }
    }

    output
}

fn display_name(row: &EnrichedRow) -> &str {
    row.full_name.as_deref().unwrap_or("(no name)")
}

fn first_label(row: &EnrichedRow) -> String {
    row.first_month_longterm
        .map(|month| month.label())
        .unwrap_or_else(|| "-".to_string())
}

fn write_sheet(workbook: &mut Workbook, name: &str, rows: &[EnrichedRow]) -> std::result::Result<(), XlsxError> {
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;
    for (col, title) in COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as ColNum, *title, &bold)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let r = RowNum::try_from(index + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        sheet.write_string(r, 0, row.month.to_string())?;
        sheet.write_string(r, 1, &row.volunteer_id)?;
        sheet.write_number(r, 2, row.total_minutes as f64)?;
        sheet.write_number(r, 3, row.rolling_sum as f64)?;
        sheet.write_boolean(r, 4, row.exceeds_threshold)?;
        if let Some(first) = row.first_month_longterm {
            sheet.write_string(r, 5, first.to_string())?;
        }
        if let Some(full_name) = &row.full_name {
            sheet.write_string(r, 6, full_name)?;
        }
        if let Some(city) = &row.city {
            sheet.write_string(r, 7, city)?;
        }
    }
    sheet.autofit();
    Ok(())
}

/// One workbook with a sheet per view, in `work`, `did_not_work`, `all` order.
fn write_workbook(path: &Path, views: &ReportViews) -> Result<()> {
    let xlsx_error = |source| PipelineError::Xlsx {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook = Workbook::new();
    write_sheet(&mut workbook, WORK_VIEW, &views.work).map_err(xlsx_error)?;
    write_sheet(&mut workbook, DID_NOT_WORK_VIEW, &views.did_not_work).map_err(xlsx_error)?;
    write_sheet(&mut workbook, ALL_VIEW, &views.all).map_err(xlsx_error)?;
    workbook.save(path).map_err(xlsx_error)
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `<out_dir>/<report name>.xlsx` with a digest and run summary next
/// to it, and returns the workbook path.
pub fn write_report(
    out_dir: &Path,
    views: &ReportViews,
    quality: &DataQuality,
    generated_on: NaiveDate,
) -> Result<PathBuf> {
    fs::create_dir_all(out_dir).map_err(|source| PipelineError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;
    let name = report_name(views.first_month, views.latest_month, generated_on);
    let target = out_dir.join(format!("{name}.xlsx"));

    write_workbook(&target, views)?;

    let markdown = build_report(views, quality, generated_on);
    write_file(&out_dir.join(format!("{name}.md")), markdown.as_bytes())?;

    let mut volunteers: Vec<&str> = views.all.iter().map(|r| r.volunteer_id.as_str()).collect();
    volunteers.sort_unstable();
    volunteers.dedup();
    let summary = RunSummary {
        first_month: views.first_month.label(),
        latest_month: views.latest_month.label(),
        generated_on,
        volunteers: volunteers.len(),
        work: views.work.len(),
        did_not_work: views.did_not_work.len(),
        all: views.all.len(),
        data_quality: quality,
    };
    write_file(
        &out_dir.join(format!("{name}.summary.json")),
        serde_json::to_string_pretty(&summary)?.as_bytes(),
    )?;

    info!(
        path = %target.display(),
        work = views.work.len(),
        did_not_work = views.did_not_work.len(),
        "report written"
    );
    Ok(target)
}
