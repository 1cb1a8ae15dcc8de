use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{info, warn};

use crate::config::UnparseablePolicy;
use crate::duration::{parse_duration, ParsedDuration};
use crate::error::{PipelineError, Result};
use crate::models::{AttendanceRecord, DataQuality, RawRecord, UnparseableEntry};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub records: Vec<AttendanceRecord>,
    pub quality: DataQuality,
}

/// Cleans raw rows: parses dates and durations, canonicalises identifiers
/// and drops exact duplicates. Input order is preserved.
///
/// Under [`UnparseablePolicy::Skip`] a row with unreadable duration text is
/// kept without minutes, so its volunteer, month and metadata still count.
pub fn normalize(raw: &[RawRecord], policy: UnparseablePolicy) -> Result<Normalized> {
    let mut quality = DataQuality {
        input_rows: raw.len(),
        ..DataQuality::default()
    };
    let mut seen: HashSet<(String, NaiveDateTime, &str, Option<&str>, Option<&str>)> = HashSet::new();
    let mut records = Vec::with_capacity(raw.len());

    for row in raw {
        let volunteer_id = canonical_id(&row.volunteer_id);
        if volunteer_id.is_empty() {
            return Err(PipelineError::EmptyVolunteerId {
                origin: row.origin.clone(),
            });
        }

        let timestamp = parse_timestamp(&row.date).ok_or_else(|| PipelineError::InvalidDate {
            origin: row.origin.clone(),
            volunteer_id: volunteer_id.clone(),
            value: row.date.clone(),
        })?;

        let key = (
            volunteer_id.clone(),
            timestamp,
            row.duration_text.as_str(),
            row.full_name.as_deref(),
            row.city.as_deref(),
        );
        if !seen.insert(key) {
            quality.duplicates_removed += 1;
            continue;
        }

        let minutes = match parse_duration(&row.duration_text) {
            ParsedDuration::Minutes(minutes) => Some(minutes),
            ParsedDuration::Unparseable(text) => match policy {
                UnparseablePolicy::Reject => {
                    return Err(PipelineError::UnparseableDuration {
                        origin: row.origin.clone(),
                        volunteer_id,
                        text,
                    });
                }
                UnparseablePolicy::Skip => {
                    warn!(
                        origin = %row.origin,
                        volunteer_id = %volunteer_id,
                        text = %text,
                        "unparseable duration counted as no time"
                    );
                    quality.unparseable.push(UnparseableEntry {
                        volunteer_id: volunteer_id.clone(),
                        text,
                    });
                    None
                }
            },
        };

        records.push(AttendanceRecord {
            volunteer_id,
            timestamp,
            minutes,
            full_name: row.full_name.clone(),
            city: row.city.clone(),
        });
    }

    quality.records_kept = records.len();
    info!(
        input = quality.input_rows,
        duplicates = quality.duplicates_removed,
        unparseable = quality.unparseable_count(),
        kept = quality.records_kept,
        "normalized attendance records"
    );

    Ok(Normalized { records, quality })
}

/// Identifiers exported as numbers ("123.0") compare equal to text ones ("123").
pub fn canonical_id(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(integral) = trimmed.strip_suffix(".0") {
        if !integral.is_empty() && integral.bytes().all(|b| b.is_ascii_digit()) {
            return integral.to_string();
        }
    }
    trimmed.to_string()
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_local());
    }
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .map(|date| date.and_time(NaiveTime::MIN))
}
