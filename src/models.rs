use chrono::NaiveDateTime;
use serde::Serialize;

use crate::month::Month;

/// One attendance row as read from an export, before any cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Where the row came from, `file:line`.
    pub origin: String,
    pub volunteer_id: String,
    pub date: String,
    pub duration_text: String,
    pub full_name: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttendanceRecord {
    pub volunteer_id: String,
    pub timestamp: NaiveDateTime,
    /// `None` when the duration text could not be read.
    pub minutes: Option<u32>,
    pub full_name: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyCell {
    pub volunteer_id: String,
    pub month: Month,
    pub total_minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollingRow {
    pub volunteer_id: String,
    pub month: Month,
    pub total_minutes: u64,
    pub rolling_sum: u64,
    pub exceeds_threshold: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedRow {
    pub month: Month,
    #[serde(rename = "unique_code")]
    pub volunteer_id: String,
    pub total_minutes: u64,
    pub rolling_sum: u64,
    pub exceeds_threshold: bool,
    pub first_month_longterm: Option<Month>,
    #[serde(rename = "Pilnas vardas")]
    pub full_name: Option<String>,
    #[serde(rename = "miestas")]
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnparseableEntry {
    pub volunteer_id: String,
    pub text: String,
}

/// Counts surfaced alongside the report instead of being folded into totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataQuality {
    pub input_rows: usize,
    pub duplicates_removed: usize,
    pub unparseable: Vec<UnparseableEntry>,
    pub records_kept: usize,
}

impl DataQuality {
    pub fn unparseable_count(&self) -> usize {
        self.unparseable.len()
    }
}
