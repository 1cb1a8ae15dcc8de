use std::collections::{BTreeMap, HashMap};

use crate::models::{AttendanceRecord, EnrichedRow, RollingRow};
use crate::month::Month;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolunteerMeta {
    pub full_name: Option<String>,
    pub city: Option<String>,
}

/// Last non-blank name and city seen for each volunteer, in record order.
pub fn latest_metadata(records: &[AttendanceRecord]) -> HashMap<String, VolunteerMeta> {
    let mut meta: HashMap<String, VolunteerMeta> = HashMap::new();
    for record in records {
        let entry = meta.entry(record.volunteer_id.clone()).or_default();
        if let Some(name) = non_blank(&record.full_name) {
            entry.full_name = Some(name.to_string());
        }
        if let Some(city) = non_blank(&record.city) {
            entry.city = Some(city.to_string());
        }
    }
    meta
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn enrich(
    rows: &[RollingRow],
    firsts: &BTreeMap<String, Month>,
    meta: &HashMap<String, VolunteerMeta>,
) -> Vec<EnrichedRow> {
    rows.iter()
        .map(|row| {
            let known = meta.get(&row.volunteer_id);
            EnrichedRow {
                month: row.month,
                volunteer_id: row.volunteer_id.clone(),
                total_minutes: row.total_minutes,
                rolling_sum: row.rolling_sum,
                exceeds_threshold: row.exceeds_threshold,
                first_month_longterm: firsts.get(&row.volunteer_id).copied(),
                full_name: known.and_then(|m| m.full_name.clone()),
                city: known.and_then(|m| m.city.clone()),
            }
        })
        .collect()
}
