use std::collections::{BTreeMap, BTreeSet};

use crate::error::{PipelineError, Result};
use crate::models::{AttendanceRecord, MonthlyCell};
use crate::month::Month;

/// Monthly minute totals for every volunteer over every month in the
/// observed range, zero where nothing was logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyGrid {
    pub months: Vec<Month>,
    pub volunteers: Vec<String>,
    /// Ordered by volunteer, then month.
    pub cells: Vec<MonthlyCell>,
}

pub fn monthly_totals(records: &[AttendanceRecord]) -> BTreeMap<(String, Month), u64> {
    let mut totals: BTreeMap<(String, Month), u64> = BTreeMap::new();
    for record in records {
        let month = Month::containing(record.timestamp.date());
        *totals.entry((record.volunteer_id.clone(), month)).or_insert(0) +=
            u64::from(record.minutes.unwrap_or(0));
    }
    totals
}

pub fn aggregate(records: &[AttendanceRecord]) -> Result<MonthlyGrid> {
    let sparse = monthly_totals(records);

    let first = sparse.keys().map(|(_, month)| *month).min();
    let last = sparse.keys().map(|(_, month)| *month).max();
    let (Some(first), Some(last)) = (first, last) else {
        return Err(PipelineError::EmptyRecords);
    };

    let months = Month::range_inclusive(first, last);
    let volunteers: Vec<String> = sparse
        .keys()
        .map(|(id, _)| id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut cells = Vec::with_capacity(volunteers.len() * months.len());
    for volunteer_id in &volunteers {
        for month in &months {
            let total_minutes = sparse
                .get(&(volunteer_id.clone(), *month))
                .copied()
                .unwrap_or(0);
            cells.push(MonthlyCell {
                volunteer_id: volunteer_id.clone(),
                month: *month,
                total_minutes,
            });
        }
    }

    Ok(MonthlyGrid {
        months,
        volunteers,
        cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(id: &str, y: i32, m: u32, d: u32, minutes: u32) -> AttendanceRecord {
        AttendanceRecord {
            volunteer_id: id.to_string(),
            timestamp: NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            minutes: Some(minutes),
            full_name: None,
            city: None,
        }
    }

    #[test]
    fn sums_within_a_month() {
        let records = vec![
            record("1", 2024, 1, 3, 30),
            record("1", 2024, 1, 28, 45),
            record("1", 2024, 1, 28, 45),
        ];
        let grid = aggregate(&records).unwrap();
        assert_eq!(grid.cells.len(), 1);
        assert_eq!(grid.cells[0].total_minutes, 120);
        assert_eq!(grid.cells[0].month, Month::from_ym(2024, 1).unwrap());
    }

    #[test]
    fn grid_is_dense_over_global_range() {
        let records = vec![
            record("a", 2024, 1, 5, 60),
            record("b", 2024, 4, 5, 90),
            record("c", 2024, 2, 5, 10),
        ];
        let grid = aggregate(&records).unwrap();

        assert_eq!(grid.months.len(), 4);
        assert_eq!(grid.volunteers, vec!["a", "b", "c"]);
        assert_eq!(grid.cells.len(), grid.volunteers.len() * grid.months.len());

        let zeros = grid.cells.iter().filter(|c| c.total_minutes == 0).count();
        assert_eq!(zeros, 12 - 3);
    }

    #[test]
    fn volunteer_gap_months_are_zero() {
        let records = vec![record("a", 2023, 11, 1, 60), record("a", 2024, 2, 1, 60)];
        let grid = aggregate(&records).unwrap();
        let totals: Vec<u64> = grid.cells.iter().map(|c| c.total_minutes).collect();
        assert_eq!(totals, vec![60, 0, 0, 60]);
        assert_eq!(grid.months.first().copied(), Month::from_ym(2023, 11));
        assert_eq!(grid.months.last().copied(), Month::from_ym(2024, 2));
    }

    #[test]
    fn input_order_does_not_matter() {
        let records = vec![
            record("b", 2024, 3, 1, 5),
            record("a", 2024, 1, 1, 10),
            record("b", 2024, 1, 1, 20),
        ];
        let mut reversed = records.clone();
        reversed.reverse();
        assert_eq!(aggregate(&records).unwrap(), aggregate(&reversed).unwrap());
    }

    #[test]
    fn rows_without_minutes_still_make_cells() {
        let mut unreadable = record("b", 2024, 3, 2, 0);
        unreadable.minutes = None;
        let grid = aggregate(&[record("a", 2024, 1, 5, 30), unreadable]).unwrap();

        assert_eq!(grid.months.len(), 3);
        assert_eq!(grid.volunteers, vec!["a", "b"]);
        assert_eq!(grid.cells.len(), 6);
        assert!(grid
            .cells
            .iter()
            .filter(|c| c.volunteer_id == "b")
            .all(|c| c.total_minutes == 0));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(aggregate(&[]), Err(PipelineError::EmptyRecords)));
    }
}
