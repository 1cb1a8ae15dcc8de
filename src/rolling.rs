use std::collections::BTreeMap;

use crate::aggregate::MonthlyGrid;
use crate::models::{MonthlyCell, RollingRow};
use crate::month::Month;

/// Trailing rolling sum per volunteer. The window shrinks at the start of the
/// range instead of being undefined; `exceeds_threshold` is strict.
pub fn evaluate(grid: &MonthlyGrid, window: usize, threshold: u64) -> Vec<RollingRow> {
    let window = window.max(1);
    let mut by_volunteer: BTreeMap<&str, Vec<&MonthlyCell>> = BTreeMap::new();
    for cell in &grid.cells {
        by_volunteer
            .entry(cell.volunteer_id.as_str())
            .or_default()
            .push(cell);
    }

    let mut rows = Vec::with_capacity(grid.cells.len());
    for (volunteer_id, mut cells) in by_volunteer {
        cells.sort_by_key(|cell| cell.month);

        let mut rolling_sum: u64 = 0;
        for (i, cell) in cells.iter().enumerate() {
            rolling_sum += cell.total_minutes;
            if i >= window {
                rolling_sum -= cells[i - window].total_minutes;
            }
            rows.push(RollingRow {
                volunteer_id: volunteer_id.to_string(),
                month: cell.month,
                total_minutes: cell.total_minutes,
                rolling_sum,
                exceeds_threshold: rolling_sum > threshold,
            });
        }
    }
    rows
}

/// Earliest exceeding month per volunteer. Volunteers that never cross are absent.
pub fn first_crossings(rows: &[RollingRow]) -> BTreeMap<String, Month> {
    let mut firsts: BTreeMap<String, Month> = BTreeMap::new();
    for row in rows.iter().filter(|row| row.exceeds_threshold) {
        firsts
            .entry(row.volunteer_id.clone())
            .and_modify(|month| *month = (*month).min(row.month))
            .or_insert(row.month);
    }
    firsts
}
