use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

/// A calendar month keyed by its last day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month(NaiveDate);

impl Month {
    pub fn containing(date: NaiveDate) -> Self {
        let (year, month) = (date.year(), date.month());
        let first_of_next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        };
        // Only fails at the very end of chrono's representable range.
        let last = first_of_next
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX);
        Month(last)
    }

    #[cfg(test)]
    pub fn from_ym(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self::containing)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.0
    }

    pub fn next(&self) -> Self {
        match self.0.succ_opt() {
            Some(first) => Self::containing(first),
            None => *self,
        }
    }

    /// Every month from `start` through `end`, inclusive.
    pub fn range_inclusive(start: Month, end: Month) -> Vec<Month> {
        let mut months = Vec::new();
        let mut current = start;
        while current <= end {
            months.push(current);
            let next = current.next();
            if next == current {
                break;
            }
            current = next;
        }
        months
    }

    /// `YYYY-MM`, used in report names.
    pub fn label(&self) -> String {
        self.last_day().format("%Y-%m").to_string()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.last_day().format("%Y-%m-%d"))
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
