use tracing::info;

use crate::aggregate::aggregate;
use crate::config::PipelineConfig;
use crate::enrich::{enrich, latest_metadata};
use crate::error::{PipelineError, Result};
use crate::models::{DataQuality, RawRecord};
use crate::normalize::normalize;
use crate::report::{select_views, ReportViews};
use crate::rolling::{evaluate, first_crossings};

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub views: ReportViews,
    pub quality: DataQuality,
}

/// Raw rows through every stage up to the report views.
pub fn run(raw: &[RawRecord], config: &PipelineConfig) -> Result<PipelineOutput> {
    let normalized = normalize(raw, config.unparseable)?;
    let grid = aggregate(&normalized.records)?;
    info!(
        volunteers = grid.volunteers.len(),
        months = grid.months.len(),
        "built monthly grid"
    );
    let rows = evaluate(&grid, config.window_months, config.threshold_minutes);
    let firsts = first_crossings(&rows);
    let meta = latest_metadata(&normalized.records);
    let enriched = enrich(&rows, &firsts, &meta);
    let views = select_views(enriched).ok_or(PipelineError::EmptyRecords)?;

    Ok(PipelineOutput {
        views,
        quality: normalized.quality,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnparseablePolicy;
    use crate::month::Month;

    fn raw(id: &str, date: &str, text: &str, name: Option<&str>) -> RawRecord {
        RawRecord {
            origin: format!("test.csv:{date}"),
            volunteer_id: id.to_string(),
            date: date.to_string(),
            duration_text: text.to_string(),
            full_name: name.map(str::to_string),
            city: None,
        }
    }

    fn steady_and_idle() -> Vec<RawRecord> {
        let mut rows = Vec::new();
        for month in 1..=5 {
            rows.push(raw(
                "A",
                &format!("2024-{month:02}-10"),
                "6 valandos 40 minučių",
                Some("Aistė"),
            ));
        }
        for month in 1..=6 {
            rows.push(raw("B", &format!("2024-{month:02}-12"), "0 minučių", Some("Birutė")));
        }
        rows
    }

    #[test]
    fn steady_volunteer_goes_quiet_in_latest_month() {
        let output = run(&steady_and_idle(), &PipelineConfig::default()).unwrap();
        let views = &output.views;

        assert_eq!(views.latest_month, Month::from_ym(2024, 6).unwrap());
        assert!(views.work.is_empty());
        assert_eq!(views.did_not_work.len(), 1);
        let a = &views.did_not_work[0];
        assert_eq!(a.volunteer_id, "A");
        assert_eq!(a.first_month_longterm, Month::from_ym(2024, 5));
        assert_eq!(a.full_name.as_deref(), Some("Aistė"));

        assert_eq!(views.all.len(), 12);
        assert!(views
            .all
            .iter()
            .filter(|r| r.volunteer_id == "B")
            .all(|r| !r.exceeds_threshold && r.first_month_longterm.is_none()));
    }

    #[test]
    fn first_crossing_ignores_row_order() {
        let rows = steady_and_idle();
        let mut reversed = rows.clone();
        reversed.reverse();

        let forward = run(&rows, &PipelineConfig::default()).unwrap();
        let backward = run(&reversed, &PipelineConfig::default()).unwrap();
        let firsts = |out: &PipelineOutput| {
            out.views
                .all
                .iter()
                .map(|r| (r.volunteer_id.clone(), r.first_month_longterm))
                .collect::<Vec<_>>()
        };
        assert_eq!(firsts(&forward), firsts(&backward));
    }

    #[test]
    fn duplicated_import_matches_single_copy() {
        let rows = steady_and_idle();
        let mut doubled = rows.clone();
        doubled.extend(rows.iter().cloned());

        let single = run(&rows, &PipelineConfig::default()).unwrap();
        let double = run(&doubled, &PipelineConfig::default()).unwrap();
        assert_eq!(single.views, double.views);
        assert_eq!(double.quality.duplicates_removed, rows.len());
        assert_eq!(double.quality.records_kept, single.quality.records_kept);
    }

    #[test]
    fn unparseable_durations_do_not_reduce_totals() {
        let mut rows = steady_and_idle();
        rows.push(raw("A", "2024-05-20", "nežinoma", None));

        let output = run(&rows, &PipelineConfig::default()).unwrap();
        let may = output
            .views
            .all
            .iter()
            .find(|r| r.volunteer_id == "A" && r.month == Month::from_ym(2024, 5).unwrap())
            .unwrap();
        assert_eq!(may.total_minutes, 400);
        assert_eq!(output.quality.unparseable_count(), 1);

        let strict = PipelineConfig {
            unparseable: UnparseablePolicy::Reject,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            run(&rows, &strict),
            Err(PipelineError::UnparseableDuration { .. })
        ));
    }

    #[test]
    fn unreadable_rows_still_count_as_observations() {
        let mut rows = Vec::new();
        for month in 1..=5 {
            rows.push(raw(
                "A",
                &format!("2024-{month:02}-10"),
                "6 valandos 40 minučių",
                Some("Aistė"),
            ));
        }
        rows.push(raw("C", "2024-03-14", "visą dieną", Some("Ona")));
        rows.push(raw("B", "2024-06-15", "nežinoma", Some("Birutė")));

        let output = run(&rows, &PipelineConfig::default()).unwrap();
        let views = &output.views;

        assert_eq!(views.latest_month, Month::from_ym(2024, 6).unwrap());
        assert_eq!(views.did_not_work.len(), 1);
        assert_eq!(views.did_not_work[0].volunteer_id, "A");
        assert_eq!(views.all.len(), 3 * 6);
        for id in ["B", "C"] {
            let months: Vec<_> = views.all.iter().filter(|r| r.volunteer_id == id).collect();
            assert_eq!(months.len(), 6);
            assert!(months.iter().all(|r| r.total_minutes == 0 && !r.exceeds_threshold));
        }
        let b = views.all.iter().find(|r| r.volunteer_id == "B").unwrap();
        assert_eq!(b.full_name.as_deref(), Some("Birutė"));
        assert_eq!(output.quality.unparseable_count(), 2);
        assert_eq!(output.quality.records_kept, 7);
    }

    #[test]
    fn threshold_and_window_are_configurable() {
        let config = PipelineConfig {
            threshold_minutes: 700,
            window_months: 2,
            ..PipelineConfig::default()
        };
        let output = run(&steady_and_idle(), &config).unwrap();
        let a = output.views.all.iter().find(|r| r.volunteer_id == "A").unwrap();
        assert_eq!(a.first_month_longterm, Month::from_ym(2024, 2));
        assert!(output.views.did_not_work.is_empty());
    }

    #[test]
    fn no_rows_is_an_error() {
        assert!(matches!(
            run(&[], &PipelineConfig::default()),
            Err(PipelineError::EmptyRecords)
        ));
    }
}
