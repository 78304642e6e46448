//! Read-only aggregations over run snapshots.
//!
//! Everything here is pure and recomputed on every call.

use std::collections::HashSet;

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::models::{DailyRate, DashboardSummary, RunStatus, TestRun, TestSuite};

/// Runs considered by the dashboard success rate.
pub const SUCCESS_RATE_WINDOW: usize = 100;
/// Runs shown in the dashboard activity list.
pub const RECENT_RUNS: usize = 5;
/// Days covered by the run volume counter.
pub const VOLUME_DAYS: u64 = 30;
/// Days covered by the daily series.
pub const SERIES_DAYS: u64 = 7;

/// Passed over finished runs as a rounded percentage; 0 when nothing finished.
pub fn success_rate<'a>(runs: impl IntoIterator<Item = &'a TestRun>) -> u32 {
    let (passed, finished) = runs.into_iter().fold((0u32, 0u32), |(p, f), run| match run.status {
        RunStatus::Passed => (p + 1, f + 1),
        RunStatus::Failed => (p, f + 1),
        _ => (p, f),
    });

    if finished == 0 {
        return 0;
    }
    (f64::from(passed) * 100.0 / f64::from(finished)).round() as u32
}

fn finished_count<'a>(runs: impl IntoIterator<Item = &'a TestRun>) -> usize {
    runs.into_iter().filter(|run| run.status.is_terminal()).count()
}

/// The `n` newest runs by creation time.
pub fn recent_runs(runs: &[TestRun], n: usize) -> Vec<TestRun> {
    let mut sorted = runs.to_vec();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.truncate(n);
    sorted
}

/// Success rate restricted to runs of the project's suites.
///
/// Returns the score and the number of finished runs it was computed over.
pub fn health_score(project_id: &str, suites: &[TestSuite], runs: &[TestRun]) -> (u32, usize) {
    let suite_ids: HashSet<&str> = suites
        .iter()
        .filter(|suite| suite.project_id == project_id)
        .map(|suite| suite.id.as_str())
        .collect();

    let scoped: Vec<&TestRun> = runs
        .iter()
        .filter(|run| suite_ids.contains(run.test_suite_id.as_str()))
        .collect();

    (
        success_rate(scoped.iter().copied()),
        finished_count(scoped.iter().copied()),
    )
}

/// Runs created at or after `cutoff`.
pub fn runs_since(runs: &[TestRun], cutoff: DateTime<Utc>) -> usize {
    runs.iter().filter(|run| run.created_at >= cutoff).count()
}

/// One point per UTC day for the last `days` days ending `today`, oldest first.
pub fn daily_success_rates(runs: &[TestRun], days: u64, today: NaiveDate) -> Vec<DailyRate> {
    (0..days)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .map(|date| {
            let that_day: Vec<&TestRun> = runs
                .iter()
                .filter(|run| run.created_at.date_naive() == date)
                .collect();
            DailyRate {
                date,
                rate: success_rate(that_day.iter().copied()),
                finished: finished_count(that_day.iter().copied()),
            }
        })
        .collect()
}

/// Build the dashboard summary at `now`.
pub fn dashboard_summary(
    total_projects: usize,
    suites: &[TestSuite],
    runs: &[TestRun],
    now: DateTime<Utc>,
) -> DashboardSummary {
    let newest = recent_runs(runs, SUCCESS_RATE_WINDOW);
    let cutoff = now - chrono::Duration::days(VOLUME_DAYS as i64);

    DashboardSummary {
        total_projects,
        total_suites: suites.len(),
        runs_last_30_days: runs_since(runs, cutoff),
        success_rate: success_rate(&newest),
        running: runs
            .iter()
            .filter(|run| run.status == RunStatus::Running)
            .count(),
        daily: daily_success_rates(runs, SERIES_DAYS, now.date_naive()),
        recent_runs: newest.into_iter().take(RECENT_RUNS).collect(),
    }
}
