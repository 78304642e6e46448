//! Dashboard statistics DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::TestRun;

/// Success rate for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailyRate {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    /// Rounded success percentage (0-100)
    pub rate: u32,
    /// Finished runs that day
    pub finished: usize,
}

/// Dashboard summary.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardSummary {
    pub total_projects: usize,
    pub total_suites: usize,
    /// Runs created in the last 30 days
    pub runs_last_30_days: usize,
    /// Success rate over the 100 most recent runs
    pub success_rate: u32,
    /// Runs currently executing
    pub running: usize,
    /// Last 7 days, oldest first
    pub daily: Vec<DailyRate>,
    /// Five most recent runs
    pub recent_runs: Vec<TestRun>,
}
