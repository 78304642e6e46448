//! Test run domain model and lifecycle status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::Record;

/// Run lifecycle status.
///
/// Runs are created `running` and end `passed` or `failed`. `pending` and
/// `cancelled` are reserved; no operation moves a run into them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Passed,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal states have no outgoing transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One execution attempt of a suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TestRun {
    pub id: String,
    /// Owning suite ID
    pub test_suite_id: String,
    /// Suite name captured at creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suite_name: Option<String>,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Elapsed seconds, set on completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default)]
    pub passed_count: u32,
    #[serde(default)]
    pub failed_count: u32,
    #[serde(default)]
    pub total_count: u32,
    /// Origin tag, e.g. "Manual" or "Stress Test"
    pub triggered_by: String,
    /// Failure analysis narrative
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TestRun {
    /// Filter field for the owning suite.
    pub const SUITE_ID: &'static str = "test_suite_id";
    /// Filter field for the lifecycle status.
    pub const STATUS: &'static str = "status";
}

impl Record for TestRun {
    type New = NewTestRun;

    const COLLECTION: &'static str = "test_runs";
    const ORDER_FIELD: &'static str = "created_at";

    fn id(&self) -> &str {
        &self.id
    }

    fn order_key(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Insert payload for a run.
#[derive(Debug, Clone, Serialize)]
pub struct NewTestRun {
    pub test_suite_id: String,
    pub suite_name: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub passed_count: u32,
    pub failed_count: u32,
    pub total_count: u32,
    pub triggered_by: String,
}

impl NewTestRun {
    /// A freshly started run: `running`, all counts zero.
    pub fn running(suite_id: &str, suite_name: &str, triggered_by: &str) -> Self {
        NewTestRun {
            test_suite_id: suite_id.to_string(),
            suite_name: suite_name.to_string(),
            status: RunStatus::Running,
            started_at: Utc::now(),
            passed_count: 0,
            failed_count: 0,
            total_count: 0,
            triggered_by: triggered_by.to_string(),
        }
    }
}

/// Fields written when a run reaches a terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct RunCompletion {
    pub status: RunStatus,
    pub completed_at: DateTime<Utc>,
    pub duration: f64,
    pub passed_count: u32,
    pub failed_count: u32,
    pub total_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
}

/// Request body for triggering a run.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRunRequest {
    pub suite_id: String,
    pub suite_name: String,
    /// Defaults to "Manual"
    #[serde(default)]
    pub triggered_by: Option<String>,
}
