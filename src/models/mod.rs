//! Domain models for SuiteDeck.

use serde::{Deserialize, Deserializer};

use crate::error::{AppError, AppResult};

pub mod project;
pub mod stats;
pub mod test_result;
pub mod test_run;
pub mod test_suite;
pub mod ws_event;

// Re-export commonly used types
pub use project::{CreateProjectRequest, NewProject, Project, ProjectHealth, ProjectPatch};
pub use stats::{DailyRate, DashboardSummary};
pub use test_result::{Browser, NewTestResult, RecordResultRequest, TestResult, TestStatus};
pub use test_run::{CreateRunRequest, NewTestRun, RunCompletion, RunStatus, TestRun};
pub use test_suite::{CreateTestSuiteRequest, NewTestSuite, SuitePatch, TestSuite};
pub use ws_event::{RunUpdatedPayload, WsEvent, WsEventMessage};

/// Trim a required text field, rejecting blank values.
pub(crate) fn required_text(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field; blank becomes absent.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Deserialize a clearable patch field: absent stays `None`, `null` becomes
/// `Some(None)`.
pub(crate) fn clearable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Trim a clearable patch field; a blank value clears it.
pub(crate) fn clearable_text(value: Option<Option<String>>) -> Option<Option<String>> {
    value.map(optional_text)
}
