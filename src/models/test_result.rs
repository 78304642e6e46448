//! Test result model: one test case outcome inside a run.
//!
//! Results are only produced by a real executor; the store just holds them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::store::Record;

use super::{optional_text, required_text};

/// Test execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Browser engine a test ran in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    Chromium,
    Firefox,
    Webkit,
}

/// Individual test execution result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TestResult {
    pub id: String,
    /// Owning run ID
    pub test_run_id: String,
    pub test_name: String,
    pub status: TestStatus,
    /// Execution duration in seconds
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub browser: Browser,
    pub created_at: DateTime<Utc>,
}

impl TestResult {
    /// Filter field for the owning run.
    pub const RUN_ID: &'static str = "test_run_id";
}

impl Record for TestResult {
    type New = NewTestResult;

    const COLLECTION: &'static str = "test_results";
    const ORDER_FIELD: &'static str = "created_at";

    fn id(&self) -> &str {
        &self.id
    }

    fn order_key(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Insert payload for a result.
#[derive(Debug, Clone, Serialize)]
pub struct NewTestResult {
    pub test_run_id: String,
    pub test_name: String,
    pub status: TestStatus,
    pub duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub browser: Browser,
}

impl NewTestResult {
    pub fn from_request(run_id: &str, request: RecordResultRequest) -> AppResult<Self> {
        if !request.duration.is_finite() || request.duration < 0.0 {
            return Err(AppError::InvalidInput(
                "duration must be a non-negative number of seconds".to_string(),
            ));
        }

        Ok(NewTestResult {
            test_run_id: required_text("test_run_id", run_id)?,
            test_name: required_text("test_name", &request.test_name)?,
            status: request.status,
            duration: request.duration,
            error_message: optional_text(request.error_message),
            stack_trace: optional_text(request.stack_trace),
            screenshot_url: optional_text(request.screenshot_url),
            video_url: optional_text(request.video_url),
            browser: request.browser,
        })
    }
}

/// Request body for recording a result against a run.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecordResultRequest {
    pub test_name: String,
    pub status: TestStatus,
    pub duration: f64,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub stack_trace: Option<String>,
    #[serde(default)]
    pub screenshot_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    pub browser: Browser,
}
