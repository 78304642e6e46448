//! Test suite model: a named, configured scenario belonging to a project.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::store::Record;

use super::{clearable, clearable_text, optional_text, required_text};

/// Test suite with an opaque configuration document.
///
/// The configuration is only interpreted by whatever executes the suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TestSuite {
    pub id: String,
    /// Owning project ID
    pub project_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Schema-free configuration tree
    #[serde(default = "empty_config")]
    #[schema(value_type = Object)]
    pub config: JsonValue,
    pub created_at: DateTime<Utc>,
}

impl TestSuite {
    /// Filter field for the owning project.
    pub const PROJECT_ID: &'static str = "project_id";
}

impl Record for TestSuite {
    type New = NewTestSuite;

    const COLLECTION: &'static str = "test_suites";
    const ORDER_FIELD: &'static str = "created_at";

    fn id(&self) -> &str {
        &self.id
    }

    fn order_key(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn empty_config() -> JsonValue {
    JsonValue::Object(Map::new())
}

/// Insert payload for a suite.
#[derive(Debug, Clone, Serialize)]
pub struct NewTestSuite {
    pub project_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub config: JsonValue,
}

impl NewTestSuite {
    /// Validate a create request. The configuration must already be a JSON
    /// object or a string holding one; anything else is rejected.
    pub fn from_request(request: CreateTestSuiteRequest) -> AppResult<Self> {
        Ok(NewTestSuite {
            project_id: required_text("project_id", &request.project_id)?,
            name: required_text("name", &request.name)?,
            description: optional_text(request.description),
            config: parse_config(request.config)?,
        })
    }
}

/// Request body for creating a suite.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTestSuiteRequest {
    pub project_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// JSON object, or a string containing a JSON object
    #[serde(default)]
    #[schema(value_type = Object)]
    pub config: JsonValue,
}

/// Partial suite update. `null` or a blank description clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SuitePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "clearable",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub config: Option<JsonValue>,
}

impl SuitePatch {
    pub fn validated(self) -> AppResult<Self> {
        Ok(SuitePatch {
            name: self.name.map(|n| required_text("name", &n)).transpose()?,
            description: clearable_text(self.description),
            config: self.config.map(parse_config).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.config.is_none()
    }
}

/// Normalise a configuration document.
///
/// `null` becomes an empty object; a string is parsed as JSON text.
pub fn parse_config(raw: JsonValue) -> AppResult<JsonValue> {
    let parsed = match raw {
        JsonValue::Null => return Ok(empty_config()),
        JsonValue::String(text) => serde_json::from_str::<JsonValue>(&text).map_err(|e| {
            AppError::InvalidInput(format!("config must be valid JSON: {}", e))
        })?,
        other => other,
    };

    if !parsed.is_object() {
        return Err(AppError::InvalidInput(
            "config must be a JSON object".to_string(),
        ));
    }

    Ok(parsed)
}
