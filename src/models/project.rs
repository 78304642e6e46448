//! Project model: a system under test with a base URL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppResult;
use crate::store::Record;

use super::{clearable, clearable_text, optional_text, required_text};

/// A project owning zero or more test suites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Project {
    pub id: String,
    /// Owner reference
    pub user_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Source repository reference (e.g. `github.com/org/app`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
    /// Base URL the suites run against
    pub base_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Project {
    type New = NewProject;

    const COLLECTION: &'static str = "projects";
    const ORDER_FIELD: &'static str = "updated_at";
    const HAS_UPDATED_AT: bool = true;

    fn id(&self) -> &str {
        &self.id
    }

    fn order_key(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Insert payload for a project; the store assigns id and timestamps.
#[derive(Debug, Clone, Serialize)]
pub struct NewProject {
    pub user_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
    pub base_url: String,
}

impl NewProject {
    /// Build a validated project payload owned by `user_id`.
    pub fn from_request(user_id: &str, request: CreateProjectRequest) -> AppResult<Self> {
        Ok(NewProject {
            user_id: required_text("user_id", user_id)?,
            name: required_text("name", &request.name)?,
            description: optional_text(request.description),
            repository_url: optional_text(request.repository_url),
            base_url: required_text("base_url", &request.base_url)?,
        })
    }
}

/// Request body for creating a project.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub repository_url: Option<String>,
    pub base_url: String,
}

/// Partial project update. Absent fields are left untouched; `null` or a
/// blank value clears `description` and `repository_url`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "clearable",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "clearable",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub repository_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ProjectPatch {
    /// Trim fields and reject blanking out name or base URL.
    pub fn validated(self) -> AppResult<Self> {
        Ok(ProjectPatch {
            name: self.name.map(|n| required_text("name", &n)).transpose()?,
            description: clearable_text(self.description),
            repository_url: clearable_text(self.repository_url),
            base_url: self
                .base_url
                .map(|u| required_text("base_url", &u))
                .transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.repository_url.is_none()
            && self.base_url.is_none()
    }
}

/// Health score of one project, computed over its suites' runs.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectHealth {
    pub project_id: String,
    /// Rounded success percentage (0-100)
    pub health_score: u32,
    pub suite_count: usize,
    pub finished_runs: usize,
}

