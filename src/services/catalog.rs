//! Project, suite and result bookkeeping on top of the datastore.
//!
//! Turns absent records into `NotFound` for the HTTP layer and enforces
//! the parent checks that the store itself does not.

use chrono::Utc;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{
    CreateProjectRequest, CreateTestSuiteRequest, DashboardSummary, NewProject, NewTestResult,
    NewTestSuite, Project, ProjectHealth, ProjectPatch, RecordResultRequest, SuitePatch,
    TestResult, TestRun, TestSuite,
};
use crate::store::{Datastore, Filter};

use super::stats;

#[derive(Clone)]
pub struct Catalog {
    store: Datastore,
    owner_id: String,
}

impl Catalog {
    /// `owner_id` is stamped on every project created through this catalog.
    pub fn new(store: Datastore, owner_id: impl Into<String>) -> Self {
        Self {
            store,
            owner_id: owner_id.into(),
        }
    }

    pub fn store(&self) -> &Datastore {
        &self.store
    }

    // Projects

    pub async fn list_projects(&self) -> AppResult<Vec<Project>> {
        self.store.projects().list(None).await
    }

    pub async fn get_project(&self, id: &str) -> AppResult<Project> {
        self.store
            .projects()
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {}", id)))
    }

    pub async fn create_project(&self, request: CreateProjectRequest) -> AppResult<Project> {
        let new = NewProject::from_request(&self.owner_id, request)?;
        let project = self.store.projects().insert(&new).await?;
        info!(project_id = %project.id, name = %project.name, "Project created");
        Ok(project)
    }

    /// An empty patch returns the project unchanged.
    pub async fn update_project(&self, id: &str, patch: ProjectPatch) -> AppResult<Project> {
        let patch = patch.validated()?;
        if patch.is_empty() {
            return self.get_project(id).await;
        }

        self.store
            .projects()
            .update(id, &patch)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {}", id)))
    }

    /// Suites of the project are left in place.
    pub async fn delete_project(&self, id: &str) -> AppResult<()> {
        self.store.projects().delete(id).await?;
        info!(project_id = %id, "Project deleted");
        Ok(())
    }

    pub async fn project_health(&self, id: &str) -> AppResult<ProjectHealth> {
        let project = self.get_project(id).await?;
        let suites = self
            .store
            .suites()
            .list(Some(Filter::eq(TestSuite::PROJECT_ID, project.id.as_str())))
            .await?;
        let runs = self.store.runs().list(None).await?;

        let (health_score, finished_runs) = stats::health_score(&project.id, &suites, &runs);

        Ok(ProjectHealth {
            project_id: project.id,
            health_score,
            suite_count: suites.len(),
            finished_runs,
        })
    }

    // Suites

    pub async fn list_suites(&self, project_id: Option<&str>) -> AppResult<Vec<TestSuite>> {
        let filter = project_id.map(|id| Filter::eq(TestSuite::PROJECT_ID, id));
        self.store.suites().list(filter).await
    }

    pub async fn get_suite(&self, id: &str) -> AppResult<TestSuite> {
        self.store
            .suites()
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test suite {}", id)))
    }

    /// The owning project must exist at creation time.
    pub async fn create_suite(&self, request: CreateTestSuiteRequest) -> AppResult<TestSuite> {
        let new = NewTestSuite::from_request(request)?;
        if self.store.projects().get(&new.project_id).await?.is_none() {
            return Err(AppError::InvalidInput(format!(
                "project {} does not exist",
                new.project_id
            )));
        }

        let suite = self.store.suites().insert(&new).await?;
        info!(suite_id = %suite.id, project_id = %suite.project_id, "Test suite created");
        Ok(suite)
    }

    pub async fn update_suite(&self, id: &str, patch: SuitePatch) -> AppResult<TestSuite> {
        let patch = patch.validated()?;
        if patch.is_empty() {
            return self.get_suite(id).await;
        }

        self.store
            .suites()
            .update(id, &patch)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test suite {}", id)))
    }

    /// Runs of the suite are left in place.
    pub async fn delete_suite(&self, id: &str) -> AppResult<()> {
        self.store.suites().delete(id).await?;
        info!(suite_id = %id, "Test suite deleted");
        Ok(())
    }

    // Runs and results

    pub async fn list_runs(
        &self,
        suite_id: Option<&str>,
        limit: Option<usize>,
    ) -> AppResult<Vec<TestRun>> {
        let filter = suite_id.map(|id| Filter::eq(TestRun::SUITE_ID, id));
        let mut runs = self.store.runs().list(filter).await?;
        if let Some(limit) = limit {
            runs.truncate(limit);
        }
        Ok(runs)
    }

    pub async fn get_run(&self, id: &str) -> AppResult<TestRun> {
        self.store
            .runs()
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test run {}", id)))
    }

    pub async fn list_results(&self, run_id: &str) -> AppResult<Vec<TestResult>> {
        let run = self.get_run(run_id).await?;
        self.store
            .results()
            .list(Some(Filter::eq(TestResult::RUN_ID, run.id)))
            .await
    }

    /// Record one test case outcome for an existing run.
    pub async fn record_result(
        &self,
        run_id: &str,
        request: RecordResultRequest,
    ) -> AppResult<TestResult> {
        let run = self.get_run(run_id).await?;
        let new = NewTestResult::from_request(&run.id, request)?;
        self.store.results().insert(&new).await
    }

    pub async fn dashboard(&self) -> AppResult<DashboardSummary> {
        let projects = self.store.projects().list(None).await?;
        let suites = self.store.suites().list(None).await?;
        let runs = self.store.runs().list(None).await?;

        Ok(stats::dashboard_summary(
            projects.len(),
            &suites,
            &runs,
            Utc::now(),
        ))
    }
}
