//! Run lifecycle engine.
//!
//! A run is written `running`, handed to the [`OutcomeProducer`] in a
//! background task, and written again in its terminal state. Only a
//! successful terminal write (or finding the run deleted) publishes on the
//! [`ChangeBus`].

use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;
use futures_util::future::join_all;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::{Config, RetryPolicy};
use crate::error::{AppError, AppResult};
use crate::models::{required_text, NewTestRun, RunCompletion, RunStatus, TestRun};
use crate::store::Datastore;

use super::change_bus::ChangeBus;
use super::outcome::{ExecutionReport, Invocation, OutcomeProducer};

/// Origin tag used when the caller gives none.
pub const DEFAULT_TRIGGER: &str = "Manual";

/// Origin tag of runs started by [`RunEngine::run_all_suites`].
pub const STRESS_TRIGGER: &str = "Stress Test";

/// Narrative attached to failed runs when failure analysis is configured.
pub const FAILURE_DIAGNOSIS: &str = "AI analysis: a latency failure was detected under load. \
     Suggestion: reduce the response time of the /api/v1/projects endpoint.";

/// Engine settings taken from the loaded configuration.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub analysis_configured: bool,
    pub completion_retry: RetryPolicy,
}

impl EngineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            analysis_configured: config.analysis.is_configured(),
            completion_retry: config.completion_retry,
        }
    }
}

struct EngineInner {
    store: Datastore,
    bus: ChangeBus,
    producer: Arc<dyn OutcomeProducer>,
    options: EngineOptions,
    runtime: Option<Handle>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

/// Drives runs from creation to a terminal state.
#[derive(Clone)]
pub struct RunEngine {
    inner: Arc<EngineInner>,
}

impl RunEngine {
    /// Completions are spawned on the runtime current at construction, so
    /// they outlive the HTTP worker that started them.
    pub fn new(
        store: Datastore,
        bus: ChangeBus,
        producer: Arc<dyn OutcomeProducer>,
        options: EngineOptions,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                store,
                bus,
                producer,
                options,
                runtime: Handle::try_current().ok(),
                in_flight: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.inner.bus
    }

    /// Start one run and return its `running` record immediately.
    ///
    /// The suite is not looked up; only presence of the id and name is
    /// checked.
    pub async fn create_run(
        &self,
        suite_id: &str,
        suite_name: &str,
        triggered_by: Option<&str>,
    ) -> AppResult<TestRun> {
        let trigger = triggered_by
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TRIGGER);

        self.start(suite_id, suite_name, trigger, Invocation::Single)
            .await
    }

    /// Start a stress run for every known suite at once.
    ///
    /// There is no concurrency cap. Suites whose run could not be created
    /// are logged and skipped.
    pub async fn run_all_suites(&self) -> AppResult<Vec<TestRun>> {
        let suites = self.inner.store.suites().list(None).await?;
        info!(suites = suites.len(), "Starting stress invocation");

        let starts = suites.iter().map(|suite| {
            self.start(&suite.id, &suite.name, STRESS_TRIGGER, Invocation::Stress)
        });

        let mut runs = Vec::with_capacity(suites.len());
        for (suite, outcome) in suites.iter().zip(join_all(starts).await) {
            match outcome {
                Ok(run) => runs.push(run),
                Err(e) => error!(suite_id = %suite.id, error = %e, "Failed to start stress run"),
            }
        }

        Ok(runs)
    }

    async fn start(
        &self,
        suite_id: &str,
        suite_name: &str,
        trigger: &str,
        invocation: Invocation,
    ) -> AppResult<TestRun> {
        let suite_id = required_text("suite_id", suite_id)?;
        let suite_name = required_text("suite_name", suite_name)?;

        let run = self
            .inner
            .store
            .runs()
            .insert(&NewTestRun::running(&suite_id, &suite_name, trigger))
            .await?;

        info!(run_id = %run.id, suite_id = %suite_id, trigger, "Run started");
        self.launch(run.clone(), invocation);
        Ok(run)
    }

    /// Schedule the completion step. It fires exactly once and cannot be
    /// cancelled.
    fn launch(&self, run: TestRun, invocation: Invocation) {
        let engine = self.clone();
        let started = Instant::now();
        let completion = async move {
            engine.complete(run, invocation, started).await;
        };
        let handle = match &self.inner.runtime {
            Some(runtime) => runtime.spawn(completion),
            None => tokio::spawn(completion),
        };

        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(|p| p.into_inner());
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }

    async fn complete(&self, run: TestRun, invocation: Invocation, started: Instant) {
        let report = self.inner.producer.execute(&run, invocation).await;
        let completion = self.completion_for(report, started);
        let status = completion.status;

        match self.write_completion(&run.id, &completion).await {
            Ok(Some(_)) => {
                info!(run_id = %run.id, %status, duration = completion.duration, "Run completed");
                self.inner.bus.publish(&run.id);
            }
            Ok(None) => {
                warn!(run_id = %run.id, "Run deleted before completion");
                self.inner.bus.publish(&run.id);
            }
            Err(e) => {
                error!(
                    run_id = %run.id,
                    attempts = self.inner.options.completion_retry.attempts,
                    error = %e,
                    "Completion write failed, run left running"
                );
            }
        }
    }

    fn completion_for(&self, report: ExecutionReport, started: Instant) -> RunCompletion {
        let diagnosis = (report.status == RunStatus::Failed && self.inner.options.analysis_configured)
            .then(|| FAILURE_DIAGNOSIS.to_string());

        RunCompletion {
            status: report.status,
            completed_at: Utc::now(),
            duration: started.elapsed().as_secs_f64(),
            passed_count: report.passed_count,
            failed_count: report.failed_count,
            total_count: report.total_count,
            diagnosis,
        }
    }

    async fn write_completion(
        &self,
        run_id: &str,
        completion: &RunCompletion,
    ) -> AppResult<Option<TestRun>> {
        let policy = self.inner.options.completion_retry;
        let runs = self.inner.store.runs();
        let mut last_error = AppError::Remote("completion write never attempted".to_string());

        for attempt in 1..=policy.attempts.max(1) {
            match runs.update(run_id, completion).await {
                Ok(updated) => return Ok(updated),
                Err(e) => {
                    warn!(run_id, attempt, error = %e, "Completion write failed");
                    last_error = e;
                    if attempt < policy.attempts {
                        tokio::time::sleep(policy.backoff_after(attempt)).await;
                    }
                }
            }
        }

        Err(last_error)
    }

    /// Number of completions not yet settled.
    pub fn in_flight(&self) -> usize {
        let in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(|p| p.into_inner());
        in_flight.iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait until every scheduled completion has settled, including ones
    /// scheduled while waiting.
    pub async fn wait_idle(&self) {
        loop {
            let handles: Vec<JoinHandle<()>> = {
                let mut in_flight = self
                    .inner
                    .in_flight
                    .lock()
                    .unwrap_or_else(|p| p.into_inner());
                std::mem::take(&mut *in_flight)
            };

            if handles.is_empty() {
                return;
            }

            for handle in handles {
                match handle.await {
                    Ok(()) => {}
                    Err(e) if e.is_cancelled() => {
                        warn!("Run completion cancelled by runtime shutdown")
                    }
                    Err(e) => error!(error = %e, "Run completion task panicked"),
                }
            }
        }
    }
}
