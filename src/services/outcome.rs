//! Outcome producers decide how a started run ends.
//!
//! The engine only knows the [`OutcomeProducer`] trait. [`SimulatedOutcome`]
//! stands in for a real executor: it waits a random delay, then flips a
//! weighted coin.

use std::time::Duration;

use async_trait::async_trait;

use crate::models::{RunStatus, TestRun};

/// How a run was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// One suite, triggered on its own.
    Single,
    /// Part of a bulk run over every suite.
    Stress,
}

/// Pass weighting and delay window of a simulated run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeProfile {
    /// Probability of a pass, in `[0, 1]`
    pub pass_weight: f64,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl OutcomeProfile {
    pub const SINGLE: OutcomeProfile = OutcomeProfile {
        pass_weight: 0.6,
        min_delay: Duration::from_secs(2),
        max_delay: Duration::from_secs(4),
    };

    /// Bulk runs fail more often, simulating degraded reliability under load.
    pub const STRESS: OutcomeProfile = OutcomeProfile {
        pass_weight: 0.4,
        min_delay: Duration::from_secs(2),
        max_delay: Duration::from_secs(6),
    };

    /// Map a uniform sample in `[0, 1)` into the delay window.
    pub fn delay_at(&self, sample: f64) -> Duration {
        let span = self.max_delay.saturating_sub(self.min_delay);
        self.min_delay + span.mul_f64(sample.clamp(0.0, 1.0))
    }

    /// A uniform sample in `[0, 1)` below the pass weight is a pass.
    pub fn status_at(&self, sample: f64) -> RunStatus {
        if sample < self.pass_weight {
            RunStatus::Passed
        } else {
            RunStatus::Failed
        }
    }
}

/// What an execution produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionReport {
    pub status: RunStatus,
    pub passed_count: u32,
    pub failed_count: u32,
    pub total_count: u32,
}

impl ExecutionReport {
    /// Placeholder counts for a pass: 5 of 5.
    pub fn passed() -> Self {
        Self {
            status: RunStatus::Passed,
            passed_count: 5,
            failed_count: 0,
            total_count: 5,
        }
    }

    /// Placeholder counts for a failure: 3 passed, 2 failed.
    pub fn failed() -> Self {
        Self {
            status: RunStatus::Failed,
            passed_count: 3,
            failed_count: 2,
            total_count: 5,
        }
    }

    pub fn for_status(status: RunStatus) -> Self {
        match status {
            RunStatus::Passed => Self::passed(),
            _ => Self::failed(),
        }
    }
}

/// Executes a started run and reports its terminal state.
#[async_trait]
pub trait OutcomeProducer: Send + Sync {
    async fn execute(&self, run: &TestRun, invocation: Invocation) -> ExecutionReport;
}

/// Random-delay, weighted-coin stand-in for a real executor.
#[derive(Debug, Clone)]
pub struct SimulatedOutcome {
    single: OutcomeProfile,
    stress: OutcomeProfile,
}

impl SimulatedOutcome {
    pub fn new(single: OutcomeProfile, stress: OutcomeProfile) -> Self {
        Self { single, stress }
    }

    pub fn profile(&self, invocation: Invocation) -> &OutcomeProfile {
        match invocation {
            Invocation::Single => &self.single,
            Invocation::Stress => &self.stress,
        }
    }
}

impl Default for SimulatedOutcome {
    fn default() -> Self {
        Self::new(OutcomeProfile::SINGLE, OutcomeProfile::STRESS)
    }
}

#[async_trait]
impl OutcomeProducer for SimulatedOutcome {
    async fn execute(&self, _run: &TestRun, invocation: Invocation) -> ExecutionReport {
        let profile = self.profile(invocation);

        tokio::time::sleep(profile.delay_at(rand::random::<f64>())).await;

        ExecutionReport::for_status(profile.status_at(rand::random::<f64>()))
    }
}
