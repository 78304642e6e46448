//! Business logic services.

pub mod catalog;
pub mod change_bus;
pub mod event_broadcaster;
pub mod outcome;
pub mod run_engine;
pub mod stats;

pub use catalog::Catalog;
pub use change_bus::{ChangeBus, SubscriptionId};
pub use event_broadcaster::EventBroadcaster;
pub use outcome::{ExecutionReport, Invocation, OutcomeProducer, OutcomeProfile, SimulatedOutcome};
pub use run_engine::{EngineOptions, RunEngine, DEFAULT_TRIGGER, FAILURE_DIAGNOSIS, STRESS_TRIGGER};
