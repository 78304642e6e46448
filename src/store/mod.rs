//! Entity persistence over two interchangeable backends.
//!
//! Every collection is served by the remote table store when one is
//! configured, and by the local collection files otherwise or whenever the
//! remote call fails. Nothing is reconciled between the two: once a write
//! lands only locally, the backends stay diverged.

pub mod entity;
pub mod local;
pub mod remote;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::info;

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{Project, TestResult, TestRun, TestSuite};

pub use entity::EntityStore;
pub use local::LocalStore;
pub use remote::{PostgrestBackend, RemoteBackend};

/// A persisted entity type.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Insert payload, lacking identity and timestamps.
    type New: Serialize + Send + Sync;

    /// Collection (table) name.
    const COLLECTION: &'static str;
    /// Timestamp field used for the default newest-first ordering.
    const ORDER_FIELD: &'static str;
    /// Whether the record carries an `updated_at` refreshed on update.
    const HAS_UPDATED_AT: bool = false;

    fn id(&self) -> &str;

    fn order_key(&self) -> DateTime<Utc>;
}

/// Equality filter on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: &'static str,
    pub value: String,
}

impl Filter {
    pub fn eq(field: &'static str, value: impl Into<String>) -> Self {
        Filter {
            field,
            value: value.into(),
        }
    }

    /// Whether a stored row satisfies the filter.
    pub fn matches(&self, row: &JsonValue) -> bool {
        match row.get(self.field) {
            Some(JsonValue::String(s)) => *s == self.value,
            Some(JsonValue::Null) | None => false,
            Some(other) => other.to_string() == self.value,
        }
    }
}

/// Which backend answers first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    Remote,
    Local,
}

pub(crate) struct Backends {
    pub(crate) remote: Option<Arc<dyn RemoteBackend>>,
    pub(crate) local: LocalStore,
}

/// Handle to all collections, sharing one pair of backends.
#[derive(Clone)]
pub struct Datastore {
    backends: Arc<Backends>,
}

impl Datastore {
    pub fn new(local: LocalStore, remote: Option<Arc<dyn RemoteBackend>>) -> Self {
        Datastore {
            backends: Arc::new(Backends { remote, local }),
        }
    }

    /// Build the datastore described by the configuration.
    pub async fn from_config(config: &Config) -> AppResult<Self> {
        let local = LocalStore::open(&config.data_dir).await?;

        let remote = match &config.remote {
            Some(settings) => {
                let backend = PostgrestBackend::new(settings)?;
                info!("Remote table store configured at {}", settings.url);
                Some(Arc::new(backend) as Arc<dyn RemoteBackend>)
            }
            None => {
                info!("No remote table store configured, using local collections only");
                None
            }
        };

        Ok(Datastore::new(local, remote))
    }

    pub fn collection<T: Record>(&self) -> EntityStore<T> {
        EntityStore::new(self.backends.clone())
    }

    pub fn projects(&self) -> EntityStore<Project> {
        self.collection()
    }

    pub fn suites(&self) -> EntityStore<TestSuite> {
        self.collection()
    }

    pub fn runs(&self) -> EntityStore<TestRun> {
        self.collection()
    }

    pub fn results(&self) -> EntityStore<TestResult> {
        self.collection()
    }

    pub fn mode(&self) -> BackendMode {
        if self.backends.remote.is_some() {
            BackendMode::Remote
        } else {
            BackendMode::Local
        }
    }

    /// The local fallback backend.
    pub fn local(&self) -> &LocalStore {
        &self.backends.local
    }
}
