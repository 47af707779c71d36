use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::domain::{
    ElectricalReading, MeteorologicalReading, NewPvSystem, PvSystem, SystemId, TimeRange,
};

pub mod memory;
#[cfg(feature = "db")]
pub mod pg;

pub use memory::InMemoryStore;

/// Record store for installations and their raw telemetry.
///
/// Range queries include both ends of the range and return rows in
/// ascending time order. A reading whose key is already stored (timestamp
/// plus system and logger address for electrical rows, timestamp alone for
/// weather rows) is skipped on insert, and inserts return the number of new rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// All installations, ascending by id
    async fn list_systems(&self) -> Result<Vec<PvSystem>>;

    async fn get_system(&self, id: SystemId) -> Result<Option<PvSystem>>;

    /// Register a new installation and assign it the next free id
    async fn create_system(&self, system: NewPvSystem) -> Result<PvSystem>;

    /// Insert an installation with a fixed id unless one already exists.
    /// Returns whether it was inserted.
    async fn ensure_system(&self, system: PvSystem) -> Result<bool>;

    /// Replace every field of an existing installation; None if the id is unknown
    async fn update_system(&self, system: PvSystem) -> Result<Option<PvSystem>>;

    /// Remove an installation together with its electrical readings
    async fn delete_system(&self, id: SystemId) -> Result<Option<PvSystem>>;

    async fn fetch_electrical(
        &self,
        system_id: SystemId,
        range: TimeRange,
    ) -> Result<Vec<ElectricalReading>>;

    async fn insert_electrical(&self, readings: Vec<ElectricalReading>) -> Result<usize>;

    async fn delete_electrical(&self, system_id: SystemId, range: TimeRange) -> Result<usize>;

    async fn fetch_meteorological(&self, range: TimeRange) -> Result<Vec<MeteorologicalReading>>;

    async fn insert_meteorological(&self, readings: Vec<MeteorologicalReading>) -> Result<usize>;

    async fn delete_meteorological(&self, range: TimeRange) -> Result<usize>;

    /// Cheap connectivity probe for health checks
    async fn ping(&self) -> Result<()>;
}

pub struct Repositories {
    pub store: Arc<dyn TelemetryStore>,
}

impl Repositories {
    pub async fn new(cfg: &Config) -> Result<Self> {
        #[cfg(feature = "db")]
        {
            if let Some(url) = cfg.db.url.as_deref().filter(|u| !u.is_empty()) {
                let store = crate::repo::pg::PgStore::connect(url).await?;
                store.ensure_schema().await?;
                info!("using PostgreSQL record store");
                return Ok(Self {
                    store: Arc::new(store),
                });
            }
        }

        let _ = cfg;
        info!("using in-memory record store");
        Ok(Self {
            store: Arc::new(InMemoryStore::new()),
        })
    }

    pub fn with_store(store: Arc<dyn TelemetryStore>) -> Self {
        Self { store }
    }
}
