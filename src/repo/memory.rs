//! In-process record store, used when no database is configured and in tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::btree_map::{BTreeMap, Entry};

use super::TelemetryStore;
use crate::domain::{
    ElectricalReading, MeteorologicalReading, NewPvSystem, PvSystem, SystemId, TimeRange,
};

/// Electrical rows of one system keyed by timestamp and logger address
type ElectricalTable = BTreeMap<(DateTime<Utc>, Option<i64>), ElectricalReading>;

#[derive(Debug, Default)]
struct Tables {
    systems: BTreeMap<SystemId, PvSystem>,
    electrical: BTreeMap<SystemId, ElectricalTable>,
    meteorological: BTreeMap<DateTime<Utc>, MeteorologicalReading>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the given installations
    pub fn with_systems(systems: impl IntoIterator<Item = PvSystem>) -> Self {
        let store = Self::new();
        {
            let mut tables = store.tables.write();
            for system in systems {
                tables.systems.insert(system.id, system);
            }
        }
        store
    }
}

#[async_trait]
impl TelemetryStore for InMemoryStore {
    async fn list_systems(&self) -> Result<Vec<PvSystem>> {
        Ok(self.tables.read().systems.values().cloned().collect())
    }

    async fn get_system(&self, id: SystemId) -> Result<Option<PvSystem>> {
        Ok(self.tables.read().systems.get(&id).cloned())
    }

    async fn create_system(&self, system: NewPvSystem) -> Result<PvSystem> {
        let mut tables = self.tables.write();
        let id = tables.systems.keys().next_back().map_or(1, |last| last + 1);
        let system = system.with_id(id);
        tables.systems.insert(id, system.clone());
        Ok(system)
    }

    async fn ensure_system(&self, system: PvSystem) -> Result<bool> {
        let mut tables = self.tables.write();
        if tables.systems.contains_key(&system.id) {
            return Ok(false);
        }
        tables.systems.insert(system.id, system);
        Ok(true)
    }

    async fn update_system(&self, system: PvSystem) -> Result<Option<PvSystem>> {
        let mut tables = self.tables.write();
        Ok(tables.systems.get_mut(&system.id).map(|stored| {
            *stored = system;
            stored.clone()
        }))
    }

    async fn delete_system(&self, id: SystemId) -> Result<Option<PvSystem>> {
        let mut tables = self.tables.write();
        let removed = tables.systems.remove(&id);
        if removed.is_some() {
            tables.electrical.remove(&id);
        }
        Ok(removed)
    }

    async fn fetch_electrical(
        &self,
        system_id: SystemId,
        range: TimeRange,
    ) -> Result<Vec<ElectricalReading>> {
        let tables = self.tables.read();
        Ok(tables
            .electrical
            .get(&system_id)
            .map(|rows| {
                rows.values()
                    .filter(|r| range.contains(r.time))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert_electrical(&self, readings: Vec<ElectricalReading>) -> Result<usize> {
        let mut tables = self.tables.write();
        if let Some(orphan) = readings
            .iter()
            .find(|r| !tables.systems.contains_key(&r.system_id))
        {
            bail!("electrical reading references unknown system {}", orphan.system_id);
        }
        let mut inserted = 0;
        for reading in readings {
            let rows = tables.electrical.entry(reading.system_id).or_default();
            if let Entry::Vacant(slot) = rows.entry((reading.time, reading.adresse)) {
                slot.insert(reading);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn delete_electrical(&self, system_id: SystemId, range: TimeRange) -> Result<usize> {
        let mut tables = self.tables.write();
        let Some(rows) = tables.electrical.get_mut(&system_id) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|(time, _), _| !range.contains(*time));
        Ok(before - rows.len())
    }

    async fn fetch_meteorological(&self, range: TimeRange) -> Result<Vec<MeteorologicalReading>> {
        let tables = self.tables.read();
        Ok(tables
            .meteorological
            .values()
            .filter(|r| range.contains(r.time))
            .cloned()
            .collect())
    }

    async fn insert_meteorological(&self, readings: Vec<MeteorologicalReading>) -> Result<usize> {
        let mut tables = self.tables.write();
        let mut inserted = 0;
        for reading in readings {
            if let Entry::Vacant(slot) = tables.meteorological.entry(reading.time) {
                slot.insert(reading);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn delete_meteorological(&self, range: TimeRange) -> Result<usize> {
        let mut tables = self.tables.write();
        let before = tables.meteorological.len();
        tables.meteorological.retain(|time, _| !range.contains(*time));
        Ok(before - tables.meteorological.len())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
