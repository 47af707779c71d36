//! Per-system estimate pipeline and fleet scoring over a record store.

use chrono::Duration;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::align::align;
use super::error::AnalysisError;
use super::estimator::PowerEstimator;
use super::resample::resample;
use super::sanitize::Sanitize;
use super::score;
use crate::config::AnalysisConfig;
use crate::domain::{
    ElectricalSample, MeteorologicalSample, NoDataReason, PowerSeries, PvSystem, SystemId,
    SystemScore, TimeRange,
};
use crate::repo::TelemetryStore;

pub struct PerformanceEngine {
    store: Arc<dyn TelemetryStore>,
    estimator: PowerEstimator,
    interval: Duration,
}

impl PerformanceEngine {
    pub fn new(store: Arc<dyn TelemetryStore>, cfg: &AnalysisConfig) -> Self {
        Self {
            store,
            estimator: PowerEstimator::new(cfg.cell_temperature, cfg.temperature_coefficient),
            interval: cfg.resample_interval(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Estimated DC power on the resampled grid for one system
    #[instrument(skip(self))]
    pub async fn estimate_power_series(
        &self,
        system_id: SystemId,
    ) -> Result<PowerSeries, AnalysisError> {
        let system = self
            .store
            .get_system(system_id)
            .await?
            .ok_or(AnalysisError::NotFound(system_id))?;
        self.series_for(&system).await
    }

    async fn series_for(&self, system: &PvSystem) -> Result<PowerSeries, AnalysisError> {
        let electrical = self
            .store
            .fetch_electrical(system.id, TimeRange::all())
            .await?;
        let Some(span) = TimeRange::spanning(electrical.iter().map(|r| r.time)) else {
            return Ok(PowerSeries::NoData {
                reason: NoDataReason::NoElectricalData,
            });
        };

        let weather = self.store.fetch_meteorological(span).await?;
        if weather.is_empty() {
            return Ok(PowerSeries::NoData {
                reason: NoDataReason::NoMeteorologicalData,
            });
        }

        let electrical: Vec<ElectricalSample> = electrical.iter().map(Into::into).collect();
        let weather: Vec<MeteorologicalSample> = weather.iter().map(Into::into).collect();
        let electrical = resample(&electrical, self.interval);
        let weather = resample(&weather, self.interval);

        let estimates = align(&electrical, &weather)
            .iter()
            .map(|row| {
                self.estimator
                    .estimate(row, system.capacity_kw)
                    .sanitize()
            })
            .collect::<Vec<_>>();

        debug!(
            system_id = system.id,
            rows = estimates.len(),
            %span,
            "power series estimated"
        );
        Ok(PowerSeries::Computed { estimates })
    }

    /// Score one system; `Ok(None)` when it has no usable data
    pub async fn score_system(
        &self,
        system: &PvSystem,
    ) -> Result<Option<SystemScore>, AnalysisError> {
        system
            .check_scorable()
            .map_err(|source| AnalysisError::Configuration {
                system_id: system.id,
                source,
            })?;

        let estimates = match self.series_for(system).await? {
            PowerSeries::Computed { estimates } => estimates,
            PowerSeries::NoData { reason } => {
                debug!(system_id = system.id, %reason, "system skipped");
                return Ok(None);
            }
        };

        score::score_system(system, &estimates)
            .map(Some)
            .map_err(|source| AnalysisError::Configuration {
                system_id: system.id,
                source,
            })
    }

    /// Score every system, in listing order.
    ///
    /// Systems without data and systems that fail individually are left out;
    /// only a failure to list systems fails the whole run.
    #[instrument(skip(self))]
    pub async fn score_all_systems(&self) -> Result<Vec<SystemScore>, AnalysisError> {
        let systems = self.store.list_systems().await?;
        let outcomes = join_all(systems.iter().map(|s| self.score_system(s))).await;

        let mut scores = Vec::with_capacity(systems.len());
        let mut failed = 0usize;
        for (system, outcome) in systems.iter().zip(outcomes) {
            match outcome {
                Ok(Some(score)) => scores.push(score),
                Ok(None) => {}
                Err(e) => {
                    failed += 1;
                    warn!(system_id = system.id, error = %e, "system excluded from scoring");
                }
            }
        }

        info!(
            systems = systems.len(),
            scored = scores.len(),
            failed,
            "fleet scoring complete"
        );
        Ok(scores)
    }
}
