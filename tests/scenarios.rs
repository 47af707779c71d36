//! End-to-end estimate and scoring scenarios over a fixture record store.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

use pv_monitor::analysis::{FaimanCellTemperature, PerformanceEngine, ThermalModel};
use pv_monitor::config::AnalysisConfig;
use pv_monitor::domain::{
    ElectricalReading, MeteorologicalReading, NewPvSystem, NoDataReason, PowerSeries, PvSystem,
    SystemId, TimeRange,
};
use pv_monitor::repo::TelemetryStore;

/// Read-only store over fixed vectors
#[derive(Default)]
struct FixtureStore {
    systems: Vec<PvSystem>,
    electrical: Vec<ElectricalReading>,
    meteorological: Vec<MeteorologicalReading>,
}

#[async_trait]
impl TelemetryStore for FixtureStore {
    async fn list_systems(&self) -> Result<Vec<PvSystem>> {
        let mut systems = self.systems.clone();
        systems.sort_by_key(|s| s.id);
        Ok(systems)
    }

    async fn get_system(&self, id: SystemId) -> Result<Option<PvSystem>> {
        Ok(self.systems.iter().find(|s| s.id == id).cloned())
    }

    async fn create_system(&self, _system: NewPvSystem) -> Result<PvSystem> {
        bail!("fixture store is read-only")
    }

    async fn ensure_system(&self, _system: PvSystem) -> Result<bool> {
        bail!("fixture store is read-only")
    }

    async fn update_system(&self, _system: PvSystem) -> Result<Option<PvSystem>> {
        bail!("fixture store is read-only")
    }

    async fn delete_system(&self, _id: SystemId) -> Result<Option<PvSystem>> {
        bail!("fixture store is read-only")
    }

    async fn fetch_electrical(
        &self,
        system_id: SystemId,
        range: TimeRange,
    ) -> Result<Vec<ElectricalReading>> {
        let mut rows: Vec<_> = self
            .electrical
            .iter()
            .filter(|r| r.system_id == system_id && range.contains(r.time))
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.time);
        Ok(rows)
    }

    async fn insert_electrical(&self, _readings: Vec<ElectricalReading>) -> Result<usize> {
        bail!("fixture store is read-only")
    }

    async fn delete_electrical(&self, _system_id: SystemId, _range: TimeRange) -> Result<usize> {
        bail!("fixture store is read-only")
    }

    async fn fetch_meteorological(&self, range: TimeRange) -> Result<Vec<MeteorologicalReading>> {
        let mut rows: Vec<_> = self
            .meteorological
            .iter()
            .filter(|r| range.contains(r.time))
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.time);
        Ok(rows)
    }

    async fn insert_meteorological(&self, _readings: Vec<MeteorologicalReading>) -> Result<usize> {
        bail!("fixture store is read-only")
    }

    async fn delete_meteorological(&self, _range: TimeRange) -> Result<usize> {
        bail!("fixture store is read-only")
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

fn at(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap() + Duration::minutes(minute)
}

fn system(id: SystemId, capacity_kw: f64, number_of_panels: i32) -> PvSystem {
    PvSystem {
        id,
        name: format!("System {id}"),
        capacity_kw,
        inverter_type: format!("Inverter Type {id}"),
        number_of_panels,
        technology: "Half-cut Mono-Si".to_string(),
        year_of_installation: 2021,
    }
}

fn electrical(system_id: SystemId, minute: i64, p_dc: f64) -> ElectricalReading {
    ElectricalReading {
        system_id,
        time: at(minute),
        adresse: Some(1),
        i1: Some(p_dc / 400.0),
        u_dc: Some(400.0),
        p_dc: Some(p_dc),
        t1: Some(32.0),
        t2: Some(33.0),
        i_sum: Some(p_dc / 400.0),
    }
}

fn weather(minute: i64, gti: f64, air_temp: f64, wind_speed: f64) -> MeteorologicalReading {
    MeteorologicalReading {
        time: at(minute),
        gti: Some(gti),
        ghi: Some(gti * 0.9),
        dni: None,
        dhi: None,
        air_temp: Some(air_temp),
        rh: Some(45.0),
        pressure: Some(1013.0),
        wind_speed: Some(wind_speed),
        wind_dir: Some(180.0),
        wind_gust: None,
        rain: Some(0.0),
    }
}

fn reference_weather() -> Vec<MeteorologicalReading> {
    vec![weather(0, 0.0, 20.0, 1.0), weather(5, 800.0, 25.0, 2.0)]
}

fn engine(store: FixtureStore) -> PerformanceEngine {
    PerformanceEngine::new(Arc::new(store), &AnalysisConfig::default())
}

#[tokio::test]
async fn reference_installation_estimate_and_score() {
    let store = FixtureStore {
        systems: vec![system(1, 10.0, 40)],
        electrical: vec![electrical(1, 0, 0.0), electrical(1, 5, 6500.0)],
        meteorological: reference_weather(),
    };
    let engine = engine(store);

    let series = engine.estimate_power_series(1).await.unwrap();
    let estimates = series.estimates().unwrap();
    assert_eq!(estimates.len(), 2);
    assert_eq!(estimates[0].estimated_power_w, 0.0);
    assert!((estimates[1].estimated_power_w - 7019.793).abs() < 1e-2);
    assert_eq!(estimates[1].measured_power_w, 6500.0);
    assert_eq!(estimates[1].gti, 800.0);

    let scores = engine.score_all_systems().await.unwrap();
    assert_eq!(scores.len(), 1);
    let expected = (estimates[1].estimated_power_w / 400_000.0 * 20.0).clamp(0.0, 20.0);
    assert!((scores[0].score - expected).abs() < 1e-12);
    assert!((scores[0].score - 0.35099).abs() < 1e-4);
}

#[tokio::test]
async fn bursts_are_averaged_before_estimation() {
    let store = FixtureStore {
        systems: vec![system(1, 10.0, 40)],
        electrical: vec![
            electrical(1, 0, 0.0),
            electrical(1, 5, 6000.0),
            electrical(1, 6, 7000.0),
        ],
        meteorological: reference_weather(),
    };

    let series = engine(store).estimate_power_series(1).await.unwrap();
    let estimates = series.estimates().unwrap();
    assert_eq!(estimates.len(), 2);
    assert_eq!(estimates[1].measured_power_w, 6500.0);
}

#[tokio::test]
async fn weather_is_forward_filled_onto_finer_grid() {
    let store = FixtureStore {
        systems: vec![system(1, 10.0, 40)],
        electrical: (0..4).map(|i| electrical(1, i * 5, 3000.0)).collect(),
        meteorological: vec![weather(0, 500.0, 22.0, 1.5), weather(15, 600.0, 23.0, 1.5)],
    };

    let series = engine(store).estimate_power_series(1).await.unwrap();
    let gti: Vec<f64> = series.estimates().unwrap().iter().map(|e| e.gti).collect();
    // The weather grid is interpolated at 5 minutes before the as-of join
    let expected = [500.0, 500.0 + 100.0 / 3.0, 500.0 + 200.0 / 3.0, 600.0];
    for (got, want) in gti.iter().zip(expected) {
        assert!((got - want).abs() < 1e-9, "{got} != {want}");
    }
}

#[tokio::test]
async fn no_weather_overlap_is_no_data() {
    let store = FixtureStore {
        systems: vec![system(1, 10.0, 40)],
        electrical: vec![electrical(1, 0, 0.0), electrical(1, 5, 1000.0)],
        meteorological: vec![weather(120, 800.0, 25.0, 2.0)],
    };

    let series = engine(store).estimate_power_series(1).await.unwrap();
    assert_eq!(
        series,
        PowerSeries::NoData {
            reason: NoDataReason::NoMeteorologicalData
        }
    );
}

#[tokio::test]
async fn zero_capacity_system_is_isolated() {
    let store = FixtureStore {
        systems: vec![system(1, 10.0, 40), system(2, 0.0, 10), system(3, 2.34, 7)],
        electrical: [1, 2, 3]
            .into_iter()
            .flat_map(|id| [electrical(id, 0, 0.0), electrical(id, 5, 1500.0)])
            .collect(),
        meteorological: reference_weather(),
    };

    let scores = engine(store).score_all_systems().await.unwrap();
    let ids: Vec<_> = scores.iter().map(|s| s.system_id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert!(scores.iter().all(|s| (0.0..=20.0).contains(&s.score)));
}

#[tokio::test]
async fn corrupt_panel_count_is_isolated() {
    let store = FixtureStore {
        systems: vec![system(1, 10.0, 40), system(2, 5.25, -1), system(3, 2.34, 7)],
        electrical: [1, 2, 3]
            .into_iter()
            .flat_map(|id| [electrical(id, 0, 0.0), electrical(id, 5, 1500.0)])
            .collect(),
        meteorological: reference_weather(),
    };

    let scores = engine(store).score_all_systems().await.unwrap();
    let ids: Vec<_> = scores.iter().map(|s| s.system_id).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[tokio::test]
async fn systems_without_electrical_rows_are_omitted() {
    let store = FixtureStore {
        systems: vec![system(1, 10.0, 40), system(2, 5.25, 10)],
        electrical: vec![electrical(1, 0, 0.0), electrical(1, 5, 4000.0)],
        meteorological: reference_weather(),
    };

    let scores = engine(store).score_all_systems().await.unwrap();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].system_id, 1);
}

#[tokio::test]
async fn corrupt_weather_never_leaks_non_finite_values() {
    let mut hot = weather(5, 800.0, 25.0, 2.0);
    hot.air_temp = Some(f64::INFINITY);
    let store = FixtureStore {
        systems: vec![system(1, 10.0, 40)],
        electrical: vec![electrical(1, 0, 0.0), electrical(1, 5, 4000.0)],
        meteorological: vec![weather(0, 0.0, 20.0, 1.0), hot],
    };
    let engine = engine(store);

    let series = engine.estimate_power_series(1).await.unwrap();
    let json = serde_json::to_string(&series).unwrap();
    assert!(!json.contains("null"));
    for e in series.estimates().unwrap() {
        assert!(e.estimated_power_w.is_finite() && e.estimated_power_w >= 0.0);
        assert!(e.air_temp.is_finite());
    }

    let scores = engine.score_all_systems().await.unwrap();
    assert!(scores[0].score.is_finite());
}

#[tokio::test]
async fn faiman_model_can_be_configured() {
    let store = FixtureStore {
        systems: vec![system(1, 10.0, 40)],
        electrical: vec![electrical(1, 0, 0.0), electrical(1, 5, 4000.0)],
        meteorological: vec![weather(0, 0.0, 20.0, 0.0), weather(5, 1000.0, 20.0, 0.0)],
    };
    let cfg = AnalysisConfig {
        cell_temperature: ThermalModel::Faiman(FaimanCellTemperature::default()),
        ..AnalysisConfig::default()
    };

    let series = PerformanceEngine::new(Arc::new(store), &cfg)
        .estimate_power_series(1)
        .await
        .unwrap();
    // Tc = 20 + 1000 / 25 = 60 °C
    let expected = 10_000.0 * (1.0 - 0.005 * 35.0);
    assert!((series.estimates().unwrap()[1].estimated_power_w - expected).abs() < 1e-9);
}
