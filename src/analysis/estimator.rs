//! PVWatts-style DC power estimation.
//!
//! Two stages per aligned row:
//!   1. Cell temperature from irradiance, ambient temperature and wind
//!      (Sandia/SAPM by default, Faiman available).
//!   2. `P_dc = P_stc * (G / 1000) * (1 + gamma * (T_cell - 25))`.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::align::AlignedRow;
use crate::domain::{Irradiance, Power, PowerEstimate, Temperature};

/// Irradiance at standard test conditions (W/m²)
pub const REFERENCE_IRRADIANCE_W_M2: f64 = 1000.0;
/// Cell temperature at standard test conditions (°C)
pub const REFERENCE_CELL_TEMPERATURE_C: f64 = 25.0;
/// Power temperature coefficient for crystalline silicon (1/°C)
pub const DEFAULT_TEMPERATURE_COEFFICIENT: f64 = -0.005;

/// Estimates PV cell operating temperature
pub trait CellTemperatureModel: fmt::Debug + Send + Sync {
    fn cell_temperature(
        &self,
        irradiance: Irradiance,
        ambient: Temperature,
        wind_speed_ms: f64,
    ) -> Temperature;
}

/// Sandia Array Performance Model cell temperature.
///
/// `T_m = G * exp(a + b * WS) + T_a`, `T_c = T_m + G / 1000 * dT`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SapmCellTemperature {
    pub a: f64,
    pub b: f64,
    pub delta_t: f64,
}

impl SapmCellTemperature {
    /// Glass/glass modules on an open rack
    pub const OPEN_RACK_GLASS_GLASS: Self = Self {
        a: -3.47,
        b: -0.0594,
        delta_t: 3.0,
    };
}

impl Default for SapmCellTemperature {
    fn default() -> Self {
        Self::OPEN_RACK_GLASS_GLASS
    }
}

impl CellTemperatureModel for SapmCellTemperature {
    fn cell_temperature(
        &self,
        irradiance: Irradiance,
        ambient: Temperature,
        wind_speed_ms: f64,
    ) -> Temperature {
        let g = irradiance.as_w_per_m2();
        let module = g * (self.a + self.b * wind_speed_ms).exp() + ambient.as_celsius();
        Temperature::celsius(module + irradiance.suns() * self.delta_t)
    }
}

/// Faiman (2008) cell temperature: `T_c = T_a + G / (U0 + U1 * WS)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaimanCellTemperature {
    pub u0: f64,
    pub u1: f64,
}

impl Default for FaimanCellTemperature {
    fn default() -> Self {
        Self { u0: 25.0, u1: 6.84 }
    }
}

impl CellTemperatureModel for FaimanCellTemperature {
    fn cell_temperature(
        &self,
        irradiance: Irradiance,
        ambient: Temperature,
        wind_speed_ms: f64,
    ) -> Temperature {
        let heat_loss = self.u0 + self.u1 * wind_speed_ms;
        Temperature::celsius(ambient.as_celsius() + irradiance.as_w_per_m2() / heat_loss)
    }
}

/// Thermal model selected in configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ThermalModel {
    Sapm(SapmCellTemperature),
    Faiman(FaimanCellTemperature),
}

impl Default for ThermalModel {
    fn default() -> Self {
        Self::Sapm(SapmCellTemperature::default())
    }
}

impl CellTemperatureModel for ThermalModel {
    fn cell_temperature(
        &self,
        irradiance: Irradiance,
        ambient: Temperature,
        wind_speed_ms: f64,
    ) -> Temperature {
        match self {
            Self::Sapm(m) => m.cell_temperature(irradiance, ambient, wind_speed_ms),
            Self::Faiman(m) => m.cell_temperature(irradiance, ambient, wind_speed_ms),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PowerEstimator<M = ThermalModel> {
    thermal: M,
    temperature_coefficient: f64,
}

impl Default for PowerEstimator {
    fn default() -> Self {
        Self::new(ThermalModel::default(), DEFAULT_TEMPERATURE_COEFFICIENT)
    }
}

impl<M: CellTemperatureModel> PowerEstimator<M> {
    pub fn new(thermal: M, temperature_coefficient: f64) -> Self {
        Self {
            thermal,
            temperature_coefficient,
        }
    }

    /// Raw two-stage model output; may be negative or non-finite for corrupt inputs
    pub fn dc_power(
        &self,
        irradiance: Irradiance,
        ambient: Temperature,
        wind_speed_ms: f64,
        rated_capacity_kw: f64,
    ) -> Power {
        let p_stc = Power::kilowatts(rated_capacity_kw);
        let cell = self
            .thermal
            .cell_temperature(irradiance, ambient, wind_speed_ms);
        let derate = 1.0
            + self.temperature_coefficient * (cell.as_celsius() - REFERENCE_CELL_TEMPERATURE_C);
        Power::watts(
            p_stc.as_watts() * (irradiance.as_w_per_m2() / REFERENCE_IRRADIANCE_W_M2) * derate,
        )
    }

    /// Estimate one aligned row.
    ///
    /// `gti <= 0` and rows without weather give exactly 0 W without running the
    /// model. Non-finite or negative model output is clamped to 0 W.
    pub fn estimate(&self, row: &AlignedRow, rated_capacity_kw: f64) -> PowerEstimate {
        let e = &row.electrical;
        let (gti, air_temp, power_w) = match &row.meteorological {
            None => (0.0, 0.0, 0.0),
            Some(m) if m.gti <= 0.0 => (m.gti, m.air_temp, 0.0),
            Some(m) => {
                let raw = self
                    .dc_power(
                        Irradiance::w_per_m2(m.gti),
                        Temperature::celsius(m.air_temp),
                        m.wind_speed,
                        rated_capacity_kw,
                    )
                    .as_watts();
                (m.gti, m.air_temp, valid_power(raw))
            }
        };

        PowerEstimate {
            time: row.time,
            estimated_power_w: power_w,
            measured_power_w: e.p_dc,
            t1: e.t1,
            t2: e.t2,
            u_dc: e.u_dc,
            gti,
            air_temp,
        }
    }
}

fn valid_power(watts: f64) -> f64 {
    if watts.is_finite() && watts > 0.0 {
        watts
    } else {
        if !watts.is_finite() {
            tracing::debug!(value = watts, "non-finite power estimate clamped to zero");
        }
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ElectricalSample, MeteorologicalSample, TimeSample};
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use rstest::rstest;

    fn row(gti: f64, air_temp: f64, wind_speed: f64) -> AlignedRow {
        let time = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut weather = MeteorologicalSample::from_values(
            time,
            &vec![0.0; MeteorologicalSample::FIELDS.len()],
        );
        weather.gti = gti;
        weather.air_temp = air_temp;
        weather.wind_speed = wind_speed;
        AlignedRow {
            time,
            electrical: ElectricalSample {
                time,
                i1: 5.0,
                u_dc: 410.0,
                p_dc: 2100.0,
                t1: 35.0,
                t2: 36.0,
                i_sum: 5.0,
            },
            meteorological: Some(weather),
        }
    }

    #[test]
    fn test_sapm_reference_point() {
        let model = SapmCellTemperature::default();
        let cell = model.cell_temperature(
            Irradiance::w_per_m2(800.0),
            Temperature::celsius(25.0),
            2.0,
        );
        let expected = 800.0 * (-3.47f64 - 0.0594 * 2.0).exp() + 25.0 + 2.4;
        assert!((cell.as_celsius() - expected).abs() < 1e-12);
        assert!((cell.as_celsius() - 49.505).abs() < 0.01);
    }

    #[test]
    fn test_wind_cools_the_cell() {
        let model = SapmCellTemperature::default();
        let g = Irradiance::w_per_m2(900.0);
        let calm = model.cell_temperature(g, Temperature::celsius(20.0), 0.0);
        let windy = model.cell_temperature(g, Temperature::celsius(20.0), 10.0);
        assert!(windy < calm);
        assert!(windy.as_celsius() > 20.0);
    }

    #[test]
    fn test_faiman_model() {
        let model = FaimanCellTemperature::default();
        let cell = model.cell_temperature(
            Irradiance::w_per_m2(1000.0),
            Temperature::celsius(20.0),
            0.0,
        );
        assert!((cell.as_celsius() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_matches_pvwatts() {
        let estimator = PowerEstimator::default();
        let estimate = estimator.estimate(&row(800.0, 25.0, 2.0), 10.0);

        let cell = 800.0 * (-3.47f64 - 0.0594 * 2.0).exp() + 25.0 + 2.4;
        let expected = 10_000.0 * 0.8 * (1.0 - 0.005 * (cell - 25.0));
        assert!((estimate.estimated_power_w - expected).abs() < 1e-9);
        assert!((estimate.estimated_power_w - 7019.8).abs() < 0.5);
        assert_eq!(estimate.measured_power_w, 2100.0);
        assert_eq!(estimate.u_dc, 410.0);
    }

    #[rstest]
    #[case(0.0, 25.0, 1.0)]
    #[case(-15.0, 25.0, 1.0)]
    #[case(0.0, f64::NAN, f64::INFINITY)]
    #[case(-1.0, 1.0e308, -1.0e308)]
    #[case(f64::NEG_INFINITY, 20.0, 1.0)]
    fn test_no_sun_no_power(#[case] gti: f64, #[case] air_temp: f64, #[case] wind: f64) {
        let estimate = PowerEstimator::default().estimate(&row(gti, air_temp, wind), 10.0);
        assert_eq!(estimate.estimated_power_w, 0.0);
        assert_eq!(estimate.t1, 35.0);
    }

    #[test]
    fn test_missing_weather_gives_zero() {
        let mut r = row(800.0, 25.0, 2.0);
        r.meteorological = None;
        let estimate = PowerEstimator::default().estimate(&r, 10.0);
        assert_eq!(estimate.estimated_power_w, 0.0);
        assert_eq!(estimate.gti, 0.0);
        assert_eq!(estimate.t2, 36.0);
    }

    #[rstest]
    #[case(f64::INFINITY, 25.0, 1.0)]
    #[case(800.0, f64::NAN, 1.0)]
    #[case(800.0, 25.0, f64::NEG_INFINITY)]
    #[case(1.0e308, 1.0e308, 0.0)]
    #[case(800.0, 1.0e6, 1.0)]
    fn test_corrupt_inputs_clamp_to_zero(
        #[case] gti: f64,
        #[case] air_temp: f64,
        #[case] wind: f64,
    ) {
        let estimate = PowerEstimator::default().estimate(&row(gti, air_temp, wind), 10.0);
        assert_eq!(estimate.estimated_power_w, 0.0);
    }

    proptest! {
        #[test]
        fn prop_estimate_is_finite_and_non_negative(
            gti in proptest::num::f64::ANY,
            air_temp in proptest::num::f64::ANY,
            wind in proptest::num::f64::ANY,
            capacity in 0.0f64..1000.0,
        ) {
            let estimate = PowerEstimator::default().estimate(&row(gti, air_temp, wind), capacity);
            prop_assert!(estimate.estimated_power_w.is_finite());
            prop_assert!(estimate.estimated_power_w >= 0.0);
            if gti <= 0.0 {
                prop_assert_eq!(estimate.estimated_power_w, 0.0);
            }
        }
    }
}
