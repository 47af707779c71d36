//! Raw telemetry records as stored, and their zero-filled counterparts used by
//! the analysis pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SystemId;

/// One electrical measurement row for an installation; every value is nullable at the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricalReading {
    pub system_id: SystemId,
    pub time: DateTime<Utc>,
    /// Bus address of the logger that produced the row
    pub adresse: Option<i64>,
    pub i1: Option<f64>,
    pub u_dc: Option<f64>,
    pub p_dc: Option<f64>,
    pub t1: Option<f64>,
    pub t2: Option<f64>,
    pub i_sum: Option<f64>,
}

/// One weather-station row; shared by every installation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeteorologicalReading {
    pub time: DateTime<Utc>,
    pub gti: Option<f64>,
    pub ghi: Option<f64>,
    pub dni: Option<f64>,
    pub dhi: Option<f64>,
    pub air_temp: Option<f64>,
    pub rh: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_dir: Option<f64>,
    pub wind_gust: Option<f64>,
    pub rain: Option<f64>,
}

/// A timestamped record with a fixed list of numeric fields.
///
/// `values` and `from_values` must agree on field order and both use
/// exactly `FIELDS.len()` entries.
pub trait TimeSample: Clone {
    const FIELDS: &'static [&'static str];

    fn time(&self) -> DateTime<Utc>;
    fn values(&self) -> Vec<f64>;
    fn from_values(time: DateTime<Utc>, values: &[f64]) -> Self;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElectricalSample {
    pub time: DateTime<Utc>,
    pub i1: f64,
    pub u_dc: f64,
    pub p_dc: f64,
    pub t1: f64,
    pub t2: f64,
    pub i_sum: f64,
}

impl From<&ElectricalReading> for ElectricalSample {
    fn from(r: &ElectricalReading) -> Self {
        Self {
            time: r.time,
            i1: r.i1.unwrap_or(0.0),
            u_dc: r.u_dc.unwrap_or(0.0),
            p_dc: r.p_dc.unwrap_or(0.0),
            t1: r.t1.unwrap_or(0.0),
            t2: r.t2.unwrap_or(0.0),
            i_sum: r.i_sum.unwrap_or(0.0),
        }
    }
}

impl TimeSample for ElectricalSample {
    const FIELDS: &'static [&'static str] = &["i1", "u_dc", "p_dc", "t1", "t2", "i_sum"];

    fn time(&self) -> DateTime<Utc> {
        self.time
    }

    fn values(&self) -> Vec<f64> {
        vec![self.i1, self.u_dc, self.p_dc, self.t1, self.t2, self.i_sum]
    }

    fn from_values(time: DateTime<Utc>, v: &[f64]) -> Self {
        Self {
            time,
            i1: v[0],
            u_dc: v[1],
            p_dc: v[2],
            t1: v[3],
            t2: v[4],
            i_sum: v[5],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeteorologicalSample {
    pub time: DateTime<Utc>,
    pub gti: f64,
    pub ghi: f64,
    pub dni: f64,
    pub dhi: f64,
    pub air_temp: f64,
    pub rh: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_dir: f64,
    pub wind_gust: f64,
    pub rain: f64,
}

impl From<&MeteorologicalReading> for MeteorologicalSample {
    fn from(r: &MeteorologicalReading) -> Self {
        Self {
            time: r.time,
            gti: r.gti.unwrap_or(0.0),
            ghi: r.ghi.unwrap_or(0.0),
            dni: r.dni.unwrap_or(0.0),
            dhi: r.dhi.unwrap_or(0.0),
            air_temp: r.air_temp.unwrap_or(0.0),
            rh: r.rh.unwrap_or(0.0),
            pressure: r.pressure.unwrap_or(0.0),
            wind_speed: r.wind_speed.unwrap_or(0.0),
            wind_dir: r.wind_dir.unwrap_or(0.0),
            wind_gust: r.wind_gust.unwrap_or(0.0),
            rain: r.rain.unwrap_or(0.0),
        }
    }
}

impl TimeSample for MeteorologicalSample {
    const FIELDS: &'static [&'static str] = &[
        "gti",
        "ghi",
        "dni",
        "dhi",
        "air_temp",
        "rh",
        "pressure",
        "wind_speed",
        "wind_dir",
        "wind_gust",
        "rain",
    ];

    fn time(&self) -> DateTime<Utc> {
        self.time
    }

    fn values(&self) -> Vec<f64> {
        vec![
            self.gti,
            self.ghi,
            self.dni,
            self.dhi,
            self.air_temp,
            self.rh,
            self.pressure,
            self.wind_speed,
            self.wind_dir,
            self.wind_gust,
            self.rain,
        ]
    }

    fn from_values(time: DateTime<Utc>, v: &[f64]) -> Self {
        Self {
            time,
            gti: v[0],
            ghi: v[1],
            dni: v[2],
            dhi: v[3],
            air_temp: v[4],
            rh: v[5],
            pressure: v[6],
            wind_speed: v[7],
            wind_dir: v[8],
            wind_gust: v[9],
            rain: v[10],
        }
    }
}
