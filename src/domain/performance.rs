use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use super::SystemId;

/// Modeled DC output for one grid timestamp plus the inputs worth showing beside it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerEstimate {
    pub time: DateTime<Utc>,
    /// Estimated DC power (W); finite and never negative
    pub estimated_power_w: f64,
    /// Measured DC power reported by the logger (W)
    pub measured_power_w: f64,
    pub t1: f64,
    pub t2: f64,
    pub u_dc: f64,
    pub gti: f64,
    pub air_temp: f64,
}

/// Bounded performance score for one installation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemScore {
    pub system_id: SystemId,
    pub name: String,
    pub score: f64,
    pub capacity_kw: f64,
    pub number_of_panels: i32,
    /// Sum of the estimates that fed the score (W)
    pub total_power_w: f64,
}

/// Why a system produced no estimates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NoDataReason {
    /// The system has no electrical readings at all
    NoElectricalData,
    /// No weather readings fall inside the electrical time span
    NoMeteorologicalData,
}

/// Outcome of a single-system estimate query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PowerSeries {
    Computed { estimates: Vec<PowerEstimate> },
    NoData { reason: NoDataReason },
}

impl PowerSeries {
    pub fn estimates(&self) -> Option<&[PowerEstimate]> {
        match self {
            Self::Computed { estimates } => Some(estimates),
            Self::NoData { .. } => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData { .. })
    }
}
