//! Readers for the weather-station and logger CSV exports.
//!
//! Timestamps are naive in the files and interpreted at a fixed UTC offset.
//! Empty numeric cells are imported as 0.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::Deserialize;
use std::io::Read;

use super::IngestError;
use crate::domain::{ElectricalReading, MeteorologicalReading, SystemId};

pub const METEOROLOGICAL_TIME_FORMAT: &str = "%m/%d/%Y %H:%M";
pub const ELECTRICAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
struct MeteorologicalRecord {
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "GTI")]
    gti: Option<f64>,
    #[serde(rename = "GHI")]
    ghi: Option<f64>,
    #[serde(rename = "DNI")]
    dni: Option<f64>,
    #[serde(rename = "DHI")]
    dhi: Option<f64>,
    #[serde(rename = "Air_Temp")]
    air_temp: Option<f64>,
    #[serde(rename = "RH")]
    rh: Option<f64>,
    #[serde(rename = "Pressure")]
    pressure: Option<f64>,
    #[serde(rename = "Wind_speed")]
    wind_speed: Option<f64>,
    wind_dir: Option<f64>,
    wind_gust: Option<f64>,
    #[serde(rename = "Rain")]
    rain: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ElectricalRecord {
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Adresse")]
    adresse: Option<f64>,
    #[serde(rename = "I1")]
    i1: Option<f64>,
    #[serde(rename = "U_DC")]
    u_dc: Option<f64>,
    #[serde(rename = "P_DC")]
    p_dc: Option<f64>,
    #[serde(rename = "T1")]
    t1: Option<f64>,
    #[serde(rename = "T2")]
    t2: Option<f64>,
    #[serde(rename = "I_SUM")]
    i_sum: Option<f64>,
}

fn zero_if_empty(value: Option<f64>) -> Option<f64> {
    Some(value.unwrap_or(0.0))
}

fn parse_time(
    raw: &str,
    format: &str,
    offset: FixedOffset,
    line: u64,
) -> Result<DateTime<Utc>, IngestError> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), format).map_err(|source| {
        IngestError::Timestamp {
            line,
            value: raw.to_string(),
            source,
        }
    })?;
    naive
        .and_local_timezone(offset)
        .single()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| IngestError::AmbiguousTime {
            line,
            value: raw.to_string(),
        })
}

fn line_of(record: &csv::StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

/// Parse a weather-station export
pub fn read_meteorological<R: Read>(
    reader: R,
    offset: FixedOffset,
) -> Result<Vec<MeteorologicalReading>, IngestError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = line_of(&record);
        let r: MeteorologicalRecord = record.deserialize(Some(&headers))?;
        rows.push(MeteorologicalReading {
            time: parse_time(&r.time, METEOROLOGICAL_TIME_FORMAT, offset, line)?,
            gti: zero_if_empty(r.gti),
            ghi: zero_if_empty(r.ghi),
            dni: zero_if_empty(r.dni),
            dhi: zero_if_empty(r.dhi),
            air_temp: zero_if_empty(r.air_temp),
            rh: zero_if_empty(r.rh),
            pressure: zero_if_empty(r.pressure),
            wind_speed: zero_if_empty(r.wind_speed),
            wind_dir: zero_if_empty(r.wind_dir),
            wind_gust: zero_if_empty(r.wind_gust),
            rain: zero_if_empty(r.rain),
        });
    }
    Ok(rows)
}

/// Parse a logger export for one installation
pub fn read_electrical<R: Read>(
    reader: R,
    system_id: SystemId,
    offset: FixedOffset,
) -> Result<Vec<ElectricalReading>, IngestError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = line_of(&record);
        let r: ElectricalRecord = record.deserialize(Some(&headers))?;
        rows.push(ElectricalReading {
            system_id,
            time: parse_time(&r.time, ELECTRICAL_TIME_FORMAT, offset, line)?,
            // Loggers write the bus address as a float
            adresse: Some(r.adresse.unwrap_or(0.0) as i64),
            i1: zero_if_empty(r.i1),
            u_dc: zero_if_empty(r.u_dc),
            p_dc: zero_if_empty(r.p_dc),
            t1: zero_if_empty(r.t1),
            t2: zero_if_empty(r.t2),
            i_sum: zero_if_empty(r.i_sum),
        });
    }
    Ok(rows)
}
