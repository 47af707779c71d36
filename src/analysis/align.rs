use chrono::{DateTime, Utc};
use serde::Serialize;

use super::resample::ResampledSeries;
use crate::domain::{ElectricalSample, MeteorologicalSample};

/// Electrical grid point joined with the latest weather row at or before it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedRow {
    pub time: DateTime<Utc>,
    pub electrical: ElectricalSample,
    /// None while the electrical grid precedes weather coverage
    pub meteorological: Option<MeteorologicalSample>,
}

/// As-of join of two resampled series on the electrical grid.
///
/// Each electrical timestamp takes the meteorological sample with the greatest
/// timestamp `<=` its own (forward fill, never the nearest future row). Output
/// keeps the electrical grid order. Either side empty gives no rows.
pub fn align(
    electrical: &ResampledSeries<ElectricalSample>,
    meteorological: &ResampledSeries<MeteorologicalSample>,
) -> Vec<AlignedRow> {
    if electrical.is_empty() || meteorological.is_empty() {
        return Vec::new();
    }

    let weather = meteorological.samples();
    electrical
        .samples()
        .iter()
        .map(|e| {
            let covered = weather.partition_point(|m| m.time <= e.time);
            AlignedRow {
                time: e.time,
                electrical: *e,
                meteorological: covered.checked_sub(1).map(|i| weather[i]),
            }
        })
        .collect()
}
