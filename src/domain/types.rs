use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Time Helper Types
// ============================================================================

/// Inclusive time window used for range queries against the record store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a range; returns None when `start` is after `end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Range covering every representable timestamp
    pub fn all() -> Self {
        Self {
            start: DateTime::<Utc>::MIN_UTC,
            end: DateTime::<Utc>::MAX_UTC,
        }
    }

    /// Smallest range containing every timestamp, or None for no timestamps
    pub fn spanning<I>(times: I) -> Option<Self>
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        times.into_iter().fold(None, |acc: Option<Self>, t| match acc {
            None => Some(Self { start: t, end: t }),
            Some(r) => Some(Self {
                start: r.start.min(t),
                end: r.end.max(t),
            }),
        })
    }

    /// Each side as a finite bound, or None where the range is open on that side
    pub fn bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let start = (self.start != DateTime::<Utc>::MIN_UTC).then_some(self.start);
        let end = (self.end != DateTime::<Utc>::MAX_UTC).then_some(self.end);
        (start, end)
    }

    /// Check whether a timestamp lies inside the range (both ends included)
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start <= time && time <= self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

// ============================================================================
// Physical Unit Newtypes
// ============================================================================

/// DC power in Watts (W)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct Power(pub f64);

impl Power {
    pub fn watts(w: f64) -> Self {
        Self(w)
    }

    pub fn kilowatts(kw: f64) -> Self {
        Self(kw * 1000.0)
    }

    pub fn as_watts(&self) -> f64 {
        self.0
    }
}

/// Plane-of-array irradiance in W/m²
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct Irradiance(pub f64);

impl Irradiance {
    pub fn w_per_m2(value: f64) -> Self {
        Self(value)
    }

    pub fn as_w_per_m2(&self) -> f64 {
        self.0
    }

    /// Fraction of the 1000 W/m² standard test condition
    pub fn suns(&self) -> f64 {
        self.0 / 1000.0
    }
}

/// Air or cell temperature in °C
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct Temperature(pub f64);

impl Temperature {
    pub fn celsius(c: f64) -> Self {
        Self(c)
    }

    pub fn as_celsius(&self) -> f64 {
        self.0
    }
}
