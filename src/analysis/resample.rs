//! Temporal resampling onto a fixed-cadence grid.
//!
//! Readings are bucketed by `floor(t / interval)` with buckets aligned to the
//! Unix epoch, each bucket is reduced to its per-field mean, and grid points
//! without a bucket are linearly interpolated between their populated
//! neighbours.

use chrono::{DateTime, Duration, Utc};
use itertools::Itertools;

use crate::domain::TimeSample;

/// Samples on a strictly increasing, uniformly spaced time grid
#[derive(Debug, Clone, PartialEq)]
pub struct ResampledSeries<T> {
    interval: Duration,
    samples: Vec<T>,
}

impl<T> ResampledSeries<T> {
    pub fn empty(interval: Duration) -> Self {
        Self {
            interval,
            samples: Vec::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn samples(&self) -> &[T] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn into_samples(self) -> Vec<T> {
        self.samples
    }
}

/// Resample an irregular series onto a grid of `interval` spacing.
///
/// Input order and duplicate timestamps do not matter. An empty input or a
/// non-positive interval yields an empty series.
pub fn resample<T: TimeSample>(series: &[T], interval: Duration) -> ResampledSeries<T> {
    let step_ms = interval.num_milliseconds();
    if series.is_empty() || step_ms <= 0 {
        return ResampledSeries::empty(interval);
    }

    let mut sorted: Vec<&T> = series.iter().collect();
    sorted.sort_by_key(|s| s.time());

    let chunks = sorted.iter().chunk_by(|s| bucket_start_ms(s.time(), step_ms));
    let mut buckets: Vec<(i64, Vec<f64>)> = Vec::new();
    for (start, group) in &chunks {
        buckets.push((start, bucket_mean(group.map(|s| s.values()), T::FIELDS.len())));
    }

    let (Some(&(first, _)), Some(&(last, _))) = (buckets.first(), buckets.last()) else {
        return ResampledSeries::empty(interval);
    };

    let slots = usize::try_from((last - first) / step_ms).unwrap_or(0) + 1;
    let mut grid: Vec<Option<Vec<f64>>> = vec![None; slots];
    for (start, values) in buckets {
        if let Ok(idx) = usize::try_from((start - first) / step_ms) {
            grid[idx] = Some(values);
        }
    }

    let filled = interpolate_gaps(grid, T::FIELDS.len());
    let samples = filled
        .into_iter()
        .enumerate()
        .filter_map(|(idx, values)| {
            let ms = first + step_ms * i64::try_from(idx).ok()?;
            DateTime::<Utc>::from_timestamp_millis(ms).map(|t| T::from_values(t, &values))
        })
        .collect();

    ResampledSeries { interval, samples }
}

fn bucket_start_ms(time: DateTime<Utc>, step_ms: i64) -> i64 {
    let ms = time.timestamp_millis();
    ms - ms.rem_euclid(step_ms)
}

fn bucket_mean<I>(rows: I, width: usize) -> Vec<f64>
where
    I: Iterator<Item = Vec<f64>>,
{
    let mut sums = vec![0.0; width];
    let mut count = 0usize;
    for row in rows {
        for (sum, v) in sums.iter_mut().zip(row) {
            *sum += v;
        }
        count += 1;
    }
    let n = count.max(1) as f64;
    sums.into_iter().map(|s| s / n).collect()
}

/// Fill interior `None` slots linearly between the nearest populated slots.
///
/// The first and last slots are always populated because the grid spans
/// exactly the populated buckets.
fn interpolate_gaps(grid: Vec<Option<Vec<f64>>>, width: usize) -> Vec<Vec<f64>> {
    let known: Vec<usize> = grid
        .iter()
        .enumerate()
        .filter_map(|(i, slot)| slot.as_ref().map(|_| i))
        .collect();

    let mut out: Vec<Vec<f64>> = grid
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| vec![0.0; width]))
        .collect();

    for (&lo, &hi) in known.iter().tuple_windows() {
        if hi - lo < 2 {
            continue;
        }
        let span = (hi - lo) as f64;
        for k in lo + 1..hi {
            let frac = (k - lo) as f64 / span;
            let values = (0..width)
                .map(|f| lerp(out[lo][f], out[hi][f], frac))
                .collect();
            out[k] = values;
        }
    }
    out
}

fn lerp(a: f64, b: f64, frac: f64) -> f64 {
    let v = a + (b - a) * frac;
    // rounding must not push the value past either neighbour
    if a <= b {
        v.clamp(a, b)
    } else if b <= a {
        v.clamp(b, a)
    } else {
        v
    }
}
