use std::collections::BTreeMap;

use crate::domain::{PowerEstimate, SystemScore};

/// Replace NaN and ±infinity with 0
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Values that must leave the engine JSON-representable.
///
/// `sanitize` is idempotent: every numeric field is finite afterwards.
pub trait Sanitize: Sized {
    fn numeric_fields_mut(&mut self) -> Vec<&mut f64>;

    fn sanitize(mut self) -> Self {
        let mut replaced = 0usize;
        for field in self.numeric_fields_mut() {
            if !field.is_finite() {
                *field = 0.0;
                replaced += 1;
            }
        }
        if replaced > 0 {
            tracing::debug!(replaced, "non-finite values replaced with zero");
        }
        self
    }
}

impl<K: Ord> Sanitize for BTreeMap<K, f64> {
    fn numeric_fields_mut(&mut self) -> Vec<&mut f64> {
        self.values_mut().collect()
    }
}

impl Sanitize for PowerEstimate {
    fn numeric_fields_mut(&mut self) -> Vec<&mut f64> {
        vec![
            &mut self.estimated_power_w,
            &mut self.measured_power_w,
            &mut self.t1,
            &mut self.t2,
            &mut self.u_dc,
            &mut self.gti,
            &mut self.air_temp,
        ]
    }
}

impl Sanitize for SystemScore {
    fn numeric_fields_mut(&mut self) -> Vec<&mut f64> {
        vec![&mut self.score, &mut self.capacity_kw, &mut self.total_power_w]
    }
}
