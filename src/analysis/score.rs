use super::sanitize::{finite_or_zero, Sanitize};
use crate::domain::{InstallationError, PowerEstimate, PvSystem, SystemScore};

/// Multiplier applied to the normalized production before clamping
pub const SCORE_SCALE: f64 = 20.0;
pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 20.0;

/// Sum of the estimates for rows that saw sunlight (`gti > 0`)
pub fn total_power_w(estimates: &[PowerEstimate]) -> f64 {
    estimates
        .iter()
        .filter(|e| e.gti > 0.0)
        .map(|e| finite_or_zero(e.estimated_power_w))
        .sum()
}

/// `total / (capacity_kw * 1000 * panel_count)`.
///
/// Not divided by the observation window, so scores only compare across
/// systems observed over similar spans.
pub fn normalize(total_power_w: f64, system: &PvSystem) -> Result<f64, InstallationError> {
    Ok(total_power_w / system.normalization_base_w()?)
}

/// Scale and clamp to `[SCORE_MIN, SCORE_MAX]`; non-finite input scores 0
pub fn bounded_score(normalized: f64) -> f64 {
    finite_or_zero(normalized * SCORE_SCALE).clamp(SCORE_MIN, SCORE_MAX)
}

/// Score one system from its estimate series
pub fn score_system(
    system: &PvSystem,
    estimates: &[PowerEstimate],
) -> Result<SystemScore, InstallationError> {
    let total = total_power_w(estimates);
    let normalized = normalize(total, system)?;
    Ok(SystemScore {
        system_id: system.id,
        name: system.name.clone(),
        score: bounded_score(normalized),
        capacity_kw: system.capacity_kw,
        number_of_panels: system.number_of_panels,
        total_power_w: total,
    }
    .sanitize())
}
