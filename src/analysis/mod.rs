//! Performance analysis: resampling, alignment, power estimation, sanitizing
//! and scoring.

pub mod align;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod resample;
pub mod sanitize;
pub mod score;

pub use align::{align, AlignedRow};
pub use engine::PerformanceEngine;
pub use error::AnalysisError;
pub use estimator::{
    CellTemperatureModel, FaimanCellTemperature, PowerEstimator, SapmCellTemperature,
    ThermalModel, DEFAULT_TEMPERATURE_COEFFICIENT,
};
pub use resample::{resample, ResampledSeries};
pub use sanitize::{finite_or_zero, Sanitize};
pub use score::{SCORE_MAX, SCORE_MIN, SCORE_SCALE};

/// Grid spacing used when none is configured
pub const DEFAULT_RESAMPLE_INTERVAL_MINUTES: i64 = 5;
