use thiserror::Error;

use crate::domain::{InstallationError, SystemId};

/// Failures surfaced by the performance engine.
///
/// Missing data is not an error; see `PowerSeries::NoData`.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("system {0} not found")]
    NotFound(SystemId),

    #[error("system {system_id} cannot be scored: {source}")]
    Configuration {
        system_id: SystemId,
        #[source]
        source: InstallationError,
    },

    #[error("record store failure: {0}")]
    Store(String),
}

impl From<anyhow::Error> for AnalysisError {
    fn from(error: anyhow::Error) -> Self {
        AnalysisError::Store(format!("{error:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(AnalysisError::NotFound(4).to_string(), "system 4 not found");

        let err = AnalysisError::Configuration {
            system_id: 2,
            source: InstallationError::NoPanels(0),
        };
        assert_eq!(
            err.to_string(),
            "system 2 cannot be scored: panel count must be greater than zero, got 0"
        );
    }

    #[test]
    fn test_store_error_keeps_context() {
        let err: AnalysisError = anyhow::anyhow!("connection reset")
            .context("fetching electrical readings")
            .into();
        assert_eq!(
            err.to_string(),
            "record store failure: fetching electrical readings: connection reset"
        );
    }
}
