use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use super::Power;

pub type SystemId = i64;

/// A monitored photovoltaic installation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PvSystem {
    pub id: SystemId,
    pub name: String,
    /// Rated DC capacity under standard test conditions (kW)
    pub capacity_kw: f64,
    pub inverter_type: String,
    /// Stored counts are unchecked and may be negative; `check_scorable` rejects values <= 0
    pub number_of_panels: i32,
    pub technology: String,
    pub year_of_installation: i32,
}

/// Reasons an installation cannot be used to normalize production
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InstallationError {
    #[error("rated capacity must be a positive number of kW, got {0}")]
    InvalidCapacity(f64),

    #[error("panel count must be greater than zero, got {0}")]
    NoPanels(i32),
}

impl PvSystem {
    /// Nameplate power under standard test conditions
    pub fn rated_power(&self) -> Power {
        Power::kilowatts(self.capacity_kw)
    }

    /// Check that capacity and panel count can serve as a normalization base
    pub fn check_scorable(&self) -> Result<(), InstallationError> {
        if !(self.capacity_kw.is_finite() && self.capacity_kw > 0.0) {
            return Err(InstallationError::InvalidCapacity(self.capacity_kw));
        }
        if self.number_of_panels <= 0 {
            return Err(InstallationError::NoPanels(self.number_of_panels));
        }
        Ok(())
    }

    /// Combined nameplate of every panel: `capacity_kw * 1000 * panel_count`
    pub fn normalization_base_w(&self) -> Result<f64, InstallationError> {
        self.check_scorable()?;
        Ok(self.rated_power().as_watts() * f64::from(self.number_of_panels))
    }
}

/// Payload for registering a new installation; the store assigns the id
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewPvSystem {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(range(exclusive_min = 0.0))]
    pub capacity_kw: f64,
    #[validate(length(max = 100))]
    pub inverter_type: String,
    #[validate(range(min = 1))]
    pub number_of_panels: i32,
    #[validate(length(max = 100))]
    pub technology: String,
    #[validate(range(min = 1950, max = 2100))]
    pub year_of_installation: i32,
}

impl NewPvSystem {
    pub fn with_id(self, id: SystemId) -> PvSystem {
        PvSystem {
            id,
            name: self.name,
            capacity_kw: self.capacity_kw,
            inverter_type: self.inverter_type,
            number_of_panels: self.number_of_panels,
            technology: self.technology,
            year_of_installation: self.year_of_installation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn system(capacity_kw: f64, number_of_panels: i32) -> PvSystem {
        PvSystem {
            id: 1,
            name: "System 1".to_string(),
            capacity_kw,
            inverter_type: "Inverter Type 1".to_string(),
            number_of_panels,
            technology: "Mono-Si".to_string(),
            year_of_installation: 2015,
        }
    }

    #[test]
    fn test_normalization_base() {
        let base = system(10.0, 40).normalization_base_w().unwrap();
        assert_eq!(base, 400_000.0);
    }

    #[rstest]
    #[case(0.0, 40, InstallationError::InvalidCapacity(0.0))]
    #[case(-2.0, 40, InstallationError::InvalidCapacity(-2.0))]
    #[case(10.0, 0, InstallationError::NoPanels(0))]
    #[case(10.0, -3, InstallationError::NoPanels(-3))]
    fn test_unscorable_installations(
        #[case] capacity_kw: f64,
        #[case] panels: i32,
        #[case] expected: InstallationError,
    ) {
        assert_eq!(system(capacity_kw, panels).check_scorable(), Err(expected));
    }

    #[test]
    fn test_nan_capacity_is_rejected() {
        assert!(matches!(
            system(f64::NAN, 10).normalization_base_w(),
            Err(InstallationError::InvalidCapacity(_))
        ));
    }

    #[test]
    fn test_new_system_validation() {
        let valid = NewPvSystem {
            name: "Roof".to_string(),
            capacity_kw: 5.25,
            inverter_type: "Inverter Type 2".to_string(),
            number_of_panels: 10,
            technology: "Half-cut Mono-Si".to_string(),
            year_of_installation: 2021,
        };
        assert!(valid.validate().is_ok());

        let zero_capacity = NewPvSystem {
            capacity_kw: 0.0,
            ..valid.clone()
        };
        assert!(zero_capacity.validate().is_err());

        let no_panels = NewPvSystem {
            number_of_panels: 0,
            ..valid
        };
        assert!(no_panels.validate().is_err());
    }
}
