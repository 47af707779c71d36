//! Seeding and CSV import into the record store.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument};

use crate::config::DataConfig;
use crate::domain::{PvSystem, SystemId};
use crate::repo::TelemetryStore;

pub mod readers;

pub use readers::{read_electrical, read_meteorological};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: invalid timestamp {value:?}: {source}")]
    Timestamp {
        line: u64,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("line {line}: timestamp {value:?} does not map to a single instant")]
    AmbiguousTime { line: u64, value: String },

    #[error("electrical data references unknown system {0}")]
    UnknownSystem(SystemId),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// What an import run added to the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub systems_created: usize,
    pub meteorological_rows: usize,
    pub electrical_rows: usize,
}

/// The three monitored installations the data exports belong to
pub fn reference_systems() -> Vec<PvSystem> {
    vec![
        PvSystem {
            id: 1,
            name: "System 1".to_string(),
            capacity_kw: 16.56,
            inverter_type: "Inverter Type 1".to_string(),
            number_of_panels: 69,
            technology: "Mono-Si".to_string(),
            year_of_installation: 2015,
        },
        PvSystem {
            id: 2,
            name: "System 2".to_string(),
            capacity_kw: 5.25,
            inverter_type: "Inverter Type 2".to_string(),
            number_of_panels: 10,
            technology: "Half-cut Mono-Si".to_string(),
            year_of_installation: 2021,
        },
        PvSystem {
            id: 3,
            name: "System 3".to_string(),
            capacity_kw: 2.34,
            inverter_type: "Inverter Type 3".to_string(),
            number_of_panels: 7,
            technology: "Half-cut Mono-Si".to_string(),
            year_of_installation: 2021,
        },
    ]
}

fn open(path: &Path) -> Result<BufReader<File>, IngestError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Seed reference installations and load the configured CSV files.
///
/// Rows already in the store are skipped, so a repeated run adds nothing.
#[instrument(skip_all)]
pub async fn import(
    store: &dyn TelemetryStore,
    cfg: &DataConfig,
) -> Result<ImportSummary, IngestError> {
    let offset = cfg.timezone_offset()?;
    let mut summary = ImportSummary::default();

    if cfg.seed_reference_systems {
        for system in reference_systems() {
            if store.ensure_system(system).await? {
                summary.systems_created += 1;
            }
        }
    }

    if let Some(path) = &cfg.meteorological_csv {
        let rows = read_meteorological(open(path)?, offset)?;
        summary.meteorological_rows += store.insert_meteorological(rows).await?;
        info!(path = %path.display(), "meteorological data imported");
    }

    for file in &cfg.electrical_csv {
        if store.get_system(file.system_id).await?.is_none() {
            return Err(IngestError::UnknownSystem(file.system_id));
        }
        let rows = read_electrical(open(&file.path)?, file.system_id, offset)?;
        summary.electrical_rows += store.insert_electrical(rows).await?;
        info!(system_id = file.system_id, path = %file.path.display(), "electrical data imported");
    }

    info!(
        systems_created = summary.systems_created,
        meteorological_rows = summary.meteorological_rows,
        electrical_rows = summary.electrical_rows,
        "import complete"
    );
    Ok(summary)
}
