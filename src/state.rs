use anyhow::Result;
use std::sync::Arc;

use crate::analysis::PerformanceEngine;
use crate::config::Config;
use crate::ingest;
use crate::repo::{Repositories, TelemetryStore};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub repos: Arc<Repositories>,
    pub engine: Arc<PerformanceEngine>,
}

impl AppState {
    /// Connect the record store and run the configured import
    pub async fn new(cfg: Config) -> Result<Self> {
        cfg.analysis.validate()?;
        let repos = Repositories::new(&cfg).await?;
        ingest::import(repos.store.as_ref(), &cfg.data).await?;
        Ok(Self::assemble(cfg, repos))
    }

    /// State over an existing store, without importing anything
    pub fn with_store(cfg: Config, store: Arc<dyn TelemetryStore>) -> Self {
        Self::assemble(cfg, Repositories::with_store(store))
    }

    fn assemble(cfg: Config, repos: Repositories) -> Self {
        let engine = PerformanceEngine::new(repos.store.clone(), &cfg.analysis);
        Self {
            cfg: Arc::new(cfg),
            repos: Arc::new(repos),
            engine: Arc::new(engine),
        }
    }

    pub fn store(&self) -> &dyn TelemetryStore {
        self.repos.store.as_ref()
    }
}
