//! Loads config, catalog and the saved assessment for one command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use readiness_core::model::Catalog;
use readiness_core::parser::{parse_catalog, parse_catalog_str};
use readiness_core::persistence::PersistenceAdapter;
use readiness_core::section::SectionController;
use readiness_core::store::AnswerStore;
use readiness_services::config::load_config_from;
use readiness_services::{JsonFileStorage, ReadinessConfig};

/// The reference catalog, used when the config names none.
pub const BUNDLED_CATALOG: &str = include_str!("../../../catalog/provision29.toml");

pub struct Session {
    pub config: ReadinessConfig,
    pub catalog: Catalog,
    pub store: AnswerStore,
}

impl Session {
    pub async fn open(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config_from(config_path)?;
        let catalog = load_catalog(config.catalog.as_deref())?;

        let storage = Arc::new(JsonFileStorage::new(&config.data_dir));
        let adapter = PersistenceAdapter::spawn(storage, config.namespace.clone())
            .with_commit_timeout(config.timing.commit_timeout());
        let store = AnswerStore::open(catalog.layout(), adapter).await;

        Ok(Self {
            config,
            catalog,
            store,
        })
    }

    /// Controller for the section at the current step, if any.
    pub fn controller(&self) -> Option<SectionController> {
        SectionController::open(
            &self.catalog,
            self.store.current_step(),
            &self.store,
            self.config.timing.section_timing(),
        )
    }

    /// Human label for a step.
    pub fn step_label(&self, step: usize) -> String {
        match self.catalog.section_at_step(step) {
            Some(section) => format!(
                "Section {step} of {}: {}",
                self.catalog.section_count(),
                section.title
            ),
            None => "Company profile".to_string(),
        }
    }

    /// Wait for pending writes, then stop the writer.
    pub async fn close(self) -> Result<()> {
        let Some(persistence) = self.store.into_persistence() else {
            return Ok(());
        };
        let flushed = persistence.flush().await;
        persistence.close().await;
        flushed.map_err(|e| anyhow::anyhow!("progress could not be saved: {e}"))
    }
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(path) => parse_catalog(path),
        None => parse_catalog_str(BUNDLED_CATALOG, &PathBuf::from("provision29.toml"))
            .context("bundled catalog is invalid"),
    }
}
