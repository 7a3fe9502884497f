//! JSON file storage backend.
//!
//! One `<key>.json` file per key under a data directory. Writes go to a
//! temporary file in the same directory and are renamed over the target, so a
//! failed write leaves the previous snapshot readable.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;

use readiness_core::error::StorageError;
use readiness_core::traits::StateStorage;

pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::Write {
                key: key.to_string(),
                message: "keys may only contain letters, digits, '-', '_' and '.'".into(),
            });
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl StateStorage for JsonFileStorage {
    fn name(&self) -> &str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key).map_err(|e| StorageError::Read {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read {
                key: key.to_string(),
                message: format!("{}: {e}", path.display()),
            }),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let dir = self.dir.clone();
        let value = value.to_string();
        let write_err = |message: String| StorageError::Write {
            key: key.to_string(),
            message,
        };

        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            std::fs::create_dir_all(&dir)?;
            let mut tmp = NamedTempFile::new_in(&dir)?;
            tmp.write_all(value.as_bytes())?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| write_err(format!("writer task failed: {e}")))?
        .map_err(|e| write_err(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use readiness_core::model::{CatalogLayout, CompanyProfile};
    use readiness_core::persistence::{PersistenceAdapter, DEFAULT_NAMESPACE};
    use readiness_core::store::AnswerStore;

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());
        assert!(storage.get("absent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn write_replaces_content_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nested"));

        storage.set("k", "first").await.unwrap();
        storage.set("k", "second").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("second"));

        let files: Vec<_> = std::fs::read_dir(storage.dir()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());
        assert!(storage.set("../escape", "x").await.is_err());
        assert!(storage.set("", "x").await.is_err());
        assert!(storage.get("a/b").await.is_err());
    }

    #[tokio::test]
    async fn assessment_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CatalogLayout::uniform(5, 5);

        let mut store = AnswerStore::open(
            layout.clone(),
            PersistenceAdapter::spawn(Arc::new(JsonFileStorage::new(dir.path())), DEFAULT_NAMESPACE),
        )
        .await;
        store.set_company_profile(CompanyProfile {
            company_name: "Acme".into(),
            industry_sector: "energy".into(),
            company_size: "1000-4999".into(),
            grc_maturity: "initial".into(),
            email: "risk@acme.example".into(),
            phone: None,
        });
        store.set_current_step(1);
        store.set_section_answer(1, 0, "Quarterly", 2);
        store.commit_watcher().confirm(store.revision()).await.unwrap();

        assert!(dir.path().join("readinow-assessment.json").exists());

        let reopened = AnswerStore::open(
            layout,
            PersistenceAdapter::spawn(Arc::new(JsonFileStorage::new(dir.path())), DEFAULT_NAMESPACE),
        )
        .await;
        assert_eq!(reopened.current_step(), 1);
        assert_eq!(reopened.section_score(1), 2);
        assert_eq!(reopened.company_profile().map(|p| p.company_name.as_str()), Some("Acme"));
    }
}
