use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

const APP_ID_FILE: &str = "app_id.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredAppId {
    app_id: String,
}

/// The one identifier the client persists: the vendor SDK app id
#[derive(Clone, Debug)]
pub struct AppIdStore {
    base_path: PathBuf,
}

impl AppIdStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_path
    }

    fn file_path(&self) -> PathBuf {
        self.base_path.join(APP_ID_FILE)
    }

    /// Stored app id, or `None` when nothing (or an empty id) was saved
    pub fn load(&self) -> Result<Option<String>, StoreError> {
        let path = self.file_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)?;
        let stored: StoredAppId = serde_json::from_str(&contents)?;
        Ok(Some(stored.app_id).filter(|id| !id.is_empty()))
    }

    pub fn save(&self, app_id: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base_path)?;
        let json = serde_json::to_string_pretty(&StoredAppId {
            app_id: app_id.to_string(),
        })?;
        fs::write(self.file_path(), json)?;
        log::debug!("Stored app id in {}", self.base_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = AppIdStore::new(dir.path().join("nested"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = AppIdStore::new(dir.path().join("nested"));
        store.save("app-123").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("app-123"));

        store.save("").unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_json_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(APP_ID_FILE), "not json").unwrap();
        let store = AppIdStore::new(dir.path());
        assert!(matches!(store.load(), Err(StoreError::Json(_))));
    }
}
