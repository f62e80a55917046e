//! Persistence of the last successful tracking query.

use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::models::LastUsedQuery;

pub trait LastUsedStore: Send + Sync {
    fn load(&self) -> Result<Option<LastUsedQuery>>;
    fn save(&self, query: &LastUsedQuery) -> Result<()>;
}

/// Stores the query as JSON in a single file, overwritten on every save.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default path: `~/.local/state/resi-tracker/last_used.json`.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("resi-tracker")?;
        Ok(xdg_dirs.get_state_home().join("last_used.json"))
    }
}

impl LastUsedStore for FileStore {
    fn load(&self) -> Result<Option<LastUsedQuery>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("read last used query: {}", self.path.display()));
            }
        };
        let query = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse last used query: {}", self.path.display()))?;
        Ok(Some(query))
    }

    fn save(&self, query: &LastUsedQuery) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(query).context("serialize last used query")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("write last used query: {}", self.path.display()))?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    last: Mutex<Option<LastUsedQuery>>,
}

impl LastUsedStore for MemoryStore {
    fn load(&self) -> Result<Option<LastUsedQuery>> {
        let last = self.last.lock().map_err(|_| anyhow!("last used lock poisoned"))?;
        Ok(last.clone())
    }

    fn save(&self, query: &LastUsedQuery) -> Result<()> {
        let mut last = self.last.lock().map_err(|_| anyhow!("last used lock poisoned"))?;
        *last = Some(query.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(awb: &str, courier: &str) -> LastUsedQuery {
        LastUsedQuery {
            awb: awb.to_string(),
            courier: courier.to_string(),
        }
    }

    #[test]
    fn default_path_names_app_dir_once() {
        let path = FileStore::default_path().unwrap();
        assert!(path.ends_with("resi-tracker/last_used.json"));
        let app_dirs = path
            .components()
            .filter(|c| c.as_os_str() == "resi-tracker")
            .count();
        assert_eq!(app_dirs, 1);
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_keeps_only_latest_query() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("last_used.json"));

        store.save(&query("JX1", "jne")).unwrap();
        store.save(&query("SPX2", "spx")).unwrap();

        assert_eq!(store.load().unwrap(), Some(query("SPX2", "spx")));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_used.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(FileStore::new(path).load().is_err());
    }

    #[test]
    fn memory_store_overwrites() {
        let store = MemoryStore::default();
        assert!(store.load().unwrap().is_none());
        store.save(&query("1", "pos")).unwrap();
        store.save(&query("2", "tiki")).unwrap();
        assert_eq!(store.load().unwrap(), Some(query("2", "tiki")));
    }
}
