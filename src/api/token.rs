//! Persisted access token storage
//!
//! The console keeps a single bearer token under the well-known
//! `access_token` key. It is written on login, read before every request and
//! never cleared automatically; callers decide what a 401 means.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

use super::errors::{ApiError, ApiResult};

/// Storage key for the bearer token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Somewhere a bearer token can be persisted between runs
pub trait TokenStore: Send + Sync + std::fmt::Debug {
    fn load(&self) -> ApiResult<Option<String>>;
    fn save(&self, token: &str) -> ApiResult<()>;
    fn clear(&self) -> ApiResult<()>;
}

/// JSON file token store, e.g. `{"access_token": "..."}`
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> ApiResult<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> ApiResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> ApiResult<Option<String>> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(ACCESS_TOKEN_KEY)
            .filter(|token| !token.is_empty())
            .cloned())
    }

    fn save(&self, token: &str) -> ApiResult<()> {
        let mut entries = self.read_entries()?;
        entries.insert(ACCESS_TOKEN_KEY.to_string(), token.to_string());
        self.write_entries(&entries)?;
        debug!("Stored access token in {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> ApiResult<()> {
        let mut entries = self.read_entries()?;
        if entries.remove(ACCESS_TOKEN_KEY).is_some() {
            self.write_entries(&entries)?;
            debug!("Cleared access token from {}", self.path.display());
        }
        Ok(())
    }
}

/// In-memory token store for tests and one-shot sessions
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> ApiResult<Option<String>> {
        self.token
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| ApiError::Payload("token store lock poisoned".to_string()))
    }

    fn save(&self, token: &str) -> ApiResult<()> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| ApiError::Payload("token store lock poisoned".to_string()))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> ApiResult<()> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| ApiError::Payload("token store lock poisoned".to_string()))?;
        *guard = None;
        Ok(())
    }
}
