use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub const DEVICE_ID_KEY: &str = "user_id";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store content is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store file {0} is still empty after writing")]
    WriteNotPersisted(PathBuf),
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Flat JSON object on disk. A missing file reads as an empty store.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(data) if data.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, json)?;

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() || (content.trim() == "{}" && !entries.is_empty()) {
            return Err(StoreError::WriteNotPersisted(self.path.clone()));
        }
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Opaque per-device identifier, created once and reused on every later run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentifier(String);

impl DeviceIdentifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn get_or_create(store: &dyn KeyValueStore, key: &str) -> Result<Self, StoreError> {
        if let Some(existing) = store.get(key)?.filter(|v| !v.is_empty()) {
            return Ok(Self(existing));
        }

        let generated = Uuid::new_v4().to_string();
        store.set(key, &generated)?;
        info!(key, "created device identifier");
        Ok(Self(generated))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Falls back to an in-memory identifier when the file store is unusable.
pub fn load_device_identifier(path: &str) -> DeviceIdentifier {
    let store = JsonFileStore::new(path);
    DeviceIdentifier::get_or_create(&store, DEVICE_ID_KEY).unwrap_or_else(|e| {
        warn!("Device identity store {path} unusable: {e}, using a session identifier");
        DeviceIdentifier(Uuid::new_v4().to_string())
    })
}
