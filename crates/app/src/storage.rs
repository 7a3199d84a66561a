//! Local key-value persistence (the client's "local storage").
//!
//! Values are opaque strings; callers serialize. The file store keeps one
//! JSON object on disk and rewrites it atomically on every change.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use anyhow::{Context, anyhow};

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}

impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        (**self).remove(key)
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let map = self.inner.read().map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut map = self.inner.write().map_err(|_| anyhow!("memory store lock poisoned"))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let mut map = self.inner.write().map_err(|_| anyhow!("memory store lock poisoned"))?;
        map.remove(key);
        Ok(())
    }
}

/// JSON-file store: `{ "key": "value", ... }`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unparsable storage file is moved before it is replaced.
    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension("json.corrupt")
    }

    fn read_raw(&self) -> anyhow::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(None),
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("failed to read {:?}", self.path)),
        }
    }

    fn parse(&self, raw: &str) -> anyhow::Result<BTreeMap<String, String>> {
        serde_json::from_str(raw)
            .with_context(|| format!("storage file {:?} is not a JSON object of strings", self.path))
    }

    fn read_map(&self) -> anyhow::Result<BTreeMap<String, String>> {
        match self.read_raw()? {
            Some(raw) => self.parse(&raw),
            None => Ok(BTreeMap::new()),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create storage directory at {:?}", parent))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_string_pretty(map).context("failed to serialize storage map")?;
        fs::write(&tmp, body).with_context(|| format!("failed to write {:?}", tmp))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to move {:?} into place", self.path))?;
        Ok(())
    }

    fn modify(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> anyhow::Result<()> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("file store lock poisoned"))?;
        let mut map = match self.read_raw()? {
            None => BTreeMap::new(),
            Some(raw) => match self.parse(&raw) {
                Ok(map) => map,
                // Keep the unparsable file aside instead of blocking every write.
                Err(err) => {
                    let backup = self.backup_path();
                    fs::rename(&self.path, &backup)
                        .with_context(|| format!("failed to move {:?} aside", self.path))?;
                    tracing::warn!(
                        path = ?self.path,
                        backup = ?backup,
                        error = %format!("{err:#}"),
                        "storage file was unreadable; starting fresh"
                    );
                    BTreeMap::new()
                }
            },
        };
        f(&mut map);
        self.write_map(&map)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("file store lock poisoned"))?;
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.modify(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.modify(|map| {
            map.remove(key);
        })
    }
}
