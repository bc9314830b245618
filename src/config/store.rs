//! Key/value configuration stores
//!
//! The filter engine never touches storage itself; callers hand it whatever
//! a [`ConfigStore`] returned and write back what it produced.

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::config::{APP_DIR, FILENAME, PATH_ENV};

pub trait ConfigStore {
    /// `None` when the key was never set
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&mut self, key: &str, value: Value) -> Result<()>;
}

/// In-memory store (tests, dry runs)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Map<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// JSON object file, rewritten in full on every `set`
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonFileStore {
    /// `$TASKBAR_FILTER_CONFIG`, else `<config dir>/taskbar-filter/config.json`
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(PATH_ENV)
            && !path.trim().is_empty()
        {
            return PathBuf::from(path);
        }
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push(FILENAME);
        path
    }

    /// Open a store; a missing file is an empty store
    ///
    /// A file that exists but cannot be parsed is an error. It is left on
    /// disk untouched so the user can fix it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            info!(path = %path.display(), "config file not found, starting with an empty config");
            return Ok(Self {
                path,
                values: Map::new(),
            });
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let values = match serde_json::from_str::<Value>(&contents)
            .with_context(|| format!("Failed to parse JSON from {}", path.display()))?
        {
            Value::Object(values) => values,
            other => bail!(
                "Config {} must contain a JSON object, found {}",
                path.display(),
                crate::filter::schema::json_type_name(&other)
            ),
        };

        debug!(path = %path.display(), keys = values.len(), "loaded config");
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(&self.values)
            .context("Failed to serialize config to JSON")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write config to {}", self.path.display()))?;
        debug!(path = %self.path.display(), "saved config");
        Ok(())
    }
}

impl ConfigStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        self.save()
    }
}
