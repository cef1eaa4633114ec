//! Settings Storage using a JSON file

use bridge_traits::{
    error::{BridgeError, Result},
    storage::SettingsStore,
};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// JSON-backed settings store implementation
///
/// Keeps every setting in one flat JSON object:
/// - Flags are stored as JSON booleans
/// - Changes are held in memory until [`flush`](SettingsStore::flush)
/// - A missing file reads as an empty store
pub struct JsonSettingsStore {
    path: Option<PathBuf>,
    values: Map<String, Value>,
    dirty: bool,
}

impl JsonSettingsStore {
    /// Open the settings file at `path`, creating an empty store if absent
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let text = fs::read_to_string(&path).map_err(BridgeError::Io)?;
            match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    return Err(BridgeError::OperationFailed(format!(
                        "Settings file {} is not a JSON object",
                        path.display()
                    )))
                }
                Err(e) => {
                    return Err(BridgeError::OperationFailed(format!("Parse error: {}", e)))
                }
            }
        } else {
            Map::new()
        };

        debug!(path = ?path, keys = values.len(), "Opened settings store");

        Ok(Self {
            path: Some(path),
            values,
            dirty: false,
        })
    }

    /// Create an in-memory settings store (for testing)
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: Map::new(),
            dirty: false,
        }
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn set_value(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        self.dirty = true;
        debug!(key = key, "Stored setting");
        Ok(())
    }

    fn type_mismatch(key: &str, expected: &str, actual: &Value) -> BridgeError {
        error!(key = key, expected = expected, actual = %actual, "Type mismatch");
        BridgeError::OperationFailed(format!(
            "Type mismatch for {}: expected {}, got {}",
            key, expected, actual
        ))
    }
}

impl SettingsStore for JsonSettingsStore {
    fn set_bool(&mut self, key: &str, value: bool) -> Result<()> {
        self.set_value(key, Value::Bool(value))
    }

    fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.values.get(key) {
            Some(Value::Bool(b)) => Ok(Some(*b)),
            // Hand-edited files often carry 0/1 or "true"/"false"
            Some(Value::Number(n)) => Ok(Some(n.as_i64().unwrap_or(0) != 0)),
            Some(Value::String(s)) => Ok(Some(s.parse().map_err(|e| {
                BridgeError::OperationFailed(format!("Parse error: {}", e))
            })?)),
            Some(other) => Err(Self::type_mismatch(key, "bool", other)),
            None => Ok(None),
        }
    }

    fn flush(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            self.dirty = false;
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(BridgeError::Io)?;
            }
        }

        let text = serde_json::to_string_pretty(&self.values)
            .map_err(|e| BridgeError::OperationFailed(format!("Serialize error: {}", e)))?;
        fs::write(path, text).map_err(BridgeError::Io)?;
        self.dirty = false;

        debug!(path = ?path, keys = self.values.len(), "Flushed settings");
        Ok(())
    }
}
