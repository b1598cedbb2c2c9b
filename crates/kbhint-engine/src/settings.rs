//! Settings store
//!
//! Key-value persistence for per-site hint toggles, with the JSON layout the
//! popup and options pages share:
//!
//! - `siteHints`: `hostname -> hintId -> bool`
//! - `mappings` / `userMappings` (legacy): `hostname -> selector -> ({shortcut, disabled} | string)`

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::HintDescriptor;

pub const SITE_HINTS_KEY: &str = "siteHints";
pub const MAPPINGS_KEY: &str = "mappings";
pub const USER_MAPPINGS_KEY: &str = "userMappings";

/// Top-level stored items
pub type Items = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable")]
    Unavailable,
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored settings are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistent key-value store
pub trait SettingsStore {
    /// Items for the requested keys; absent keys are left out
    fn get(&self, keys: &[&str]) -> Result<Items, StoreError>;

    /// Merge items into the store
    fn set(&mut self, items: Items) -> Result<(), StoreError>;

    /// Keys whose values changed since the last call
    fn take_changes(&mut self) -> Vec<String>;
}

/// `get` that resolves failures to an empty mapping
pub fn get_or_empty<S: SettingsStore + ?Sized>(store: &S, keys: &[&str]) -> Items {
    store.get(keys).unwrap_or_else(|e| {
        tracing::warn!("settings read failed, using defaults: {}", e);
        Items::new()
    })
}

/// `set` that swallows failures
pub fn set_or_log<S: SettingsStore + ?Sized>(store: &mut S, items: Items) {
    if let Err(e) = store.set(items) {
        tracing::warn!("settings write failed: {}", e);
    }
}

fn merge_into(target: &mut Items, changes: &mut Vec<String>, items: Items) {
    for (key, value) in items {
        if target.get(&key) != Some(&value) {
            if !changes.contains(&key) {
                changes.push(key.clone());
            }
            target.insert(key, value);
        }
    }
}

fn select(items: &Items, keys: &[&str]) -> Items {
    keys.iter()
        .filter_map(|&k| items.get(k).map(|v| (k.to_string(), v.clone())))
        .collect()
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Items,
    changes: Vec<String>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Items) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// Make every read and write fail
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    pub fn items(&self) -> &Items {
        &self.items
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, keys: &[&str]) -> Result<Items, StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable);
        }
        Ok(select(&self.items, keys))
    }

    fn set(&mut self, items: Items) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable);
        }
        merge_into(&mut self.items, &mut self.changes, items);
        Ok(())
    }

    fn take_changes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.changes)
    }
}

/// Store persisted as one pretty-printed JSON object on disk
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    items: Items,
    changes: Vec<String>,
}

impl JsonFileStore {
    /// Open the file; a missing or empty file starts an empty store
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let items = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => Items::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Items::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!("opened settings {} ({} keys)", path.display(), items.len());
        Ok(Self {
            path,
            items,
            changes: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.items)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, keys: &[&str]) -> Result<Items, StoreError> {
        Ok(select(&self.items, keys))
    }

    fn set(&mut self, items: Items) -> Result<(), StoreError> {
        merge_into(&mut self.items, &mut self.changes, items);
        self.save()
    }

    fn take_changes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.changes)
    }
}

/// Stored toggles for one hostname
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteHints {
    toggles: Map<String, Value>,
}

impl SiteHints {
    /// Read `siteHints[hostname]`; anything malformed reads as empty
    pub fn load<S: SettingsStore + ?Sized>(store: &S, hostname: &str) -> Self {
        let mut items = get_or_empty(store, &[SITE_HINTS_KEY]);
        let toggles = match items.remove(SITE_HINTS_KEY) {
            Some(Value::Object(mut hosts)) => match hosts.remove(hostname) {
                Some(Value::Object(toggles)) => toggles,
                _ => Map::new(),
            },
            _ => Map::new(),
        };
        Self { toggles }
    }

    /// Raw stored value for a hint
    pub fn stored(&self, hint_id: &str) -> Option<&Value> {
        self.toggles.get(hint_id)
    }

    /// Effective enabled state for a hint
    pub fn enabled(&self, hint: &HintDescriptor) -> bool {
        hint.resolve_enabled(self.stored(&hint.id))
    }

    pub fn is_empty(&self) -> bool {
        self.toggles.is_empty()
    }
}

/// Persist one toggle, keeping every other host and hint as stored
pub fn set_hint_enabled<S: SettingsStore + ?Sized>(
    store: &mut S,
    hostname: &str,
    hint_id: &str,
    enabled: bool,
) -> Result<(), StoreError> {
    let mut items = store.get(&[SITE_HINTS_KEY])?;
    let mut hosts = match items.remove(SITE_HINTS_KEY) {
        Some(Value::Object(hosts)) => hosts,
        _ => Map::new(),
    };
    let mut toggles = match hosts.remove(hostname) {
        Some(Value::Object(toggles)) => toggles,
        _ => Map::new(),
    };
    toggles.insert(hint_id.to_string(), Value::Bool(enabled));
    hosts.insert(hostname.to_string(), Value::Object(toggles));

    let mut update = Items::new();
    update.insert(SITE_HINTS_KEY.to_string(), Value::Object(hosts));
    store.set(update)
}

/// JavaScript truthiness of a stored value
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Merge default selector mappings with legacy user mappings.
///
/// String values become `{shortcut, disabled: false}`; object values keep
/// their `shortcut` and coerce `disabled` to a bool; anything else is dropped.
pub fn merge_mappings(defaults: &Items, user: &Items) -> Items {
    let mut out = Items::new();
    let hosts = defaults.keys().chain(user.keys());

    for host in hosts {
        if out.contains_key(host) {
            continue;
        }
        let mut merged = match defaults.get(host) {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };
        if let Some(Value::Object(selectors)) = user.get(host) {
            for (selector, value) in selectors {
                let entry = match value {
                    Value::String(shortcut) => {
                        let mut entry = Map::new();
                        entry.insert("shortcut".into(), Value::String(shortcut.clone()));
                        entry.insert("disabled".into(), Value::Bool(false));
                        entry
                    }
                    Value::Object(obj) => {
                        let mut entry = Map::new();
                        if let Some(shortcut) = obj.get("shortcut") {
                            entry.insert("shortcut".into(), shortcut.clone());
                        }
                        let disabled = obj.get("disabled").is_some_and(truthy);
                        entry.insert("disabled".into(), Value::Bool(disabled));
                        entry
                    }
                    _ => continue,
                };
                merged.insert(selector.clone(), Value::Object(entry));
            }
        }
        out.insert(host.clone(), Value::Object(merged));
    }
    out
}

/// Install-time migration of the legacy `userMappings` key.
///
/// Only runs when `mappings` is absent. Returns whether anything was written.
pub fn migrate_legacy_settings<S: SettingsStore + ?Sized>(
    store: &mut S,
    defaults: &Items,
) -> Result<bool, StoreError> {
    let existing = store.get(&[MAPPINGS_KEY, USER_MAPPINGS_KEY])?;
    if existing.contains_key(MAPPINGS_KEY) {
        return Ok(false);
    }

    let mappings = match existing.get(USER_MAPPINGS_KEY) {
        Some(Value::Object(user)) => merge_mappings(defaults, user),
        Some(other) if truthy(other) => merge_mappings(defaults, &Items::new()),
        _ => defaults.clone(),
    };
    tracing::debug!("migrating legacy settings: {} host(s)", mappings.len());

    let mut update = Items::new();
    update.insert(MAPPINGS_KEY.to_string(), Value::Object(mappings));
    store.set(update)?;
    Ok(true)
}
