//! Persistent counters (points and currency)
//!
//! [`Counters`] keeps values in memory and writes them through a
//! [`CounterStore`] when asked to persist. Storage failures never lose the
//! in-memory values; they are reported and the counters stay dirty.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use gameshell_core::prelude::*;

use crate::config::{gameshell_dir, CounterSettings};

pub const FATE_POINTS: &str = "fate_points";
pub const FATE_ORE: &str = "fate_ore";

/// Seed values for counters missing from storage
pub const DEFAULT_COUNTERS: &[(&str, u64)] = &[(FATE_POINTS, 520), (FATE_ORE, 6)];

/// Backing storage for counter values
#[cfg_attr(test, mockall::automock)]
pub trait CounterStore: Send {
    fn load(&self) -> Result<BTreeMap<String, u64>>;
    fn save(&self, values: &BTreeMap<String, u64>) -> Result<()>;
}

/// Counters stored as a flat TOML table
#[derive(Debug, Clone)]
pub struct TomlCounterStore {
    path: PathBuf,
}

impl TomlCounterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `.gameshell/<file>` under the project
    pub fn for_project(project_path: &Path, settings: &CounterSettings) -> Self {
        Self::new(gameshell_dir(project_path).join(&settings.file))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CounterStore for TomlCounterStore {
    fn load(&self) -> Result<BTreeMap<String, u64>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read counters from {}", self.path.display()))?;
        toml::from_str(&content).map_err(|e| {
            Error::storage(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    fn save(&self, values: &BTreeMap<String, u64>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).context("Failed to create counter directory")?;
        }
        let content = toml::to_string(values)
            .map_err(|e| Error::storage(format!("Failed to serialize counters: {}", e)))?;

        let temp_path = self.path.with_extension("toml.tmp");
        std::fs::write(&temp_path, content).context("Failed to write counters")?;
        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

/// In-memory counters with write-back persistence
#[derive(Debug)]
pub struct Counters<S> {
    store: S,
    values: BTreeMap<String, u64>,
    dirty: bool,
}

impl<S: CounterStore> Counters<S> {
    /// Load from `store`, filling missing keys from `defaults`.
    ///
    /// Unreadable storage falls back to the defaults.
    pub fn open(store: S, defaults: &[(&str, u64)]) -> Self {
        let mut values = store.load().unwrap_or_else(|e| {
            warn!("Failed to load counters, using defaults: {}", e);
            BTreeMap::new()
        });
        for (key, value) in defaults {
            values.entry((*key).to_string()).or_insert(*value);
        }
        Self {
            store,
            values,
            dirty: false,
        }
    }

    /// Current value; unknown keys read as zero
    pub fn get(&self, key: &str) -> u64 {
        self.values.get(key).copied().unwrap_or(0)
    }

    pub fn set(&mut self, key: &str, value: u64) {
        self.values.insert(key.to_string(), value);
        self.dirty = true;
    }

    /// Add `amount`, treating negative amounts as zero. Returns the new value.
    pub fn add(&mut self, key: &str, amount: i64) -> u64 {
        let amount = u64::try_from(amount).unwrap_or(0);
        let value = self.get(key).saturating_add(amount);
        self.set(key, value);
        value
    }

    /// Subtract `amount` if available. Leaves the value untouched otherwise.
    pub fn spend(&mut self, key: &str, amount: u64) -> bool {
        let current = self.get(key);
        if current < amount {
            debug!("Cannot spend {} {}: only {} available", amount, key, current);
            return false;
        }
        self.set(key, current - amount);
        true
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write pending changes to the store
    pub fn persist(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.store.save(&self.values)?;
        self.dirty = false;
        debug!("Persisted {} counters", self.values.len());
        Ok(())
    }
}

impl Counters<TomlCounterStore> {
    pub fn open_project(project_path: &Path, settings: &CounterSettings) -> Self {
        Self::open(
            TomlCounterStore::for_project(project_path, settings),
            DEFAULT_COUNTERS,
        )
    }
}
