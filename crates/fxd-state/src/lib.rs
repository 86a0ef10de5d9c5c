//! Snapshot persistence for resumable runs.
//!
//! A [`StateRepository`] stores named JSON snapshot records (risk state,
//! per-instrument ledger state) and is deliberately small enough to mock:
//! the drivers depend on the trait, never on the filesystem directly.
//!
//! [`JsonStateRepository`] writes `<name>.json.tmp` and renames it into
//! place, so a crash mid-write leaves the previous snapshot intact rather
//! than a truncated file.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Named snapshot store. Object-safe; typed access goes through [`save`] and
/// [`load`].
pub trait StateRepository {
    fn save_raw(&mut self, name: &str, record: &Value) -> Result<()>;
    /// `Ok(None)` when no snapshot with this name exists.
    fn load_raw(&self, name: &str) -> Result<Option<Value>>;
}

/// Serialize and store one snapshot record.
pub fn save<T: Serialize>(repo: &mut dyn StateRepository, name: &str, value: &T) -> Result<()> {
    let record = serde_json::to_value(value)
        .with_context(|| format!("serialize snapshot '{name}' failed"))?;
    repo.save_raw(name, &record)
}

/// Load and deserialize one snapshot record, if present.
pub fn load<T: DeserializeOwned>(repo: &dyn StateRepository, name: &str) -> Result<Option<T>> {
    match repo.load_raw(name)? {
        None => Ok(None),
        Some(record) => {
            let value = serde_json::from_value(record)
                .with_context(|| format!("deserialize snapshot '{name}' failed"))?;
            Ok(Some(value))
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !ok {
        bail!("invalid snapshot name '{name}' (alphanumeric, '-', '_', '.' only)");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON file repository
// ---------------------------------------------------------------------------

/// One JSON file per snapshot under a root directory, written atomically
/// (write-then-rename).
#[derive(Clone, Debug)]
pub struct JsonStateRepository {
    root: PathBuf,
}

impl JsonStateRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }
}

impl StateRepository for JsonStateRepository {
    fn save_raw(&mut self, name: &str, record: &Value) -> Result<()> {
        validate_name(name)?;
        fs::create_dir_all(&self.root)
            .with_context(|| format!("create state dir {:?} failed", self.root))?;

        let path = self.path_for(name);
        let tmp = self.root.join(format!("{name}.json.tmp"));
        let body = serde_json::to_string_pretty(record).context("serialize snapshot failed")?;

        fs::write(&tmp, format!("{body}\n"))
            .with_context(|| format!("write snapshot temp {tmp:?} failed"))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("rename snapshot {tmp:?} -> {path:?} failed"))?;
        Ok(())
    }

    fn load_raw(&self, name: &str) -> Result<Option<Value>> {
        validate_name(name)?;
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(None);
        }
        let raw =
            fs::read_to_string(&path).with_context(|| format!("read snapshot {path:?} failed"))?;
        let record = serde_json::from_str(&raw)
            .with_context(|| format!("parse snapshot {path:?} failed"))?;
        Ok(Some(record))
    }
}

// ---------------------------------------------------------------------------
// In-memory repository (tests, dry runs)
// ---------------------------------------------------------------------------

/// BTreeMap-backed repository. `fail_writes` simulates a persistence outage
/// so callers can prove they continue on in-memory state.
#[derive(Clone, Debug, Default)]
pub struct MemoryStateRepository {
    records: BTreeMap<String, Value>,
    fail_writes: bool,
}

impl MemoryStateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

impl StateRepository for MemoryStateRepository {
    fn save_raw(&mut self, name: &str, record: &Value) -> Result<()> {
        validate_name(name)?;
        if self.fail_writes {
            bail!("simulated persistence failure for '{name}'");
        }
        self.records.insert(name.to_string(), record.clone());
        Ok(())
    }

    fn load_raw(&self, name: &str) -> Result<Option<Value>> {
        validate_name(name)?;
        Ok(self.records.get(name).cloned())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
