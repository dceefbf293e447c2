//! Key-value stores the profile collection is persisted in.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::trace;

pub type Entries = BTreeMap<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("malformed store file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store file does not contain a JSON object")]
    NotAnObject,
    #[error("{0}")]
    Rejected(String),
}

pub trait Store {
    /// Reads the given keys. Keys that are not present are absent from the result.
    fn get(&mut self, keys: &[&str]) -> Result<Entries, StoreError>;

    /// Writes every entry, replacing existing values. Other keys are kept.
    fn set(&mut self, entries: Entries) -> Result<(), StoreError>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn get(&mut self, keys: &[&str]) -> Result<Entries, StoreError> { (**self).get(keys) }

    fn set(&mut self, entries: Entries) -> Result<(), StoreError> { (**self).set(entries) }
}

fn select(all: &Entries, keys: &[&str]) -> Entries {
    keys.iter()
        .filter_map(|key| all.get(*key).map(|value| (key.to_string(), value.clone())))
        .collect()
}

/// A store kept as a single JSON object in a file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    pub fn path(&self) -> &Path { &self.path }

    fn read_all(&self) -> Result<Entries, StoreError> {
        let buf = match fs::read_to_string(&self.path) {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(e.into()),
        };
        if buf.trim().is_empty() {
            return Ok(Entries::new());
        }
        match serde_json::from_str::<Value>(&buf)? {
            Value::Object(map) => Ok(map.into_iter().collect()),
            _ => Err(StoreError::NotAnObject),
        }
    }

    fn write_all(&self, entries: &Entries) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Store for JsonFileStore {
    fn get(&mut self, keys: &[&str]) -> Result<Entries, StoreError> {
        Ok(select(&self.read_all()?, keys))
    }

    fn set(&mut self, entries: Entries) -> Result<(), StoreError> {
        let mut all = self.read_all()?;
        trace!(path = ?self.path, keys = ?entries.keys().collect::<Vec<_>>(), "writing store");
        all.extend(entries);
        self.write_all(&all)
    }
}

/// An in-process store. Writes can be made to fail to exercise error paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Entries,
    fail_writes: Option<String>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_entries(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Makes every following `set` fail with `message`; `None` restores writes.
    pub fn fail_writes(&mut self, message: Option<&str>) {
        self.fail_writes = message.map(str::to_string);
    }

    pub fn entry(&self, key: &str) -> Option<&Value> { self.entries.get(key) }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize { self.writes }
}

impl Store for MemoryStore {
    fn get(&mut self, keys: &[&str]) -> Result<Entries, StoreError> {
        Ok(select(&self.entries, keys))
    }

    fn set(&mut self, entries: Entries) -> Result<(), StoreError> {
        if let Some(message) = &self.fail_writes {
            return Err(StoreError::Rejected(message.clone()));
        }
        self.entries.extend(entries);
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn entries(pairs: &[(&str, Value)]) -> Entries {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("storage.json"));
        assert!(store.get(&["a", "b"]).unwrap().is_empty());
    }

    #[test]
    fn set_merges_with_existing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("storage.json");
        let mut store = JsonFileStore::new(&path);
        store.set(entries(&[("a", json!(1)), ("b", json!([1, 2]))])).unwrap();
        store.set(entries(&[("b", json!("replaced"))])).unwrap();

        let mut reopened = JsonFileStore::new(&path);
        assert_eq!(
            reopened.get(&["a", "b", "c"]).unwrap(),
            entries(&[("a", json!(1)), ("b", json!("replaced"))])
        );
        assert!(!dir.path().join("deep").join("storage.json.tmp").exists());
    }

    #[test]
    fn malformed_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(JsonFileStore::new(&path).get(&["a"]), Err(StoreError::NotAnObject)));
        fs::write(&path, "{ nope").unwrap();
        assert!(matches!(JsonFileStore::new(&path).get(&["a"]), Err(StoreError::Json(_))));
    }

    #[test]
    fn memory_store_can_reject_writes() {
        let mut store = MemoryStore::with_entries([("a".to_string(), json!(true))]);
        store.fail_writes(Some("QUOTA_BYTES quota exceeded"));
        let err = store.set(entries(&[("a", json!(false))])).unwrap_err();
        assert_eq!(err.to_string(), "QUOTA_BYTES quota exceeded");
        assert_eq!(store.entry("a"), Some(&json!(true)));
        assert_eq!(store.writes(), 0);

        store.fail_writes(None);
        store.set(entries(&[("a", json!(false))])).unwrap();
        assert_eq!(store.get(&["a"]).unwrap(), entries(&[("a", json!(false))]));
        assert_eq!(store.writes(), 1);
    }
}
