// Copyright (c) 2026 rezky_nightky

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::form::FieldMap;

pub const SIGNUPS_KEY: &str = "ghostSecSignups";

pub trait BlobStore {
    fn read(&self, key: &str) -> io::Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> io::Result<()>;
}

#[derive(Clone, Debug)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|d| d.join("ghostgrid"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl BlobStore for FileBlobStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    // Write a sibling temp file, then rename it over the old one.
    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)
    }
}

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RefCell<HashMap<String, String>>,
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRecord {
    #[serde(flatten)]
    pub fields: FieldMap,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StoredSignup {
    Record(SignupRecord),
    Foreign(Value),
}

impl StoredSignup {
    fn from_entry(entry: Value) -> Self {
        match serde_json::from_value(entry.clone()) {
            Ok(record) => StoredSignup::Record(record),
            Err(_) => StoredSignup::Foreign(entry),
        }
    }
}

type Clock = Box<dyn Fn() -> DateTime<Utc>>;

// No locking: one writer at a time.
pub struct SignupStore<B> {
    blobs: B,
    key: String,
    clock: Clock,
}

impl<B: BlobStore> SignupStore<B> {
    pub fn new(blobs: B) -> Self {
        Self::with_clock(blobs, Box::new(Utc::now))
    }

    pub fn with_clock(blobs: B, clock: Clock) -> Self {
        Self {
            blobs,
            key: SIGNUPS_KEY.to_string(),
            clock,
        }
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    // Empty only when the blob is missing, is not JSON, or is not an array.
    fn entries(&self) -> Result<Vec<Value>, StoreError> {
        let Some(raw) = self.blobs.read(&self.key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(Value::Array(entries)) => Ok(entries),
            Ok(_) => {
                tracing::warn!(key = %self.key, "stored signups are not a list, starting over");
                Ok(Vec::new())
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "stored signups unreadable, starting over");
                Ok(Vec::new())
            }
        }
    }

    pub fn load(&self) -> Result<Vec<StoredSignup>, StoreError> {
        Ok(self
            .entries()?
            .into_iter()
            .map(StoredSignup::from_entry)
            .collect())
    }

    pub fn append(&self, fields: FieldMap) -> Result<SignupRecord, StoreError> {
        let mut stored = self.append_all([fields])?;
        stored
            .pop()
            .ok_or_else(|| StoreError::Io(io::Error::other("append produced no record")))
    }

    pub fn append_all(
        &self,
        batch: impl IntoIterator<Item = FieldMap>,
    ) -> Result<Vec<SignupRecord>, StoreError> {
        let mut entries = self.entries()?;
        let mut floor = entries.last().and_then(entry_timestamp);
        let mut added = Vec::new();

        for mut fields in batch {
            fields.remove("timestamp");
            let now = (self.clock)();
            let timestamp = floor.map_or(now, |f| f.max(now));
            floor = Some(timestamp);
            let record = SignupRecord { fields, timestamp };
            entries.push(serde_json::to_value(&record)?);
            added.push(record);
        }

        let encoded = serde_json::to_string(&entries)?;
        self.blobs.write(&self.key, &encoded)?;
        tracing::info!(added = added.len(), total = entries.len(), "signups stored");
        Ok(added)
    }
}

fn entry_timestamp(entry: &Value) -> Option<DateTime<Utc>> {
    let raw = entry.get("timestamp")?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
