//! JSON File Backing Store
//!
//! A flat-file implementation of the backing-store port: all pairs live in
//! one JSON document under a namespace directory. Writes go through a
//! temp-file rename so the document is never observed half-written.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::Result;
use crate::persistence::BackingStore;

const DOCUMENT_NAME: &str = "entries.json";

// == JSON File Backing Store ==
#[derive(Debug)]
pub struct JsonFileBackingStore {
    /// Path of the JSON document inside the namespace directory
    document: PathBuf,
    /// Serializes read-modify-write cycles on the document
    write_lock: Mutex<()>,
}

impl JsonFileBackingStore {
    /// Opens a store rooted at `dir/namespace`, creating it if absent.
    ///
    /// The namespace is the opaque string from the configuration surface;
    /// this store interprets it as a directory name.
    pub fn open(dir: impl AsRef<Path>, namespace: &str) -> Result<Self> {
        let root = dir.as_ref().join(namespace);
        fs::create_dir_all(&root)?;
        debug!("File backing store opened at {}", root.display());
        Ok(Self {
            document: root.join(DOCUMENT_NAME),
            write_lock: Mutex::new(()),
        })
    }

    fn read_document(&self) -> Result<HashMap<String, String>> {
        if !self.document.exists() {
            return Ok(HashMap::new());
        }
        let raw = fs::read_to_string(&self.document)?;
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }
        let map = serde_json::from_str(&raw).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e)
        })?;
        Ok(map)
    }

    fn write_document(&self, map: &HashMap<String, String>) -> Result<()> {
        let tmp = self.document.with_extension("tmp");
        {
            let mut file = File::create(&tmp)?;
            let raw = serde_json::to_string_pretty(map).map_err(|e| {
                std::io::Error::new(std::io::ErrorKind::InvalidData, e)
            })?;
            file.write_all(raw.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.document)?;
        Ok(())
    }
}

#[async_trait]
impl BackingStore for JsonFileBackingStore {
    async fn persist(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut map = self.read_document()?;
        map.insert(key.to_string(), value.to_string());
        self.write_document(&map)
    }

    async fn load_all(&self) -> Result<Vec<(String, String)>> {
        let _guard = self.write_lock.lock();
        Ok(self.read_document()?.into_iter().collect())
    }
}
