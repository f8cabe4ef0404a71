//! Session snapshots and the key-value stores that hold them.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Document, DEFAULT_TITLE};

/// Key the session snapshot is stored under
pub const STORAGE_KEY: &str = "marginalia.session";

/// A string key-value store, such as browser `localStorage`
pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

impl<S: BlobStore + ?Sized> BlobStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// Everything that survives between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub lines: Vec<String>,
    pub annotations: BTreeMap<usize, String>,
    pub dark_mode: bool,
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn capture(doc: &Document, dark_mode: bool) -> Self {
        Self {
            lines: doc.lines().to_vec(),
            annotations: doc.annotations().clone(),
            dark_mode,
            id: Some(doc.id),
            title: Some(doc.title.clone()),
            saved_at: Some(Utc::now()),
        }
    }

    /// Rebuild the document, dropping notes that no longer fit its lines
    pub fn into_document(self) -> Document {
        let title = self.title.unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let mut doc = Document::from_parts(title, self.lines, self.annotations);
        if let Some(id) = self.id {
            doc.id = id;
        }
        if let Some(saved_at) = self.saved_at {
            doc.updated_at = saved_at;
        }
        doc
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize session snapshot")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse session snapshot")
    }
}
