//! Browser storage using Web APIs

use anyhow::{anyhow, Result};
use web_sys::Storage;

use marginalia_core::BlobStore;

/// `BlobStore` over `window.localStorage`
pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    pub fn open() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| anyhow!("No window"))?;
        let storage = window
            .local_storage()
            .map_err(|e| anyhow!("localStorage unavailable: {:?}", e))?
            .ok_or_else(|| anyhow!("No localStorage"))?;

        Ok(Self { storage })
    }
}

impl BlobStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|e| anyhow!("Failed to read {}: {:?}", key, e))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        // Throws QuotaExceededError when the origin is out of space
        self.storage
            .set_item(key, value)
            .map_err(|e| anyhow!("Failed to write {}: {:?}", key, e))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| anyhow!("Failed to remove {}: {:?}", key, e))
    }
}
