use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use plugin_core::StorageLocator;

use crate::adapters::object_store::ObjectStore;

/// In-memory bucket for transfer tests.
#[derive(Default)]
pub(crate) struct MemoryStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    failure_prefix: Option<Vec<u8>>,
}

impl MemoryStore {
    pub(crate) fn with_object(bucket: &str, key: &str, body: &[u8]) -> Self {
        let store = Self::default();
        store.insert(bucket, key, body);
        store
    }

    /// Every download writes `prefix` and then fails; every upload fails.
    pub(crate) fn failing_after(prefix: &[u8]) -> Self {
        Self {
            failure_prefix: Some(prefix.to_vec()),
            ..Self::default()
        }
    }

    pub(crate) fn insert(&self, bucket: &str, key: &str, body: &[u8]) {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .insert((bucket.to_string(), key.to_string()), body.to_vec());
    }

    pub(crate) fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }
}

impl ObjectStore for MemoryStore {
    fn download_object(
        &self,
        locator: &StorageLocator,
        sink: &mut dyn Write,
    ) -> Result<u64, String> {
        if let Some(prefix) = &self.failure_prefix {
            sink.write_all(prefix).map_err(|error| error.to_string())?;
            return Err(format!("simulated connection reset for {locator}"));
        }

        let body = self
            .object(&locator.bucket, &locator.key)
            .ok_or_else(|| format!("NoSuchKey: {locator}"))?;
        sink.write_all(&body).map_err(|error| error.to_string())?;
        Ok(body.len() as u64)
    }

    fn upload_object(
        &self,
        locator: &StorageLocator,
        source: &Path,
        len: u64,
    ) -> Result<(), String> {
        if self.failure_prefix.is_some() {
            return Err(format!("simulated access denied for {locator}"));
        }

        let body = fs::read(source).map_err(|error| error.to_string())?;
        if body.len() as u64 != len {
            return Err(format!("expected {len} bytes, read {}", body.len()));
        }
        self.insert(&locator.bucket, &locator.key, &body);
        Ok(())
    }
}
