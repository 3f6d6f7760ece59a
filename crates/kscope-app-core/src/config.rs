// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Config service and storage port for KernelScope tools.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Storage port for raw config blobs keyed by logical name.
pub trait ConfigStore {
    /// Load a raw blob. Returns [`ConfigError::NotFound`] when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Persist a raw blob.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key not present in the store.
    #[error("not found")]
    NotFound,
    /// I/O failure while reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Blob is not valid JSON for the requested type.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Store could not be set up (e.g. no config directory on this platform).
    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// Serializes values as JSON and delegates storage to a [`ConfigStore`].
#[derive(Debug)]
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Wrap `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the inner store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the service and return the inner store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: ConfigStore> ConfigService<S> {
    /// Load `key`; `Ok(None)` when missing or empty.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.store.load_raw(key) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(ConfigError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Serialize and persist `value` under `key`.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }
}

/// Process-local store; nothing survives the process.
///
/// Used by the CLI (which never persists) and by tests.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    blobs: RefCell<HashMap<String, Vec<u8>>>,
}

impl MemoryConfigStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        self.blobs
            .borrow()
            .get(key)
            .cloned()
            .ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        self.blobs.borrow_mut().insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        url: String,
        n: u32,
    }

    #[test]
    fn round_trip_and_missing() {
        let svc = ConfigService::new(MemoryConfigStore::new());
        assert!(svc.load::<Sample>("s").unwrap().is_none());
        let v = Sample {
            url: "http://x".into(),
            n: 3,
        };
        svc.save("s", &v).unwrap();
        assert_eq!(svc.load::<Sample>("s").unwrap(), Some(v));
    }

    #[test]
    fn empty_blob_reads_as_missing_and_garbage_errors() {
        let store = MemoryConfigStore::new();
        store.save_raw("empty", b"").unwrap();
        store.save_raw("bad", b"{not json").unwrap();
        let svc = ConfigService::new(store);
        assert!(svc.load::<Sample>("empty").unwrap().is_none());
        assert!(matches!(
            svc.load::<Sample>("bad"),
            Err(ConfigError::Serde(_))
        ));
    }
}
