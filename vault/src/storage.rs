//! Vault Persistence
//!
//! `VaultData` is the only thing that ever reaches disk: the format version,
//! the KDF salt and the AEAD output, all hex-encoded in JSON. The vault never
//! touches a store itself; callers move `VaultData` through a
//! [`KeyValueStore`].

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::VaultError;

/// Store key under which the sealed vault lives.
pub const VAULT_DATA_KEY: &str = "vaultData";

/// Sealed vault as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultData {
    /// Format version; selects the cipher suite
    pub version: u32,

    /// KDF salt (hex encoded)
    #[serde(with = "hex::serde")]
    pub salt: Vec<u8>,

    /// `nonce || ciphertext || tag` (hex encoded)
    #[serde(with = "hex::serde")]
    pub encrypted_content: Vec<u8>,
}

impl VaultData {
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| VaultError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json).map_err(|e| VaultError::Serialization(e.to_string()))
    }
}

/// A flat map of JSON values, the shape of browser extension storage.
pub trait KeyValueStore {
    /// Values for whichever of `keys` are present.
    fn get(&self, keys: &[&str]) -> Result<BTreeMap<String, Value>>;

    /// Insert or overwrite every entry of `items`.
    fn set(&mut self, items: BTreeMap<String, Value>) -> Result<()>;

    fn remove(&mut self, keys: &[&str]) -> Result<()>;
}

/// In-process store, mostly for tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, keys: &[&str]) -> Result<BTreeMap<String, Value>> {
        Ok(keys
            .iter()
            .filter_map(|key| self.entries.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    fn set(&mut self, items: BTreeMap<String, Value>) -> Result<()> {
        self.entries.extend(items);
        Ok(())
    }

    fn remove(&mut self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.entries.remove(*key);
        }
        Ok(())
    }
}

/// JSON file store. Written whole on every `set`, owner-only on Unix.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn read_all(&self) -> Result<BTreeMap<String, Value>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read store file {}", self.path.display()))?;
        if json.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse store file {}", self.path.display()))
    }

    fn write_all(&self, entries: &BTreeMap<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(entries)?;

        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {}", self.path.display()))?;
            file.write_all(json.as_bytes())?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, json)
                .with_context(|| format!("Failed to write {}", self.path.display()))?;
        }

        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, keys: &[&str]) -> Result<BTreeMap<String, Value>> {
        let mut entries = self.read_all()?;
        Ok(keys
            .iter()
            .filter_map(|key| entries.remove(*key).map(|v| (key.to_string(), v)))
            .collect())
    }

    fn set(&mut self, items: BTreeMap<String, Value>) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.extend(items);
        self.write_all(&entries)
    }

    fn remove(&mut self, keys: &[&str]) -> Result<()> {
        let mut entries = self.read_all()?;
        for key in keys {
            entries.remove(*key);
        }
        self.write_all(&entries)
    }
}

/// Persist `data` under [`VAULT_DATA_KEY`].
pub fn save_vault_data(store: &mut dyn KeyValueStore, data: &VaultData) -> Result<()> {
    let value = serde_json::to_value(data)?;
    store.set(BTreeMap::from([(VAULT_DATA_KEY.to_string(), value)]))
}

/// Load the sealed vault, `None` when nothing has been saved yet.
pub fn load_vault_data(store: &dyn KeyValueStore) -> Result<Option<VaultData>> {
    let mut entries = store.get(&[VAULT_DATA_KEY])?;
    match entries.remove(VAULT_DATA_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| anyhow!("Stored vault data is malformed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> VaultData {
        VaultData {
            version: 1,
            salt: vec![0xab; 32],
            encrypted_content: vec![0x01, 0x02, 0x03],
        }
    }

    #[test]
    fn test_vault_data_json_shape() {
        let json: Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["salt"], "ab".repeat(32));
        assert_eq!(json["encryptedContent"], "010203");

        let decoded = VaultData::from_json(&sample().to_json().unwrap()).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_vault_data_rejects_bad_hex() {
        let json = r#"{"version":1,"salt":"zz","encryptedContent":"00"}"#;
        assert!(matches!(
            VaultData::from_json(json),
            Err(VaultError::Serialization(_))
        ));
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert!(load_vault_data(&store).unwrap().is_none());

        save_vault_data(&mut store, &sample()).unwrap();
        assert_eq!(load_vault_data(&store).unwrap(), Some(sample()));

        store.remove(&[VAULT_DATA_KEY]).unwrap();
        assert!(load_vault_data(&store).unwrap().is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("store.json");

        let mut store = FileStore::new(&path);
        assert!(!store.exists());
        assert!(load_vault_data(&store).unwrap().is_none());

        save_vault_data(&mut store, &sample()).unwrap();
        assert!(store.exists());

        let reopened = FileStore::new(&path);
        assert_eq!(load_vault_data(&reopened).unwrap(), Some(sample()));
    }

    #[test]
    fn test_file_store_keeps_other_keys() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::new(temp_dir.path().join("store.json"));

        store
            .set(BTreeMap::from([("theme".to_string(), Value::from("dark"))]))
            .unwrap();
        save_vault_data(&mut store, &sample()).unwrap();

        let entries = store.get(&["theme", VAULT_DATA_KEY, "missing"]).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries["theme"], "dark");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::new(temp_dir.path().join("store.json"));
        save_vault_data(&mut store, &sample()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_malformed_store_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        fs::write(&path, "{not json").unwrap();

        assert!(load_vault_data(&FileStore::new(&path)).is_err());
    }
}
