// # File Profile Store
//
// Persists connection profiles to `connection-settings.json`.
//
// ## File Format
//
// ```json
// [
//   {
//     "name": "prod",
//     "region": "AU",
//     "user": "admin",
//     "password": "base64(nonce || ciphertext || tag)",
//     "isDefault": true
//   }
// ]
// ```
//
// Profiles are sorted by name. Passwords are never written in plaintext.
//
// ## Writes
//
// - Atomic: serialized to `<file>.tmp`, flushed, then renamed over the file
// - Backup: the previous file is copied to `<file>.backup` before the rename
// - A file that exists but cannot be parsed is an error, never an empty set
//
// ## Stable Output
//
// The ciphertext read for each profile is remembered alongside its plaintext.
// Saving a profile whose password has not changed reuses that ciphertext, so
// loading and saving an unchanged set rewrites identical bytes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::profile::ConnectionProfile;
use crate::protect::CredentialProtector;
use crate::store::ProfileStore;
use crate::{Error, Result};

/// On-disk representation of one profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredProfile {
    name: String,
    region: String,
    user: String,
    password: String,
    #[serde(default)]
    is_default: bool,
}

/// Last known (plaintext, ciphertext) pair per profile name
type CiphertextCache = HashMap<String, (String, String)>;

/// File-backed profile store with encrypted passwords
pub struct FileProfileStore {
    path: PathBuf,
    protector: Arc<dyn CredentialProtector>,
    ciphertexts: Mutex<CiphertextCache>,
}

impl FileProfileStore {
    /// Create a store for the file at `path`
    ///
    /// Nothing is read until [`ProfileStore::load`] is called.
    pub fn new(path: impl Into<PathBuf>, protector: Arc<dyn CredentialProtector>) -> Self {
        Self {
            path: path.into(),
            protector,
            ciphertexts: Mutex::new(HashMap::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    /// Get path to backup file
    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.as_os_str().to_owned();
        backup.push(".backup");
        PathBuf::from(backup)
    }

    fn write_error(&self, e: impl std::fmt::Display) -> Error {
        Error::store_write_failed(&self.path, e.to_string())
    }

    async fn write_atomically(&self, json: &str) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_error(e))?;
        }

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path)
                .await
                .map_err(|e| self.write_error(e))?;
            file.write_all(json.as_bytes())
                .await
                .map_err(|e| self.write_error(e))?;
            file.flush().await.map_err(|e| self.write_error(e))?;
        }

        if fs::try_exists(&self.path).await.unwrap_or(false) {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to back up connection store: {}", e);
            }
        }

        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(self.write_error(e));
        }

        Ok(())
    }
}

impl std::fmt::Debug for FileProfileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileProfileStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProfileStore for FileProfileStore {
    async fn load(&self) -> Result<Vec<ConnectionProfile>> {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Connection store does not exist: {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let content = String::from_utf8(content)
            .map_err(|e| Error::store_corrupt(&self.path, e.to_string()))?;
        let stored: Vec<StoredProfile> = serde_json::from_str(&content)
            .map_err(|e| Error::store_corrupt(&self.path, e.to_string()))?;

        let mut profiles = Vec::with_capacity(stored.len());
        let mut cache = CiphertextCache::with_capacity(stored.len());

        for entry in stored {
            let password = self.protector.unprotect(&entry.password).map_err(|e| match e {
                Error::DecryptionFailed(msg) => Error::decryption_failed(format!(
                    "password of connection '{}': {}",
                    entry.name, msg
                )),
                other => other,
            })?;

            cache.insert(entry.name.clone(), (password.clone(), entry.password));
            profiles.push(ConnectionProfile {
                name: entry.name,
                region: entry.region,
                user_name: entry.user,
                password,
                is_default: entry.is_default,
            });
        }

        *self.ciphertexts.lock().await = cache;

        tracing::debug!(
            "Loaded {} connection(s) from {}",
            profiles.len(),
            self.path.display()
        );
        Ok(profiles)
    }

    async fn save(&self, profiles: &[ConnectionProfile]) -> Result<()> {
        let mut sorted: Vec<&ConnectionProfile> = profiles.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        let mut cache = self.ciphertexts.lock().await;
        let mut next_cache = CiphertextCache::with_capacity(sorted.len());
        let mut stored = Vec::with_capacity(sorted.len());

        for profile in sorted {
            let ciphertext = match cache.get(&profile.name) {
                Some((plaintext, ciphertext)) if *plaintext == profile.password => {
                    ciphertext.clone()
                }
                _ => self.protector.protect(&profile.password)?,
            };

            next_cache.insert(
                profile.name.clone(),
                (profile.password.clone(), ciphertext.clone()),
            );
            stored.push(StoredProfile {
                name: profile.name.clone(),
                region: profile.region.clone(),
                user: profile.user_name.clone(),
                password: ciphertext,
                is_default: profile.is_default,
            });
        }

        let json = serde_json::to_string_pretty(&stored)?;
        self.write_atomically(&json).await?;
        *cache = next_cache;

        tracing::debug!(
            "Saved {} connection(s) to {}",
            stored.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protect::{AesGcmProtector, MasterKey};
    use tempfile::tempdir;

    fn protector() -> Arc<dyn CredentialProtector> {
        Arc::new(AesGcmProtector::for_connection_credentials(
            &MasterKey::from_bytes([3u8; 32]),
        ))
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = FileProfileStore::new(dir.path().join("none.json"), protector());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".mcp").join("connection-settings.json");
        let store = FileProfileStore::new(&path, protector());

        let profiles = vec![
            ConnectionProfile::new("zeta", "NA", "bob", "pw2"),
            ConnectionProfile::new("alpha", "AU", "alice", "pw1").with_default(true),
        ];
        store.save(&profiles).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("pw1"));
        assert!(raw.find("\"alpha\"").unwrap() < raw.find("\"zeta\"").unwrap());

        let loaded = FileProfileStore::new(&path, protector()).load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name, "alpha");
        assert_eq!(loaded[0].password, "pw1");
        assert!(loaded[0].is_default);
        assert_eq!(loaded[1].user_name, "bob");
    }

    #[tokio::test]
    async fn test_field_order_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("connection-settings.json");
        let store = FileProfileStore::new(&path, protector());
        store
            .save(&[ConnectionProfile::new("a", "AU", "u", "p")])
            .await
            .unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let positions: Vec<usize> = ["\"name\"", "\"region\"", "\"user\"", "\"password\"", "\"isDefault\""]
            .iter()
            .map(|key| raw.find(key).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_changed_password_is_reprotected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("connection-settings.json");
        let store = FileProfileStore::new(&path, protector());
        store
            .save(&[ConnectionProfile::new("a", "AU", "u", "old")])
            .await
            .unwrap();

        let mut profiles = store.load().await.unwrap();
        profiles[0].password = "new".to_string();
        store.save(&profiles).await.unwrap();

        let reloaded = store.load().await.unwrap();
        assert_eq!(reloaded[0].password, "new");
    }

    #[tokio::test]
    async fn test_backup_written_on_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("connection-settings.json");
        let store = FileProfileStore::new(&path, protector());

        store
            .save(&[ConnectionProfile::new("a", "AU", "u", "p")])
            .await
            .unwrap();
        store
            .save(&[ConnectionProfile::new("b", "AU", "u", "p")])
            .await
            .unwrap();

        let backup = std::fs::read_to_string(FileProfileStore::backup_path(&path)).unwrap();
        assert!(backup.contains("\"a\""));
        assert!(!dir.path().join("connection-settings.tmp").exists());
    }

    #[tokio::test]
    async fn test_plaintext_password_fails_to_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("connection-settings.json");
        std::fs::write(
            &path,
            r#"[{"name":"a","region":"AU","user":"u","password":"plain","isDefault":false}]"#,
        )
        .unwrap();

        let err = FileProfileStore::new(&path, protector()).load().await.unwrap_err();
        assert!(matches!(err, Error::DecryptionFailed(_)));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("connection-settings.json");
        std::fs::write(&path, [0xff, 0xfe, b'[', b']']).unwrap();

        let err = FileProfileStore::new(&path, protector()).load().await.unwrap_err();
        assert!(matches!(err, Error::StoreCorrupt { .. }));
        assert_eq!(err.error_id(), "CloudControl.Store.Corrupt");
    }
}
