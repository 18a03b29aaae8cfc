// # Master Key
//
// 32 random bytes, stored Base64-encoded in the per-user settings directory.
// Created on first use. On Unix the file is created with mode 0600.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use rand::rngs::OsRng;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::{Error, Result};

const MASTER_KEY_LEN: usize = 32;

/// Per-user master key from which protection keys are derived
#[derive(Clone, PartialEq, Eq)]
pub struct MasterKey([u8; MASTER_KEY_LEN]);

impl MasterKey {
    pub fn from_bytes(bytes: [u8; MASTER_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh random key
    pub fn generate() -> Self {
        let mut bytes = [0u8; MASTER_KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Load the key at `path`, creating it (and its directory) if absent
    pub async fn load_or_create(path: &Path) -> Result<Self> {
        if fs::try_exists(path).await? {
            return Self::load(path).await;
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create settings directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let key = Self::generate();
        let temp_path = Self::temp_path(path);
        let written = Self::write_temp(&temp_path, &key).await;

        // Publish by hard link: it fails if the key appeared meanwhile, and
        // readers never see a partly written file.
        let published = match written {
            Ok(()) => fs::hard_link(&temp_path, path).await,
            Err(e) => Err(e),
        };
        let _ = fs::remove_file(&temp_path).await;

        match published {
            Ok(()) => {
                tracing::info!("Created credential protection key at {}", path.display());
                Ok(key)
            }
            // Another caller won the race; use its key.
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Self::load(path).await,
            Err(e) => Err(Error::config(format!(
                "Failed to create protection key {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn temp_path(path: &Path) -> PathBuf {
        let mut temp = path.as_os_str().to_owned();
        temp.push(format!(".{:016x}.tmp", OsRng.next_u64()));
        PathBuf::from(temp)
    }

    async fn write_temp(temp_path: &Path, key: &MasterKey) -> std::io::Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(temp_path).await?;
        file.write_all(BASE64.encode(key.0).as_bytes()).await?;
        file.flush().await?;
        file.sync_all().await
    }

    async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let bytes = BASE64.decode(content.trim()).map_err(|e| {
            Error::decryption_failed(format!(
                "protection key {} is not valid Base64: {}",
                path.display(),
                e
            ))
        })?;

        let bytes: [u8; MASTER_KEY_LEN] = bytes.try_into().map_err(|_| {
            Error::decryption_failed(format!(
                "protection key {} has the wrong length",
                path.display()
            ))
        })?;

        tracing::debug!("Loaded credential protection key from {}", path.display());
        Ok(Self(bytes))
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}
