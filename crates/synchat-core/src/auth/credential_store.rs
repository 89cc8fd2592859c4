//! Bearer credential storage
//!
//! Stores the access token as JSON under the user config dir. The token is
//! treated as an opaque value; expiry is the server's call (a 401 from any
//! endpoint invalidates it).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoredCredential {
    pub access_token: String,
    pub saved_at: DateTime<Utc>,
}

pub struct CredentialStore {
    storage_path: PathBuf,
}

impl CredentialStore {
    pub fn new(storage_path: PathBuf) -> Self {
        Self { storage_path }
    }

    /// Load the stored token, if any. A corrupt file is treated as absent.
    pub async fn load(&self) -> Option<StoredCredential> {
        if !self.storage_path.exists() {
            debug!("no credential file at {:?}", self.storage_path);
            return None;
        }
        match fs::read_to_string(&self.storage_path).await {
            Ok(content) => match serde_json::from_str::<StoredCredential>(&content) {
                Ok(credential) => Some(credential),
                Err(e) => {
                    warn!("failed to parse stored credential: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("failed to read credential file: {}", e);
                None
            }
        }
    }

    /// Save a token to disk with restrictive permissions.
    pub async fn save(&self, access_token: &str) -> Result<()> {
        if let Some(parent) = self.storage_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let credential = StoredCredential {
            access_token: access_token.to_string(),
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&credential)?;
        fs::write(&self.storage_path, json)
            .await
            .with_context(|| format!("failed to write credential to {:?}", self.storage_path))?;

        // Read/write for owner only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = fs::metadata(&self.storage_path).await?;
            let mut permissions = metadata.permissions();
            permissions.set_mode(0o600);
            fs::set_permissions(&self.storage_path, permissions).await?;
        }

        Ok(())
    }

    /// Remove the stored token. Missing file is not an error.
    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.storage_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("failed to remove credential file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_load_clear_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));

        assert!(store.load().await.is_none());

        store.save("tok-123").await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.access_token, "tok-123");

        store.clear().await.unwrap();
        assert!(store.load().await.is_none());
        // clearing twice is fine
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let store = CredentialStore::new(path);
        assert!(store.load().await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = CredentialStore::new(path.clone());
        store.save("tok").await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
