//! Session persistence for the connected wallet identity.

use crate::connector::WalletIdentity;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("identity store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("identity store json: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait IdentityStore: Send + Sync {
    fn load(&self) -> Result<Option<WalletIdentity>, StoreError>;
    fn save(&self, identity: &WalletIdentity) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    slot: Mutex<Option<WalletIdentity>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self { Self::default() }
    pub fn with_identity(identity: WalletIdentity) -> Self { Self { slot: Mutex::new(Some(identity)) } }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self) -> Result<Option<WalletIdentity>, StoreError> {
        Ok(self.slot.lock().unwrap_or_else(|p| p.into_inner()).clone())
    }
    fn save(&self, identity: &WalletIdentity) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(|p| p.into_inner()) = Some(identity.clone());
        Ok(())
    }
    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(|p| p.into_inner()) = None;
        Ok(())
    }
}

/// JSON file holding the last connected identity
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    /// `$ORD_CONNECT_ROOT/<app>/wallet.json`, falling back to the platform
    /// local data directory.
    #[cfg(feature = "native")]
    pub fn in_data_dir(app: &str) -> Self {
        let root = std::env::var("ORD_CONNECT_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")));
        Self::new(root.join(app).join("wallet.json"))
    }

    pub fn path(&self) -> &Path { &self.path }
}

impl IdentityStore for FileIdentityStore {
    fn load(&self) -> Result<Option<WalletIdentity>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, identity: &WalletIdentity) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(identity)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
