//! Credential sources holding the session token and user identifiers.
//!
//! The client reads credentials through the [`CredentialSource`] trait on every
//! call and never caches them. Three stores are provided: in-memory, the OS
//! keychain (via the `keyring` crate), and a JSON file in the user's config
//! directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use thiserror::Error;

/// Service name used for keychain entries and the config directory.
pub const SERVICE_NAME: &str = "movie-api-client";

const CREDENTIALS_FILE: &str = "credentials.json";

/// Keys the client reads from a credential source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    /// Bearer token returned by login.
    Token,
    /// Username used by the favorites and edit endpoints.
    Username,
    /// User identifier used by the profile and delete endpoints.
    User,
}

impl CredentialKey {
    pub const ALL: [CredentialKey; 3] =
        [CredentialKey::Token, CredentialKey::Username, CredentialKey::User];

    /// Storage name of the key.
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKey::Token => "token",
            CredentialKey::Username => "Username",
            CredentialKey::User => "user",
        }
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Credential store operation failed: {0}")]
    OperationFailed(String),
    #[error("Credential file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Credential file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

#[cfg(feature = "keychain")]
impl From<keyring::Error> for CredentialError {
    fn from(err: keyring::Error) -> Self {
        CredentialError::OperationFailed(err.to_string())
    }
}

/// Key-value store the client reads credentials from.
///
/// `get` never fails: a backend error is logged and reads as absent, the same
/// way an empty store would.
pub trait CredentialSource: Send + Sync {
    fn get(&self, key: CredentialKey) -> Option<String>;

    fn set(&self, key: CredentialKey, value: &str) -> Result<(), CredentialError>;

    /// Idempotent: removing an absent key succeeds.
    fn remove(&self, key: CredentialKey) -> Result<(), CredentialError>;
}

/// Process-local store. Contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    entries: RwLock<HashMap<CredentialKey, String>>,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a token and a user name under both user keys.
    pub fn with_session(token: &str, username: &str) -> Self {
        let mut entries = HashMap::new();
        entries.insert(CredentialKey::Token, token.to_string());
        entries.insert(CredentialKey::Username, username.to_string());
        entries.insert(CredentialKey::User, username.to_string());
        Self {
            entries: RwLock::new(entries),
        }
    }
}

impl CredentialSource for MemoryCredentials {
    fn get(&self, key: CredentialKey) -> Option<String> {
        match self.entries.read() {
            Ok(guard) => guard.get(&key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(&key).cloned(),
        }
    }

    fn set(&self, key: CredentialKey, value: &str) -> Result<(), CredentialError> {
        let mut guard = self
            .entries
            .write()
            .map_err(|e| CredentialError::OperationFailed(e.to_string()))?;
        guard.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: CredentialKey) -> Result<(), CredentialError> {
        let mut guard = self
            .entries
            .write()
            .map_err(|e| CredentialError::OperationFailed(e.to_string()))?;
        guard.remove(&key);
        Ok(())
    }
}

/// OS keychain store. One entry per key under a fixed service name.
#[cfg(feature = "keychain")]
#[derive(Debug, Clone)]
pub struct KeychainCredentials {
    service: String,
}

#[cfg(feature = "keychain")]
impl KeychainCredentials {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, key: CredentialKey) -> Result<keyring::Entry, CredentialError> {
        Ok(keyring::Entry::new(&self.service, key.as_str())?)
    }
}

#[cfg(feature = "keychain")]
impl Default for KeychainCredentials {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "keychain")]
impl CredentialSource for KeychainCredentials {
    fn get(&self, key: CredentialKey) -> Option<String> {
        let entry = match self.entry(key) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Keychain entry for {} unavailable: {}", key.as_str(), e);
                return None;
            }
        };
        match entry.get_password() {
            Ok(value) => Some(value),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                log::warn!("Failed to read {} from keychain: {}", key.as_str(), e);
                None
            }
        }
    }

    fn set(&self, key: CredentialKey, value: &str) -> Result<(), CredentialError> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    fn remove(&self, key: CredentialKey) -> Result<(), CredentialError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CredentialError::from(e)),
        }
    }
}

/// JSON file store, `{"token": "...", "Username": "...", "user": "..."}`.
///
/// A missing file reads as an empty store. Every call re-reads the file, so
/// several processes sharing one file see each other's sign-ins.
#[derive(Debug)]
pub struct FileCredentials {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: RwLock<()>,
}

impl FileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: RwLock::new(()),
        }
    }

    /// `<config dir>/movie-api-client/credentials.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(SERVICE_NAME).join(CREDENTIALS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, String>, CredentialError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(HashMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, entries: &HashMap<String, String>) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }

    fn update<F>(&self, change: F) -> Result<(), CredentialError>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let _guard = self
            .write_lock
            .write()
            .map_err(|e| CredentialError::OperationFailed(e.to_string()))?;
        let mut entries = self.load()?;
        change(&mut entries);
        self.store(&entries)
    }
}

impl CredentialSource for FileCredentials {
    fn get(&self, key: CredentialKey) -> Option<String> {
        match self.load() {
            Ok(mut entries) => entries.remove(key.as_str()),
            Err(e) => {
                log::warn!(
                    "Failed to read {} from {}: {}",
                    key.as_str(),
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    fn set(&self, key: CredentialKey, value: &str) -> Result<(), CredentialError> {
        self.update(|entries| {
            entries.insert(key.as_str().to_string(), value.to_string());
        })
    }

    fn remove(&self, key: CredentialKey) -> Result<(), CredentialError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|entries| {
            entries.remove(key.as_str());
        })
    }
}
