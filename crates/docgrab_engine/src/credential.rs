//! Bearer credential resolution: durable cache first, then the page.
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use engine_logging::{engine_debug, engine_info, engine_warn};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};

/// Fixed key under which the credential is cached and stored by the page.
pub const CREDENTIAL_KEY: &str = "privilegeToken";

/// Opaque bearer token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Empty strings are not credentials.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed credential store: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Durable, extension-scoped cache for the credential.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<Credential>, CredentialStoreError>;
    fn store(&self, credential: &Credential) -> Result<(), CredentialStoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    value: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            value: Mutex::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credential>, CredentialStoreError> {
        Ok(self
            .value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn store(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        *self
            .value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(credential.clone());
        Ok(())
    }
}

/// JSON object file; the credential lives under [`CREDENTIAL_KEY`].
///
/// Writes replace the whole file atomically and keep unrelated keys.
#[derive(Debug, Clone)]
pub struct JsonFileCredentialStore {
    path: PathBuf,
}

impl JsonFileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_object(&self) -> Result<Map<String, Value>, CredentialStoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

impl CredentialStore for JsonFileCredentialStore {
    fn load(&self) -> Result<Option<Credential>, CredentialStoreError> {
        let object = self.read_object()?;
        Ok(object
            .get(CREDENTIAL_KEY)
            .and_then(Value::as_str)
            .and_then(Credential::new))
    }

    fn store(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        let mut object = self.read_object()?;
        object.insert(
            CREDENTIAL_KEY.to_string(),
            Value::String(credential.expose().to_string()),
        );
        let content = serde_json::to_vec_pretty(&Value::Object(object))?;

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let filename = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "credential path has no file name")
            })?;
        AtomicFileWriter::new(dir).write(&filename, &content)?;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("page storage unavailable: {0}")]
    Unavailable(String),
    #[error("malformed page storage: {0}")]
    Malformed(String),
}

/// Where a credential can be extracted when the cache is empty (the page).
#[async_trait::async_trait]
pub trait CredentialSource: Send + Sync {
    async fn extract(&self) -> Result<Option<Credential>, SourceError>;
}

/// No page to ask.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCredentialSource;

#[async_trait::async_trait]
impl CredentialSource for NoCredentialSource {
    async fn extract(&self) -> Result<Option<Credential>, SourceError> {
        Ok(None)
    }
}

/// Reads the credential from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvCredentialSource {
    var: String,
}

impl EnvCredentialSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait::async_trait]
impl CredentialSource for EnvCredentialSource {
    async fn extract(&self) -> Result<Option<Credential>, SourceError> {
        match std::env::var(&self.var) {
            Ok(value) => Ok(Credential::new(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(err) => Err(SourceError::Unavailable(err.to_string())),
        }
    }
}

/// Reads [`CREDENTIAL_KEY`] out of a JSON dump of the page's local storage.
#[derive(Debug, Clone)]
pub struct StorageSnapshotSource {
    path: PathBuf,
}

impl StorageSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl CredentialSource for StorageSnapshotSource {
    async fn extract(&self) -> Result<Option<Credential>, SourceError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(SourceError::Unavailable(err.to_string())),
        };
        let object: Map<String, Value> =
            serde_json::from_str(&content).map_err(|e| SourceError::Malformed(e.to_string()))?;
        Ok(object
            .get(CREDENTIAL_KEY)
            .and_then(Value::as_str)
            .and_then(Credential::new))
    }
}

/// Resolves the credential for each download.
#[derive(Clone)]
pub struct CredentialProvider {
    store: Arc<dyn CredentialStore>,
    source: Arc<dyn CredentialSource>,
}

impl CredentialProvider {
    pub fn new(store: Arc<dyn CredentialStore>, source: Arc<dyn CredentialSource>) -> Self {
        Self { store, source }
    }

    /// Cached value if any, else whatever the page yields (which is then cached).
    ///
    /// Never fails: store and source errors are logged and count as "nothing".
    pub async fn get_credential(&self) -> Option<Credential> {
        match self.store.load() {
            Ok(Some(credential)) => return Some(credential),
            Ok(None) => {}
            Err(err) => engine_warn!("Failed to read cached credential: {}", err),
        }

        let credential = match self.source.extract().await {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                engine_debug!("No credential available from page storage");
                return None;
            }
            Err(err) => {
                engine_warn!("Failed to extract credential from page: {}", err);
                return None;
            }
        };

        self.save_credential(&credential);
        Some(credential)
    }

    /// Cache a credential pushed by the page.
    pub fn save_credential(&self, credential: &Credential) {
        match self.store.store(credential) {
            Ok(()) => engine_info!("Cached credential"),
            Err(err) => engine_warn!("Failed to cache credential: {}", err),
        }
    }
}
