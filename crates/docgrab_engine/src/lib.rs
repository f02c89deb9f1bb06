//! Docgrab engine: credentials, document fetching, persistence and the queue driver.
mod credential;
mod download;
mod driver;
mod engine;
mod fetch;
mod persist;
mod report;
mod types;

pub use credential::{
    Credential, CredentialProvider, CredentialSource, CredentialStore, CredentialStoreError,
    EnvCredentialSource, JsonFileCredentialStore, MemoryCredentialStore, NoCredentialSource,
    SourceError, StorageSnapshotSource, CREDENTIAL_KEY,
};
pub use download::Downloader;
pub use driver::{system_clock, Clock, DriverSettings, QueueDriver, AUTH_REQUIRED_MESSAGE};
pub use engine::{CommandSender, EngineConfig, EngineError, EngineHandle};
pub use fetch::{decode_payload, ApiFetcher, DocumentFetcher, FetchSettings, DEFAULT_API_BASE_URL};
pub use persist::{
    ensure_output_dir, ArtifactSink, AtomicFileWriter, ConflictPolicy, DirectorySink, PersistError,
};
pub use report::{ChannelReporter, ProgressReporter};
pub use types::{FailureKind, FetchError, PdfArtifact, PDF_MIME};
