use std::path::PathBuf;
use std::sync::Arc;

use docgrab_core::DocumentRef;
use engine_logging::{engine_error, engine_info};

use crate::{ArtifactSink, CredentialProvider, DocumentFetcher, FailureKind, FetchError};

/// Credential → fetch → decode → save for one document.
#[derive(Clone)]
pub struct Downloader {
    credentials: CredentialProvider,
    fetcher: Arc<dyn DocumentFetcher>,
    sink: Arc<dyn ArtifactSink>,
}

impl Downloader {
    pub fn new(
        credentials: CredentialProvider,
        fetcher: Arc<dyn DocumentFetcher>,
        sink: Arc<dyn ArtifactSink>,
    ) -> Self {
        Self {
            credentials,
            fetcher,
            sink,
        }
    }

    pub fn credentials(&self) -> &CredentialProvider {
        &self.credentials
    }

    /// Download and save `document`, returning where it landed.
    pub async fn download(&self, document: &DocumentRef) -> Result<PathBuf, FetchError> {
        let credential = self.credentials.get_credential().await.ok_or_else(|| {
            FetchError::new(FailureKind::AuthenticationMissing, "no credential available")
        })?;

        let artifact = self.fetcher.fetch(&document.id, &credential).await?;
        let filename = document.pdf_filename();
        let path = self
            .sink
            .save(&filename, &artifact)
            .map_err(|err| FetchError::new(FailureKind::Save, err.to_string()))?;

        engine_info!(
            "Saved document id={} bytes={} path={:?}",
            document.id,
            artifact.len(),
            path
        );
        Ok(path)
    }

    /// Boolean boundary used by the batch loop: errors are logged, never returned.
    pub async fn download_document(&self, document: &DocumentRef) -> bool {
        match self.download(document).await {
            Ok(_) => true,
            Err(err) => {
                engine_error!("Error downloading document id={}: {}", document.id, err);
                false
            }
        }
    }
}
