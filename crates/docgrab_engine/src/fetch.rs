use std::time::Duration;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use futures_util::StreamExt;
use serde::Deserialize;
use url::Url;

use crate::{Credential, FailureKind, FetchError, PdfArtifact};

pub const DEFAULT_API_BASE_URL: &str = "https://lmg-prod.cortexio.se/v1/file/";

/// Standard alphabet; padding optional and ASCII whitespace ignored, like `atob`.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub base_url: String,
    /// `None` keeps the connection attempt unbounded.
    pub connect_timeout: Option<Duration>,
    /// `None` means a hung request stalls until the server gives up.
    pub request_timeout: Option<Duration>,
    pub max_bytes: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            connect_timeout: None,
            request_timeout: None,
            max_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Retrieves and decodes one document.
#[async_trait::async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, id: &str, credential: &Credential) -> Result<PdfArtifact, FetchError>;
}

#[derive(Deserialize)]
struct FilePayload {
    #[serde(default)]
    file: Option<String>,
}

/// `GET <base>/<id>` with a bearer token; expects `{ "file": "<base64>" }`.
#[derive(Debug, Clone)]
pub struct ApiFetcher {
    settings: FetchSettings,
    base_url: Url,
    client: reqwest::Client,
}

impl ApiFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as a base url", settings.base_url),
            ));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            settings,
            base_url,
            client,
        })
    }

    /// The id becomes one percent-encoded path segment under the base url.
    pub fn document_url(&self, id: &str) -> Result<Url, FetchError> {
        if id.is_empty() {
            return Err(FetchError::new(FailureKind::InvalidUrl, "empty document id"));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::new(FailureKind::InvalidUrl, "base url has no path"))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, FetchError> {
        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl DocumentFetcher for ApiFetcher {
    async fn fetch(&self, id: &str, credential: &Credential) -> Result<PdfArtifact, FetchError> {
        let url = self.document_url(id)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body = self.read_body(response).await?;
        decode_payload(&body)
    }
}

/// Pull the base64 `file` field out of a response body and decode it.
pub fn decode_payload(body: &[u8]) -> Result<PdfArtifact, FetchError> {
    let payload: FilePayload = serde_json::from_slice(body)
        .map_err(|err| FetchError::new(FailureKind::InvalidPayload, err.to_string()))?;
    let encoded = payload
        .file
        .filter(|file| !file.is_empty())
        .ok_or_else(|| FetchError::new(FailureKind::MissingPayload, "no PDF data in response"))?;

    let compact: Vec<u8> = encoded
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let bytes = LENIENT_BASE64
        .decode(compact)
        .map_err(|err| FetchError::new(FailureKind::InvalidPayload, err.to_string()))?;
    Ok(PdfArtifact::new(bytes))
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
