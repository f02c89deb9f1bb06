use std::fmt;

/// MIME type every downloaded document is tagged with.
pub const PDF_MIME: &str = "application/pdf";

/// Decoded document bytes, ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfArtifact {
    pub bytes: Vec<u8>,
}

impl PdfArtifact {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn mime_type(&self) -> &'static str {
        PDF_MIME
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// No credential in the cache and none extractable from the page.
    AuthenticationMissing,
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
    /// Response had no usable `file` field.
    MissingPayload,
    /// Response was not JSON, or `file` was not valid base64.
    InvalidPayload,
    Save,
}

impl FailureKind {
    /// Failures that mean "log in first" rather than "something broke".
    pub fn is_authentication(&self) -> bool {
        matches!(self, FailureKind::AuthenticationMissing)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::AuthenticationMissing => write!(f, "authentication missing"),
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
            FailureKind::MissingPayload => write!(f, "no document data in response"),
            FailureKind::InvalidPayload => write!(f, "undecodable document data"),
            FailureKind::Save => write!(f, "save failed"),
        }
    }
}
