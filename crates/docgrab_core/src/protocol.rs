//! Messages exchanged with the page collaborator.
//!
//! Every message is a flat JSON object tagged with a string `action`.
use serde::{Deserialize, Serialize};

use crate::DocumentRef;

/// Commands sent by the page (or any other front end) to the downloader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    DownloadAll {
        items: Vec<DocumentRef>,
        /// Falls back to `items.len()` when absent or zero.
        #[serde(rename = "totalItems", default, skip_serializing_if = "Option::is_none")]
        total_items: Option<usize>,
        /// Unix milliseconds; falls back to the receiver's clock when absent or zero.
        #[serde(rename = "startTime", default, skip_serializing_if = "Option::is_none")]
        start_time: Option<u64>,
    },
    PauseDownload,
    ResumeDownload,
    CancelDownload,
    DownloadSingle {
        pk: String,
        name: String,
    },
    SavePrivilegeToken {
        token: String,
    },
}

/// Lifecycle and progress notifications sent back to the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Event {
    DownloadProgress {
        current: usize,
        total: usize,
        #[serde(rename = "remainingTimeMs")]
        remaining_time_ms: u64,
    },
    DownloadComplete(Completion),
    #[serde(rename = "pauseDownloadUI")]
    PauseDownloadUi,
    #[serde(rename = "resumeDownloadUI")]
    ResumeDownloadUi,
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Completion {
    /// The whole batch was walked; `count` is the final cursor.
    All { count: usize },
    /// A single download finished successfully.
    Single { name: String },
}

impl Event {
    pub fn progress(current: usize, total: usize, remaining_time_ms: u64) -> Self {
        Self::DownloadProgress {
            current,
            total,
            remaining_time_ms,
        }
    }

    pub fn batch_complete(count: usize) -> Self {
        Self::DownloadComplete(Completion::All { count })
    }

    pub fn single_complete(name: impl Into<String>) -> Self {
        Self::DownloadComplete(Completion::Single { name: name.into() })
    }
}

/// Requests the downloader makes of the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PageRequest {
    GetPrivilegeToken,
}

/// Reply to [`PageRequest::GetPrivilegeToken`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
}
