use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::PdfArtifact;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// What to do when the target filename is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    #[default]
    Overwrite,
    /// Save as `name (1).pdf`, `name (2).pdf`, ...
    Uniquify,
}

/// Non-interactive save-to-disk of a finished document.
pub trait ArtifactSink: Send + Sync {
    fn save(&self, filename: &str, artifact: &PdfArtifact) -> Result<PathBuf, PersistError>;
}

/// Saves artifacts into one directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    writer: AtomicFileWriter,
    conflict: ConflictPolicy,
}

impl DirectorySink {
    pub fn new(dir: PathBuf, conflict: ConflictPolicy) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
            conflict,
        }
    }

    fn resolve_filename(&self, filename: &str) -> String {
        if self.conflict == ConflictPolicy::Overwrite
            || !self.writer.dir().join(filename).exists()
        {
            return filename.to_string();
        }
        let path = Path::new(filename);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        (1..)
            .map(|n| format!("{stem} ({n}){extension}"))
            .find(|candidate| !self.writer.dir().join(candidate).exists())
            .unwrap_or_else(|| filename.to_string())
    }
}

impl ArtifactSink for DirectorySink {
    fn save(&self, filename: &str, artifact: &PdfArtifact) -> Result<PathBuf, PersistError> {
        let filename = self.resolve_filename(filename);
        self.writer.write(&filename, &artifact.bytes)
    }
}
