//! Persistence for diagnostic snapshots.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures raised while persisting or reading diagnostics.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The backing store could not be read or written.
    #[error("diagnostic store i/o failed: {0}")]
    Io(#[from] io::Error),
    /// A stored payload is not valid JSON.
    #[error("diagnostic payload is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value store receiving serialized diagnostic snapshots.
pub trait DiagnosticSink: fmt::Debug {
    /// Stores `payload` under `key`, replacing any previous value.
    fn store(&mut self, key: &str, payload: &str) -> Result<(), SinkError>;

    /// Reads the payload stored under `key`.
    fn load(&self, key: &str) -> Result<Option<String>, SinkError>;
}

/// Sink that keeps payloads in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    entries: BTreeMap<String, String>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiagnosticSink for MemorySink {
    fn store(&mut self, key: &str, payload: &str) -> Result<(), SinkError> {
        let _ = self.entries.insert(key.to_owned(), payload.to_owned());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>, SinkError> {
        Ok(self.entries.get(key).cloned())
    }
}

/// Sink that writes one `<key>.json` file per key inside a directory.
#[derive(Clone, Debug)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    /// Creates a sink rooted at `dir`. The directory is created on first store.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the stored payloads.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl DiagnosticSink for FileSink {
    fn store(&mut self, key: &str, payload: &str) -> Result<(), SinkError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), payload)?;
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>, SinkError> {
        match fs::read_to_string(self.path(key)) {
            Ok(payload) => Ok(Some(payload)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }
}
