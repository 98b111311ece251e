//! Saving exported codes to disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use qr_engine::decode_data_uri;
use serde::Serialize;

/// Upper bound on `name (n).png` probing.
const MAX_SUFFIX: u32 = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("Invalid download payload: {0}")]
    Payload(#[from] qr_engine::QrEngineError),

    #[error("Invalid file name: {0:?}")]
    FileName(String),

    #[error("No free file name for {0:?}")]
    NameExhausted(String),

    #[error("Failed to write download: {0}")]
    Io(#[from] std::io::Error),
}

/// A completed download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedFile {
    pub filename: String,
    pub path: PathBuf,
    pub bytes: usize,
}

/// Performs the "save as file" step of a download.
pub trait Saver: Send + Sync {
    fn save(&self, data_uri: &str, filename: &str) -> Result<SavedFile, SaveError>;
}

/// Writes downloads into a directory, never overwriting existing files.
#[derive(Debug, Clone)]
pub struct FileSaver {
    dir: PathBuf,
}

impl FileSaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Saver for FileSaver {
    fn save(&self, data_uri: &str, filename: &str) -> Result<SavedFile, SaveError> {
        if filename.is_empty()
            || filename.contains(['/', '\\'])
            || filename == "."
            || filename == ".."
        {
            return Err(SaveError::FileName(filename.to_string()));
        }

        let payload = decode_data_uri(data_uri)?;
        std::fs::create_dir_all(&self.dir)?;

        for n in 0..MAX_SUFFIX {
            let candidate = numbered_name(filename, n);
            let path = self.dir.join(&candidate);
            match std::fs::OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    std::io::Write::write_all(&mut file, &payload.bytes)?;
                    tracing::info!(
                        path = %path.display(),
                        bytes = payload.bytes.len(),
                        "Saved download"
                    );
                    return Ok(SavedFile {
                        filename: candidate,
                        path,
                        bytes: payload.bytes.len(),
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(SaveError::NameExhausted(filename.to_string()))
    }
}

/// `qr-code.png` → `qr-code (n).png`, the way browsers de-duplicate downloads.
fn numbered_name(filename: &str, n: u32) -> String {
    if n == 0 {
        return filename.to_string();
    }
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({n}).{ext}"),
        _ => format!("{filename} ({n})"),
    }
}
