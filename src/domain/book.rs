//! Cached book text.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Cache identifier for a book (SHA256(path)[0:8], hex encoded)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(String);

impl BookId {
    /// Create a book ID from its source path
    pub fn from_path(path: &Path) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(path.to_string_lossy().as_bytes());
        let result = hasher.finalize();

        Self(hex::encode(&result[..8]))
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

/// Plain text extracted from one textbook PDF
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedBook {
    /// PDF the text came from
    pub source_path: PathBuf,

    /// Cleaned text
    pub cached_text: String,

    /// When the PDF was parsed
    pub extraction_timestamp: DateTime<Utc>,
}

impl ExtractedBook {
    pub fn new(source_path: impl Into<PathBuf>, cached_text: String) -> Self {
        Self {
            source_path: source_path.into(),
            cached_text,
            extraction_timestamp: Utc::now(),
        }
    }

    /// Override the extraction timestamp
    pub fn extracted_at(mut self, at: DateTime<Utc>) -> Self {
        self.extraction_timestamp = at;
        self
    }

    /// Display title (file stem of the source PDF)
    pub fn title(&self) -> String {
        self.source_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Untitled".to_string())
    }
}
