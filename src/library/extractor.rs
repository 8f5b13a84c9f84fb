//! Book text extraction with an on-disk cache.
//!
//! Each PDF's text is cached as `<cache_dir>/<book_id>.json`. A cache entry
//! is fresh while its extraction timestamp is not older than the PDF's
//! modification time; otherwise the PDF is parsed again.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::domain::{BookId, ExtractedBook};
use crate::error::{FinblogError, Result};

/// Turns a PDF file into plain text
pub type PdfParser = Arc<dyn Fn(&Path) -> std::result::Result<String, String> + Send + Sync>;

/// Extracts and caches textbook text
pub struct BookExtractor {
    cache_dir: PathBuf,
    parser: PdfParser,
}

impl BookExtractor {
    /// Extractor backed by `pdf-extract`
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            parser: Arc::new(parse_pdf),
        }
    }

    /// Replace the PDF parser
    pub fn with_parser(
        mut self,
        parser: impl Fn(&Path) -> std::result::Result<String, String> + Send + Sync + 'static,
    ) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    /// Cache file for a source PDF
    pub fn cache_path(&self, source: &Path) -> PathBuf {
        self.cache_dir
            .join(format!("{}.json", BookId::from_path(source)))
    }

    /// Return the book's text, parsing the PDF only when the cache is stale
    #[instrument(skip(self, source), fields(book = %source.display()))]
    pub async fn extract(&self, source: &Path) -> Result<ExtractedBook> {
        let modified = source_modified(source).await?;

        if let Some(cached) = self.load_cached(source).await {
            if cached.extraction_timestamp >= modified {
                debug!("Cache hit");
                return Ok(cached);
            }
            debug!(cached_at = %cached.extraction_timestamp, %modified, "Cache stale");
        }

        // Taken before parsing so an edit made mid-parse leaves the entry stale
        let started = Utc::now();
        let parser = self.parser.clone();
        let owned = source.to_path_buf();
        let text = tokio::task::spawn_blocking(move || parser(&owned))
            .await
            .map_err(|e| FinblogError::extraction(source, format!("PDF parser crashed: {}", e)))?
            .map_err(|reason| FinblogError::extraction(source, reason))?;

        let book = ExtractedBook::new(source, text).extracted_at(started);
        self.store(&book).await?;

        info!(chars = book.cached_text.len(), "Extracted book text");
        Ok(book)
    }

    /// Extract every `*.pdf` in a directory, sorted by path
    pub async fn extract_all(&self, books_dir: &Path) -> Result<Vec<ExtractedBook>> {
        let mut books = Vec::new();
        for path in find_pdfs(books_dir)? {
            books.push(self.extract(&path).await?);
        }
        Ok(books)
    }

    /// Drop the cache entry for a book; returns whether one existed
    pub async fn invalidate(&self, source: &Path) -> Result<bool> {
        let path = self.cache_path(source);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(FinblogError::write(path, e)),
        }
    }

    /// Read a cache entry; unreadable or mismatched entries count as misses
    async fn load_cached(&self, source: &Path) -> Option<ExtractedBook> {
        let path = self.cache_path(source);
        let content = fs::read_to_string(&path).await.ok()?;

        match serde_json::from_str::<ExtractedBook>(&content) {
            Ok(book) if book.source_path == source => Some(book),
            Ok(_) => {
                warn!(cache = %path.display(), "Cache entry belongs to another book, ignoring");
                None
            }
            Err(e) => {
                warn!(cache = %path.display(), error = %e, "Corrupt cache entry, ignoring");
                None
            }
        }
    }

    async fn store(&self, book: &ExtractedBook) -> Result<()> {
        fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| FinblogError::write(&self.cache_dir, e))?;

        let path = self.cache_path(&book.source_path);
        let json = serde_json::to_string_pretty(book)
            .map_err(|e| FinblogError::write(&path, std::io::Error::other(e)))?;

        fs::write(&path, json)
            .await
            .map_err(|e| FinblogError::write(&path, e))
    }
}

/// Modification time of the source PDF
async fn source_modified(source: &Path) -> Result<DateTime<Utc>> {
    let metadata = fs::metadata(source)
        .await
        .map_err(|e| FinblogError::extraction(source, format!("cannot read file: {}", e)))?;

    if !metadata.is_file() {
        return Err(FinblogError::extraction(source, "not a regular file"));
    }

    let modified = metadata
        .modified()
        .map_err(|e| FinblogError::extraction(source, format!("no modification time: {}", e)))?;

    Ok(DateTime::<Utc>::from(modified))
}

/// All PDFs directly inside `dir`, sorted
pub fn find_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(FinblogError::extraction(dir, "books directory does not exist"));
    }

    // The directory is matched literally; only the file name is a pattern
    let pattern = Path::new(&glob::Pattern::escape(&dir.to_string_lossy())).join("*.pdf");
    let options = glob::MatchOptions {
        case_sensitive: false,
        ..glob::MatchOptions::new()
    };
    let entries = glob::glob_with(&pattern.to_string_lossy(), options)
        .map_err(|e| FinblogError::extraction(dir, format!("bad glob pattern: {}", e)))?;

    let mut paths: Vec<PathBuf> = entries.filter_map(|entry| entry.ok()).collect();
    paths.sort();
    Ok(paths)
}

/// Parse a PDF with `pdf-extract`
fn parse_pdf(path: &Path) -> std::result::Result<String, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("cannot read PDF: {}", e))?;

    let text = pdf_extract::extract_text_from_mem(&bytes)
        .map_err(|e| format!("corrupt or unsupported PDF: {}", e))?;

    let cleaned = clean_pdf_text(&text);
    if cleaned.is_empty() {
        return Err("PDF contains no extractable text".to_string());
    }

    Ok(cleaned)
}

/// Clean up extracted PDF text
pub fn clean_pdf_text(text: &str) -> String {
    text.lines()
        .map(|line| line.replace(['\u{0}', '\u{FEFF}'], ""))
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_pdf_text() {
        let dirty = "  Hei  \n\n\n  \u{FEFF}Maailma\u{0}  \n  ";
        assert_eq!(clean_pdf_text(dirty), "Hei\nMaailma");
    }

    #[test]
    fn test_find_pdfs_sorted() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("b.pdf"), b"x").unwrap();
        std::fs::write(temp.path().join("a.pdf"), b"x").unwrap();
        std::fs::write(temp.path().join("notes.txt"), b"x").unwrap();

        let found = find_pdfs(temp.path()).unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[test]
    fn test_find_pdfs_missing_dir() {
        let err = find_pdfs(Path::new("/definitely/not/here")).unwrap_err();
        assert_eq!(err.kind(), "ExtractionError");
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_extraction_error() {
        let temp = TempDir::new().unwrap();
        let pdf = temp.path().join("broken.pdf");
        std::fs::write(&pdf, b"this is not a pdf").unwrap();

        let extractor = BookExtractor::new(temp.path().join("cache"));
        let err = extractor.extract(&pdf).await.unwrap_err();
        assert_eq!(err.kind(), "ExtractionError");
        assert!(!extractor.cache_path(&pdf).exists());
    }

    #[tokio::test]
    async fn test_parser_panic_is_extraction_error() {
        let temp = TempDir::new().unwrap();
        let pdf = temp.path().join("panics.pdf");
        std::fs::write(&pdf, b"%PDF-1.4").unwrap();

        let extractor = BookExtractor::new(temp.path().join("cache"))
            .with_parser(|_| panic!("unexpected object stream"));
        let err = extractor.extract(&pdf).await.unwrap_err();
        assert_eq!(err.kind(), "ExtractionError");
    }

    #[tokio::test]
    async fn test_invalidate() {
        let temp = TempDir::new().unwrap();
        let pdf = temp.path().join("kirja.pdf");
        std::fs::write(&pdf, b"%PDF-1.4").unwrap();

        let extractor = BookExtractor::new(temp.path().join("cache"))
            .with_parser(|_| Ok("Hei maailma".to_string()));
        extractor.extract(&pdf).await.unwrap();

        assert!(extractor.invalidate(&pdf).await.unwrap());
        assert!(!extractor.invalidate(&pdf).await.unwrap());
    }
}
