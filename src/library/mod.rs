//! Files finblog reads and writes outside the ledger.
//!
//! # Storage Layout
//!
//! ```text
//! <books_dir>/
//! └── *.pdf                     # Source textbooks
//! <cache_dir>/
//! └── <book_id>.json            # SHA256(path)[0:8] hex, extracted text
//! <output_dir>/
//! ├── <date>-<slug>.mdx         # Generated post
//! └── <date>-<slug>.png         # Header image (or <images_dir>/)
//! ```

pub mod extractor;
pub mod writer;

pub use extractor::{clean_pdf_text, find_pdfs, BookExtractor, PdfParser};
pub use writer::{PostWriter, WrittenPost};
