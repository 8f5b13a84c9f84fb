//! finblog - Daily Finnish-learning blog posts from textbook PDFs
//!
//! Extracts text from Finnish textbooks, picks a topic that was not covered
//! recently, asks Gemini for an MDX post and a header illustration, and
//! records each published date in a topic ledger.
//!
//! # Architecture
//!
//! The ledger is the single source of truth:
//! - A date appears in the ledger at most once
//! - A topic is only recorded after its post is on disk
//! - A failed run leaves the ledger untouched, so it can simply be re-run
//!
//! # Modules
//!
//! - `adapters`: External system integrations (Gemini)
//! - `core`: Ledger, generator and publisher
//! - `domain`: Data structures (TopicRecord, ExtractedBook, GeneratedPost)
//! - `library`: PDF extraction cache and post writer
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Cache textbook text
//! finblog extract-books
//!
//! # Publish the next post
//! finblog generate
//!
//! # Publish a week of posts starting on a given date
//! finblog generate --date 2026-02-01 --days 7
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod library;

// Re-export main types at crate root for convenience
pub use adapters::{GeminiClient, GenerativeService};
pub use crate::core::{ContentGenerator, Ledger, LedgerLock, PublishRequest, PublishedPost, Publisher};
pub use domain::{BookId, ExtractedBook, GeneratedPost, ImageAsset, TopicRecord};
pub use error::{FinblogError, Result};
pub use library::{BookExtractor, PostWriter, WrittenPost};
