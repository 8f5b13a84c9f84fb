//! Domain types for finblog.
//!
//! - Topic: ledger records and slug derivation
//! - Book: cached PDF text
//! - Post: generated MDX body plus illustration

pub mod book;
pub mod post;
pub mod topic;

// Re-export commonly used types
pub use book::{BookId, ExtractedBook};
pub use post::{GeneratedPost, ImageAsset};
pub use topic::{file_stem, slugify, TopicRecord};
