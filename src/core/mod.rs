//! Core publishing logic.
//!
//! This module contains:
//! - Ledger: persisted (date, topic) history and topic selection
//! - LedgerLock: single-writer guard for the ledger
//! - Generator: prompts and calls to the generative service
//! - Publisher: the per-date generate/write/record sequence
//! - RetryPolicy: single retry around service calls

pub mod generator;
pub mod ledger;
pub mod lock;
pub mod publisher;
pub mod retry;

// Re-export commonly used types
pub use generator::{ContentGenerator, Excerpt};
pub use ledger::Ledger;
pub use lock::LedgerLock;
pub use publisher::{PublishRequest, PublishedPost, Publisher};
pub use retry::RetryPolicy;
