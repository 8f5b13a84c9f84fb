//! Adapter interfaces for external systems.
//!
//! Adapters provide a unified interface for the hosted generative-AI
//! service so the generator can be exercised against an in-memory fake.

pub mod gemini;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::ImageAsset;

// Re-export the Gemini adapter
pub use gemini::GeminiClient;

/// Trait for text and image generation backends
#[async_trait]
pub trait GenerativeService: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// Generate text for a prompt
    async fn generate_text(&self, prompt: &str) -> Result<String>;

    /// Generate an image for a prompt
    async fn generate_image(&self, prompt: &str) -> Result<ImageAsset>;
}
