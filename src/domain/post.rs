//! Generated posts and their illustrations.
//!
//! A post lives only for one invocation: generated, written, dropped.

use chrono::NaiveDate;

use super::topic::{file_stem, slugify};

/// Illustration bytes returned by the image service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageAsset {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// File extension for the MIME type (png when unknown)
    pub fn extension(&self) -> &'static str {
        match self.mime_type.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

/// A fully generated post, ready for the writer
#[derive(Debug, Clone)]
pub struct GeneratedPost {
    pub date: NaiveDate,
    pub topic: String,
    pub slug: String,
    /// MDX body without frontmatter
    pub body: String,
    pub image: ImageAsset,
}

impl GeneratedPost {
    pub fn new(date: NaiveDate, topic: impl Into<String>, body: String, image: ImageAsset) -> Self {
        let topic = topic.into();
        Self {
            date,
            slug: slugify(&topic),
            topic,
            body,
            image,
        }
    }

    pub fn file_stem(&self) -> String {
        file_stem(self.date, &self.slug)
    }

    pub fn mdx_file_name(&self) -> String {
        format!("{}.mdx", self.file_stem())
    }

    pub fn image_file_name(&self) -> String {
        format!("{}.{}", self.file_stem(), self.image.extension())
    }
}
