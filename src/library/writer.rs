//! Writes generated posts to the output directory.
//!
//! ```text
//! <output_dir>/
//! ├── 2026-01-15-finnish-greetings.mdx
//! └── 2026-01-15-finnish-greetings.png   # or <images_dir>/ when configured
//! ```
//!
//! Files are opened with create-new semantics; an existing file is never
//! overwritten.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::domain::{GeneratedPost, ImageAsset};
use crate::error::{FinblogError, Result};

/// Paths of a post written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenPost {
    pub mdx_path: PathBuf,
    pub image_path: PathBuf,
}

impl WrittenPost {
    /// Delete both files (rollback after a failed ledger write).
    ///
    /// Returns the paths that could not be removed.
    pub async fn remove(&self) -> Vec<PathBuf> {
        let mut left_behind = Vec::new();
        for path in [&self.mdx_path, &self.image_path] {
            if let Err(e) = fs::remove_file(path).await {
                if e.kind() != ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Failed to remove output file");
                    left_behind.push(path.clone());
                }
            }
        }
        left_behind
    }
}

/// Frontmatter written at the top of every post
#[derive(Debug, Serialize)]
struct Frontmatter<'a> {
    title: &'a str,
    date: String,
    slug: &'a str,
    image: String,
}

/// Serializes posts and illustrations to disk
#[derive(Debug, Clone)]
pub struct PostWriter {
    output_dir: PathBuf,
    images_dir: PathBuf,
}

impl PostWriter {
    pub fn new(output_dir: impl Into<PathBuf>, images_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            images_dir: images_dir.into(),
        }
    }

    pub fn mdx_path(&self, post: &GeneratedPost) -> PathBuf {
        self.output_dir.join(post.mdx_file_name())
    }

    pub fn image_path(&self, post: &GeneratedPost) -> PathBuf {
        self.images_dir.join(post.image_file_name())
    }

    /// How the post refers to its image
    fn image_reference(&self, file_name: &str) -> String {
        match self.images_dir.strip_prefix(&self.output_dir) {
            Ok(rel) if rel.as_os_str().is_empty() => format!("./{}", file_name),
            Ok(rel) => format!("./{}/{}", rel.to_string_lossy(), file_name),
            Err(_) => self.images_dir.join(file_name).to_string_lossy().to_string(),
        }
    }

    /// Render the MDX document: YAML frontmatter followed by the body
    pub fn render_mdx(&self, post: &GeneratedPost) -> Result<String> {
        let frontmatter = Frontmatter {
            title: &post.topic,
            date: post.date.format("%Y-%m-%d").to_string(),
            slug: &post.slug,
            image: self.image_reference(&post.image_file_name()),
        };

        let yaml = serde_yaml::to_string(&frontmatter).map_err(|e| {
            FinblogError::write(self.mdx_path(post), std::io::Error::other(e))
        })?;

        Ok(format!("---\n{}---\n\n{}\n", yaml, post.body.trim_end()))
    }

    /// Write the MDX file and its image.
    ///
    /// Both target paths are checked before anything is written; if the
    /// image cannot be written the MDX file is removed again.
    pub async fn write(&self, post: &GeneratedPost) -> Result<WrittenPost> {
        let mdx_path = self.mdx_path(post);
        let image_path = self.image_path(post);

        for path in [&mdx_path, &image_path] {
            if fs::try_exists(path).await.unwrap_or(false) {
                return Err(FinblogError::DuplicateOutput(path.clone()));
            }
        }

        let document = self.render_mdx(post)?;

        ensure_dir(&self.output_dir).await?;
        ensure_dir(&self.images_dir).await?;

        create_new(&mdx_path, document.as_bytes()).await?;
        if let Err(e) = create_new(&image_path, &post.image.bytes).await {
            let _ = fs::remove_file(&mdx_path).await;
            return Err(e);
        }

        info!(mdx = %mdx_path.display(), image = %image_path.display(), "Wrote post");
        Ok(WrittenPost {
            mdx_path,
            image_path,
        })
    }

    /// Write a standalone image (vocabulary cards) into the images directory
    pub async fn write_image(&self, file_stem: &str, image: &ImageAsset) -> Result<PathBuf> {
        let path = self
            .images_dir
            .join(format!("{}.{}", file_stem, image.extension()));

        ensure_dir(&self.images_dir).await?;
        create_new(&path, &image.bytes).await?;

        info!(image = %path.display(), "Wrote image");
        Ok(path)
    }
}

async fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| FinblogError::write(dir, e))
}

/// Create `path` and write `bytes`, refusing to replace an existing file
async fn create_new(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => FinblogError::DuplicateOutput(path.to_path_buf()),
            _ => FinblogError::write(path, e),
        })?;

    let written = async {
        file.write_all(bytes).await?;
        file.sync_all().await
    }
    .await;

    if let Err(e) = written {
        drop(file);
        let _ = fs::remove_file(path).await;
        return Err(FinblogError::write(path, e));
    }

    Ok(())
}
