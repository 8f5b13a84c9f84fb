//! Post publishing: one transaction per date.
//!
//! For every date the publisher picks the date and topic from the ledger,
//! generates the post, writes its files and finally records the topic. A
//! failure at any step stops the run; completed posts stay, later days are
//! not attempted. If recording fails the freshly written files are removed.

use std::path::PathBuf;

use chrono::{Days, NaiveDate};
use tracing::{error, info, instrument};

use crate::config::TopicSettings;
use crate::domain::{ExtractedBook, TopicRecord};
use crate::error::{FinblogError, Result};
use crate::library::{PostWriter, WrittenPost};

use super::generator::ContentGenerator;
use super::ledger::Ledger;

/// What the caller asked `generate` to do
#[derive(Debug, Clone)]
pub struct PublishRequest {
    /// First date to publish (next free date when absent)
    pub date: Option<NaiveDate>,
    /// Number of consecutive posts
    pub days: u32,
    /// Topic forced for the first post
    pub topic: Option<String>,
    /// Custom description for the header image
    pub image_prompt: Option<String>,
}

impl Default for PublishRequest {
    fn default() -> Self {
        Self {
            date: None,
            days: 1,
            topic: None,
            image_prompt: None,
        }
    }
}

/// A post that made it all the way into the ledger
#[derive(Debug, Clone)]
pub struct PublishedPost {
    pub record: TopicRecord,
    pub files: WrittenPost,
}

/// Runs the per-date generate/write/record sequence
pub struct Publisher<'a> {
    ledger: &'a mut Ledger,
    generator: &'a ContentGenerator,
    writer: &'a PostWriter,
    topics: &'a TopicSettings,
}

impl<'a> Publisher<'a> {
    pub fn new(
        ledger: &'a mut Ledger,
        generator: &'a ContentGenerator,
        writer: &'a PostWriter,
        topics: &'a TopicSettings,
    ) -> Self {
        Self {
            ledger,
            generator,
            writer,
            topics,
        }
    }

    /// Publish `request.days` posts strictly one after another
    #[instrument(skip(self, request, books), fields(days = request.days))]
    pub async fn publish(
        &mut self,
        request: &PublishRequest,
        books: &[ExtractedBook],
        today: NaiveDate,
    ) -> Result<Vec<PublishedPost>> {
        if request.days == 0 {
            return Err(FinblogError::Config("--days must be at least 1".to_string()));
        }

        let mut published = Vec::new();

        for day in 0..request.days {
            let requested = match request.date {
                Some(start) => Some(start.checked_add_days(Days::new(day.into())).ok_or_else(
                    || FinblogError::Config(format!("date out of range: {} + {} days", start, day)),
                )?),
                None => None,
            };
            let forced = if day == 0 { request.topic.as_deref() } else { None };

            match self
                .publish_one(requested, forced, request.image_prompt.as_deref(), books, today)
                .await
            {
                Ok(post) => published.push(post),
                Err(e) => {
                    error!(
                        day = day + 1,
                        of = request.days,
                        completed = published.len(),
                        error = %e,
                        "Stopping: post failed"
                    );
                    return Err(e);
                }
            }
        }

        Ok(published)
    }

    async fn publish_one(
        &mut self,
        requested: Option<NaiveDate>,
        forced_topic: Option<&str>,
        image_prompt: Option<&str>,
        books: &[ExtractedBook],
        today: NaiveDate,
    ) -> Result<PublishedPost> {
        let window = self.topics.recency_window;
        let date = self.ledger.next_date(requested, today)?;

        let topic = match forced_topic.map(str::trim) {
            Some(topic) if !topic.is_empty() => {
                self.ledger.validate_topic(topic, window)?;
                topic.to_string()
            }
            Some(_) => return Err(FinblogError::Config("--topic cannot be empty".to_string())),
            None => self.ledger.choose_topic(&self.topics.catalog, window)?,
        };

        info!(%date, topic = %topic, "Generating post");

        let recent = self.ledger.recent(window).to_vec();
        let post = self
            .generator
            .generate(date, &topic, books, &recent, image_prompt)
            .await?;

        let files = self.writer.write(&post).await?;

        let record = match self.ledger.record(date, &topic) {
            Ok(record) => record,
            Err(e) => {
                let left_behind = files.remove().await;
                return Err(with_left_behind(e, &left_behind));
            }
        };

        info!(%date, mdx = %files.mdx_path.display(), "Published post");
        Ok(PublishedPost { record, files })
    }
}

/// Name any output files a failed rollback could not delete
fn with_left_behind(err: FinblogError, left_behind: &[PathBuf]) -> FinblogError {
    if left_behind.is_empty() {
        return err;
    }

    let files = left_behind
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");

    match err {
        FinblogError::Persistence { path, reason } => FinblogError::Persistence {
            path,
            reason: format!("{}; output files left behind: {}", reason, files),
        },
        other => other,
    }
}
