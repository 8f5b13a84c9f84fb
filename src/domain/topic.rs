//! Topic records kept in the ledger.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Maximum slug length in characters
pub const MAX_SLUG_LEN: usize = 30;

/// A single (date, topic) entry in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecord {
    /// Publication date (unique across the ledger)
    pub date: NaiveDate,

    /// Human-readable topic label
    pub topic: String,

    /// Filesystem-safe form of the topic
    pub slug: String,

    /// When the record was written
    pub created_at: DateTime<Utc>,
}

impl TopicRecord {
    /// Create a record, deriving the slug from the topic
    pub fn new(date: NaiveDate, topic: impl Into<String>) -> Self {
        let topic = topic.into();
        Self {
            date,
            slug: slugify(&topic),
            topic,
            created_at: Utc::now(),
        }
    }

    /// File stem shared by the post and its image: `{date}-{slug}`
    pub fn file_stem(&self) -> String {
        file_stem(self.date, &self.slug)
    }
}

/// Build the `{date}-{slug}` stem used for output files
pub fn file_stem(date: NaiveDate, slug: &str) -> String {
    format!("{}-{}", date.format("%Y-%m-%d"), slug)
}

/// Derive a filesystem-safe slug from a topic.
///
/// Finnish and Swedish vowels are folded to ASCII before every other
/// non-alphanumeric run collapses to a single `-`.
pub fn slugify(topic: &str) -> String {
    let mut slug = String::with_capacity(topic.len());
    let mut pending_dash = false;

    for c in topic.chars().flat_map(char::to_lowercase) {
        let c = match c {
            'ä' | 'å' | 'á' | 'à' => 'a',
            'ö' | 'ó' | 'ò' => 'o',
            'é' | 'è' => 'e',
            'ü' => 'u',
            other => other,
        };

        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    let trimmed = slug.trim_end_matches('-');

    if trimmed.is_empty() {
        "post".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Finnish Greetings"), "finnish-greetings");
        assert_eq!(slugify("  Numbers: 1-10! "), "numbers-1-10");
    }

    #[test]
    fn test_slugify_folds_finnish_letters() {
        assert_eq!(slugify("Päivät ja kuukaudet"), "paivat-ja-kuukaudet");
        assert_eq!(slugify("Över ÅÄÖ"), "over-aao");
    }

    #[test]
    fn test_slugify_truncates() {
        let slug = slugify("The partitive case in everyday Finnish conversation");
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
        assert_eq!(slug, "the-partitive-case-in-everyday");
    }

    #[test]
    fn test_slugify_empty_falls_back() {
        assert_eq!(slugify("!!!"), "post");
        assert_eq!(slugify(""), "post");
    }

    #[test]
    fn test_file_stem() {
        let record = TopicRecord::new(
            NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            "Finnish Greetings",
        );
        assert_eq!(record.file_stem(), "2026-01-15-finnish-greetings");
    }
}
