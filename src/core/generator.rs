//! Content generation: prompts, excerpt selection and calls to the
//! generative service.
//!
//! The generator has no side effects. It either returns a complete
//! [`GeneratedPost`] or a `GenerationError`; writing and recording are left
//! to the caller.

use chrono::NaiveDate;
use tracing::{info, instrument};

use crate::adapters::GenerativeService;
use crate::config::GenerationSettings;
use crate::domain::{ExtractedBook, GeneratedPost, ImageAsset, TopicRecord};
use crate::error::{FinblogError, Result};

use super::retry::RetryPolicy;

/// Minimum keyword length used when matching book passages
const MIN_KEYWORD_LEN: usize = 4;

/// Lines are grouped into passages of roughly this many characters
const PASSAGE_CHARS: usize = 400;

/// A slice of one book offered to the model as source material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excerpt {
    pub book_title: String,
    pub text: String,
}

/// Builds prompts and turns service replies into posts
pub struct ContentGenerator {
    service: Box<dyn GenerativeService>,
    settings: GenerationSettings,
    retry: RetryPolicy,
}

impl ContentGenerator {
    pub fn new(service: Box<dyn GenerativeService>, settings: GenerationSettings) -> Self {
        let retry = RetryPolicy::once(settings.retry_delay());
        Self {
            service,
            settings,
            retry,
        }
    }

    /// Generate the body and header image for one post
    #[instrument(skip(self, books, recent, image_prompt), fields(service = self.service.name()))]
    pub async fn generate(
        &self,
        date: NaiveDate,
        topic: &str,
        books: &[ExtractedBook],
        recent: &[TopicRecord],
        image_prompt: Option<&str>,
    ) -> Result<GeneratedPost> {
        let excerpts = select_excerpts(books, topic, self.settings.max_excerpt_chars);
        let prompt = post_prompt(date, topic, recent, &excerpts);

        let service = &self.service;
        let prompt = &prompt;
        let body = self
            .retry
            .run("text", move || async move {
                let reply = service.generate_text(prompt).await?;
                let body = strip_code_fence(&reply);
                if body.is_empty() {
                    anyhow::bail!("model returned an empty post body");
                }
                Ok(body)
            })
            .await
            .map_err(generation_error)?;

        let description = image_prompt
            .map(str::to_string)
            .unwrap_or_else(|| header_image_description(topic));
        let image = self.image(&description, &self.settings.image_style).await?;

        info!(%date, topic, excerpts = excerpts.len(), "Generated post");
        Ok(GeneratedPost::new(date, topic, body, image))
    }

    /// Generate a flashcard-style illustration for a single word
    pub async fn vocabulary_card(&self, word: &str, translation: &str) -> Result<ImageAsset> {
        let description = vocabulary_card_description(word, translation);
        self.image(&description, "simple icon illustration").await
    }

    async fn image(&self, description: &str, style: &str) -> Result<ImageAsset> {
        let prompt = image_prompt(description, style);
        let service = &self.service;
        let prompt = prompt.as_str();
        self.retry
            .run("image", move || service.generate_image(prompt))
            .await
            .map_err(generation_error)
    }
}

fn generation_error((attempts, e): (u32, anyhow::Error)) -> FinblogError {
    FinblogError::Generation {
        attempts,
        reason: format!("{:#}", e),
    }
}

/// Lowercased topic words long enough to be meaningful
fn keywords(topic: &str) -> Vec<String> {
    topic
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_KEYWORD_LEN)
        .map(str::to_lowercase)
        .collect()
}

/// Group consecutive lines into passages of about [`PASSAGE_CHARS`]
fn passages(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(line);

        if current.len() >= PASSAGE_CHARS {
            out.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        out.push(current);
    }

    out
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Pick book passages relevant to the topic, within `max_chars` in total.
///
/// Passages mentioning a topic keyword are taken in book order. When none
/// match, the opening of each book fills the budget instead.
pub fn select_excerpts(books: &[ExtractedBook], topic: &str, max_chars: usize) -> Vec<Excerpt> {
    let keywords = keywords(topic);
    let mut budget = max_chars;
    let mut excerpts = Vec::new();

    if !keywords.is_empty() {
        'books: for book in books {
            for passage in passages(&book.cached_text) {
                let lower = passage.to_lowercase();
                if !keywords.iter().any(|k| lower.contains(k.as_str())) {
                    continue;
                }
                if budget == 0 {
                    break 'books;
                }
                let text = truncate_chars(&passage, budget).to_string();
                budget = budget.saturating_sub(text.chars().count());
                excerpts.push(Excerpt {
                    book_title: book.title(),
                    text,
                });
            }
        }
    }

    if excerpts.is_empty() && !books.is_empty() {
        let share = (max_chars / books.len()).max(1);
        for book in books {
            let text = truncate_chars(book.cached_text.trim(), share).trim().to_string();
            if !text.is_empty() {
                excerpts.push(Excerpt {
                    book_title: book.title(),
                    text,
                });
            }
        }
    }

    excerpts
}

/// Prompt asking for the MDX body of one post
pub fn post_prompt(date: NaiveDate, topic: &str, recent: &[TopicRecord], excerpts: &[Excerpt]) -> String {
    let mut prompt = format!(
        "You are writing a daily blog post for English speakers learning Finnish.\n\n\
         Date: {}\n\
         Topic: {}\n\n\
         Write an engaging, beginner-friendly post of 500-800 words about the topic. Include:\n\
         - a short introduction explaining why the topic matters in everyday Finnish life\n\
         - key vocabulary as a Markdown table (Finnish | English | notes)\n\
         - at least three example sentences with translations\n\
         - a short practice exercise with answers at the end\n\n\
         Output only the post body as MDX (Markdown). Do not include frontmatter, \
         a top-level title, or code fences around the whole answer.\n",
        date.format("%Y-%m-%d"),
        topic
    );

    if !recent.is_empty() {
        let covered: Vec<&str> = recent.iter().map(|r| r.topic.as_str()).collect();
        prompt.push_str(&format!(
            "\nRecently covered topics (avoid repeating their content): {}\n",
            covered.join(", ")
        ));
    }

    if !excerpts.is_empty() {
        prompt.push_str(
            "\nBase vocabulary and examples on these textbook excerpts where possible:\n",
        );
        for excerpt in excerpts {
            prompt.push_str(&format!("\n[{}]\n{}\n", excerpt.book_title, excerpt.text));
        }
    }

    prompt
}

/// Default header illustration description for a topic
pub fn header_image_description(topic: &str) -> String {
    format!(
        "A warm, inviting illustration representing \"{}\" for Finnish language learners. \
         The scene should evoke Finland's culture and lifestyle while being educational \
         and approachable.",
        topic
    )
}

pub fn vocabulary_card_description(word: &str, translation: &str) -> String {
    format!(
        "A simple, clean illustration representing the Finnish word \"{}\" \
         (meaning \"{}\" in English). The image should be iconic and memorable, helping \
         learners associate the visual with the word. No text should be in the image.",
        word, translation
    )
}

/// Full image prompt in the blog's house style
pub fn image_prompt(description: &str, style: &str) -> String {
    format!(
        "Create a {} for a Finnish language learning blog.\n\n\
         Image description: {}\n\n\
         Requirements:\n\
         - Clean, professional design suitable for educational content\n\
         - Warm, inviting colors (consider Finnish nature: blues, greens, whites)\n\
         - No text in the image (text will be added separately)\n\
         - Simple composition that works well as a blog header\n\
         - Modern, minimalist aesthetic\n",
        style, description
    )
}

/// Remove a Markdown code fence wrapped around the whole reply
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();

    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(inner) = rest.strip_suffix("```") {
            // Drop the info string (```mdx, ```markdown) on the opening line
            let inner = match inner.find('\n') {
                Some(idx) => &inner[idx + 1..],
                None => "",
            };
            return inner.trim().to_string();
        }
    }

    trimmed.to_string()
}
