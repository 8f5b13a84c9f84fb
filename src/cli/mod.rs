//! Command-line interface for finblog.
//!
//! Provides commands for caching textbook text, generating posts,
//! inspecting the topic ledger and showing the resolved configuration.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::adapters::GeminiClient;
use crate::config::{load_config, ResolvedConfig};
use crate::core::{ContentGenerator, Ledger, LedgerLock, PublishRequest, Publisher};
use crate::domain::{slugify, BookId, ExtractedBook};
use crate::error::FinblogError;
use crate::library::{find_pdfs, BookExtractor, PostWriter};

/// finblog - Daily Finnish-learning blog posts from textbook PDFs
#[derive(Parser, Debug)]
#[command(name = "finblog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract and cache text from the textbook PDFs
    ExtractBooks {
        /// Re-parse every PDF even when its cache entry is fresh
        #[arg(short, long)]
        force: bool,
    },

    /// Generate blog posts
    Generate {
        /// Date of the first post (YYYY-MM-DD, defaults to the next free day)
        #[arg(short, long)]
        date: Option<String>,

        /// Number of consecutive daily posts
        #[arg(short = 'n', long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
        days: u32,

        /// Topic for the first post (chosen from the catalog if not specified)
        #[arg(short, long)]
        topic: Option<String>,

        /// Custom description for the header image
        #[arg(long)]
        image_prompt: Option<String>,
    },

    /// Show the recency window and the next topic
    Topics {
        /// List every ledger entry instead
        #[arg(short, long)]
        list: bool,
    },

    /// Generate a vocabulary card illustration for one word
    VocabCard {
        /// Finnish word
        #[arg(short, long)]
        word: String,

        /// English translation
        #[arg(short, long)]
        translation: String,

        /// Date used in the file name (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::ExtractBooks { force } => extract_books(force).await,
            Commands::Generate {
                date,
                days,
                topic,
                image_prompt,
            } => {
                let request = PublishRequest {
                    date: date.as_deref().map(parse_date).transpose()?,
                    days,
                    topic,
                    image_prompt,
                };
                generate(request).await
            }
            Commands::Topics { list } => show_topics(list).await,
            Commands::VocabCard {
                word,
                translation,
                date,
            } => {
                let date = date.as_deref().map(parse_date).transpose()?;
                vocab_card(&word, &translation, date).await
            }
            Commands::Config => show_config().await,
        }
    }
}

/// Parse a YYYY-MM-DD argument
fn parse_date(raw: &str) -> std::result::Result<NaiveDate, FinblogError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        FinblogError::Config(format!("invalid date '{}', expected YYYY-MM-DD", raw))
    })
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Gemini-backed generator built from the resolved configuration
fn build_generator(config: &ResolvedConfig) -> Result<ContentGenerator> {
    let api_key = config.require_api_key()?;
    let client = GeminiClient::new(api_key, &config.gemini, config.generation.timeout())
        .context("Failed to create Gemini client")?;

    Ok(ContentGenerator::new(
        Box::new(client),
        config.generation.clone(),
    ))
}

/// Extract every PDF in the books directory into the cache
async fn extract_books(force: bool) -> Result<()> {
    let config = load_config()?;
    let extractor = BookExtractor::new(&config.cache_dir);

    let pdfs = find_pdfs(&config.books_dir)?;
    if pdfs.is_empty() {
        println!("No PDFs found in {}", config.books_dir.display());
        return Ok(());
    }

    println!("{:<18} {:>10}  {}", "BOOK ID", "CHARS", "FILE");
    println!("{}", "-".repeat(70));

    for pdf in pdfs {
        if force && extractor.invalidate(&pdf).await? {
            info!(book = %pdf.display(), "Dropped cached text");
        }

        let book = extractor.extract(&pdf).await?;
        println!(
            "{:<18} {:>10}  {}",
            BookId::from_path(&book.source_path),
            book.cached_text.chars().count(),
            pdf.display()
        );
    }

    println!();
    println!("Cache: {}", config.cache_dir.display());

    Ok(())
}

/// Cached books, or none when the books directory does not exist
async fn load_books(config: &ResolvedConfig) -> Result<Vec<ExtractedBook>> {
    if !config.books_dir.is_dir() {
        warn!(
            books_dir = %config.books_dir.display(),
            "Books directory not found, generating without textbook excerpts"
        );
        return Ok(Vec::new());
    }

    let extractor = BookExtractor::new(&config.cache_dir);
    Ok(extractor.extract_all(&config.books_dir).await?)
}

/// Generate, write and record posts
async fn generate(request: PublishRequest) -> Result<()> {
    let config = load_config()?;
    let generator = build_generator(&config)?;

    let _lock = LedgerLock::acquire(config.lock_path())?;
    let mut ledger = Ledger::load(config.ledger_path())?;

    let books = load_books(&config).await?;
    let writer = PostWriter::new(&config.output_dir, &config.images_dir);

    let mut publisher = Publisher::new(&mut ledger, &generator, &writer, &config.topics);
    let published = publisher.publish(&request, &books, today()).await?;

    for post in &published {
        println!(
            "{}  {:<30}  {}",
            post.record.date,
            post.record.topic,
            post.files.mdx_path.display()
        );
    }

    eprintln!("\n[{} post(s) published]", published.len());
    Ok(())
}

/// Show the ledger
async fn show_topics(list: bool) -> Result<()> {
    let config = load_config()?;
    let ledger = Ledger::load(config.ledger_path())?;
    let window = config.topics.recency_window;

    if list {
        if ledger.is_empty() {
            println!("No topics recorded yet");
            return Ok(());
        }

        println!("{:<12} {:<32} {:<30}", "DATE", "TOPIC", "SLUG");
        println!("{}", "-".repeat(76));
        for record in ledger.list() {
            println!("{:<12} {:<32} {:<30}", record.date, record.topic, record.slug);
        }
        return Ok(());
    }

    println!("Ledger:         {}", ledger.path().display());
    println!("Posts recorded: {}", ledger.len());
    println!();
    println!("Recency window (last {}):", window);
    let recent = ledger.recent(window);
    if recent.is_empty() {
        println!("  (empty)");
    }
    for record in recent {
        println!("  {}  {}", record.date, record.topic);
    }
    println!();
    println!("Next date:  {}", ledger.next_date(None, today())?);
    println!("Next topic: {}", ledger.choose_topic(&config.topics.catalog, window)?);

    Ok(())
}

/// Generate and save a vocabulary card image
async fn vocab_card(word: &str, translation: &str, date: Option<NaiveDate>) -> Result<()> {
    let (word, translation) = (word.trim(), translation.trim());
    if word.is_empty() || translation.is_empty() {
        return Err(FinblogError::Config("--word and --translation cannot be empty".to_string()).into());
    }

    let config = load_config()?;
    let generator = build_generator(&config)?;
    let writer = PostWriter::new(&config.output_dir, &config.images_dir);

    let date = date.unwrap_or_else(today);
    let image = generator.vocabulary_card(word, translation).await?;
    let stem = format!("{}-vocab-{}", date.format("%Y-%m-%d"), slugify(word));
    let path = writer.write_image(&stem, &image).await?;

    println!("{}", path.display());
    Ok(())
}

/// Show the resolved configuration
async fn show_config() -> Result<()> {
    let cfg = load_config()?;

    println!("finblog configuration");
    println!("{}", "=".repeat(60));
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home (state): {}", cfg.home.display());
    println!("  Ledger:       {}", cfg.ledger_path().display());
    println!("  Books:        {}", cfg.books_dir.display());
    println!("  Cache:        {}", cfg.cache_dir.display());
    println!("  Output:       {}", cfg.output_dir.display());
    println!("  Images:       {}", cfg.images_dir.display());
    println!();
    println!("Gemini:");
    println!("  API key:      {}", cfg.masked_api_key());
    println!("  Text model:   {}", cfg.gemini.text_model);
    println!("  Image model:  {}", cfg.gemini.image_model);
    println!("  Base URL:     {}", cfg.gemini.base_url);
    println!();
    println!("Topics:");
    println!("  Recency window: {}", cfg.topics.recency_window);
    println!("  Catalog:        {} topics", cfg.topics.catalog.len());
    println!();
    println!("Generation:");
    println!("  Image style:       {}", cfg.generation.image_style);
    println!("  Max excerpt chars: {}", cfg.generation.max_excerpt_chars);
    println!("  Timeout:           {}s", cfg.generation.timeout_seconds);
    println!("  Retry delay:       {}ms", cfg.generation.retry_delay_ms);

    Ok(())
}
