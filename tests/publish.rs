//! Publisher Integration Tests
//!
//! End-to-end `generate` scenarios against a scripted in-memory
//! generative service.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use finblog::adapters::GenerativeService;
use finblog::config::{GenerationSettings, TopicSettings};
use finblog::core::{ContentGenerator, Ledger, PublishRequest, Publisher};
use finblog::domain::{ExtractedBook, ImageAsset};
use finblog::error::FinblogError;
use finblog::library::PostWriter;
use tempfile::TempDir;

/// Replies to text prompts from a script; `None` is a failed call
struct ScriptedService {
    text_replies: Mutex<VecDeque<Option<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl GenerativeService for ScriptedService {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate_text(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.text_replies.lock().unwrap().pop_front() {
            Some(Some(reply)) => Ok(reply),
            Some(None) => anyhow::bail!("500 internal error"),
            None => anyhow::bail!("script exhausted"),
        }
    }

    async fn generate_image(&self, _prompt: &str) -> anyhow::Result<ImageAsset> {
        Ok(ImageAsset::new(vec![0x89, b'P', b'N', b'G'], "image/png"))
    }
}

struct Harness {
    temp: TempDir,
    generator: ContentGenerator,
    writer: PostWriter,
    topics: TopicSettings,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl Harness {
    fn new(script: Vec<Option<&str>>) -> Self {
        let temp = TempDir::new().unwrap();
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let service = ScriptedService {
            text_replies: Mutex::new(script.into_iter().map(|r| r.map(str::to_string)).collect()),
            prompts: prompts.clone(),
        };
        let settings = GenerationSettings {
            retry_delay_ms: 0,
            ..GenerationSettings::default()
        };
        let writer = PostWriter::new(temp.path().join("posts"), temp.path().join("posts"));
        let topics = TopicSettings {
            recency_window: 10,
            catalog: vec![
                "Finnish Greetings".to_string(),
                "Numbers and Counting".to_string(),
                "Sauna Culture".to_string(),
            ],
        };

        Self {
            generator: ContentGenerator::new(Box::new(service), settings),
            writer,
            topics,
            prompts,
            temp,
        }
    }

    fn ledger_path(&self) -> PathBuf {
        self.temp.path().join("state/ledger.json")
    }

    fn ledger(&self) -> Ledger {
        std::fs::create_dir_all(self.temp.path().join("state")).unwrap();
        Ledger::load(self.ledger_path()).unwrap()
    }

    fn post_path(&self, name: &str) -> PathBuf {
        self.temp.path().join("posts").join(name)
    }

    fn output_files(&self) -> Vec<String> {
        let dir = self.temp.path().join("posts");
        if !dir.exists() {
            return Vec::new();
        }
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    async fn publish(
        &self,
        ledger: &mut Ledger,
        request: PublishRequest,
    ) -> Result<Vec<finblog::core::PublishedPost>, FinblogError> {
        let books = vec![ExtractedBook::new(
            "/books/suomen-mestari.pdf",
            "Tervehdykset: hei, moi, huomenta.\nGreetings are short in Finnish.".to_string(),
        )];
        let mut publisher = Publisher::new(ledger, &self.generator, &self.writer, &self.topics);
        let result = publisher.publish(&request, &books, today()).await;
        result
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 14).unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
}

const BODY: &str = "## Hei!\n\nTervetuloa suomen kurssille.";

#[tokio::test]
async fn test_first_post_goes_to_tomorrow() {
    let harness = Harness::new(vec![Some(BODY)]);
    let mut ledger = harness.ledger();

    let published = harness
        .publish(&mut ledger, PublishRequest::default())
        .await
        .unwrap();

    assert_eq!(published.len(), 1);
    assert_eq!(published[0].record.date, day(15));
    assert_eq!(published[0].record.topic, "Finnish Greetings");

    assert_eq!(
        harness.output_files(),
        vec!["2026-01-15-finnish-greetings.mdx", "2026-01-15-finnish-greetings.png"]
    );
    let mdx = std::fs::read_to_string(harness.post_path("2026-01-15-finnish-greetings.mdx")).unwrap();
    assert!(mdx.contains("Tervetuloa suomen kurssille."));

    // Persisted, not just in memory
    let reloaded = Ledger::load(harness.ledger_path()).unwrap();
    assert_eq!(reloaded.list(), published.iter().map(|p| p.record.clone()).collect::<Vec<_>>().as_slice());

    // Book passages mentioning the topic reached the prompt
    let prompts = harness.prompts.lock().unwrap();
    assert!(prompts[0].contains("Greetings are short in Finnish."));
}

#[tokio::test]
async fn test_duplicate_date_writes_nothing() {
    let harness = Harness::new(vec![Some(BODY)]);
    let mut ledger = harness.ledger();
    ledger.record(day(15), "Finnish Greetings").unwrap();

    let request = PublishRequest {
        date: Some(day(15)),
        ..PublishRequest::default()
    };
    let err = harness.publish(&mut ledger, request).await.unwrap_err();

    assert!(matches!(err, FinblogError::DuplicateDate(d) if d == day(15)));
    assert_eq!(err.exit_code(), 2);
    assert!(harness.output_files().is_empty());
    assert!(harness.prompts.lock().unwrap().is_empty());
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn test_failure_on_day_two_stops_run() {
    // Day 1 succeeds, day 2 fails on both attempts, day 3 would succeed
    let harness = Harness::new(vec![Some(BODY), None, None, Some(BODY)]);
    let mut ledger = harness.ledger();

    let request = PublishRequest {
        days: 3,
        ..PublishRequest::default()
    };
    let err = harness.publish(&mut ledger, request).await.unwrap_err();

    assert!(matches!(err, FinblogError::Generation { attempts: 2, .. }));

    let reloaded = Ledger::load(harness.ledger_path()).unwrap();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.list()[0].date, day(15));

    assert_eq!(
        harness.output_files(),
        vec!["2026-01-15-finnish-greetings.mdx", "2026-01-15-finnish-greetings.png"]
    );
    // Day 3 was never attempted
    assert_eq!(harness.prompts.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_consecutive_days_from_requested_date() {
    let harness = Harness::new(vec![Some(BODY), Some(BODY), Some(BODY)]);
    let mut ledger = harness.ledger();

    let request = PublishRequest {
        date: Some(day(20)),
        days: 3,
        topic: Some("Sauna Culture".to_string()),
        image_prompt: None,
    };
    let published = harness.publish(&mut ledger, request).await.unwrap();

    let summary: Vec<(NaiveDate, &str)> = published
        .iter()
        .map(|p| (p.record.date, p.record.topic.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (day(20), "Sauna Culture"),
            (day(21), "Finnish Greetings"),
            (day(22), "Numbers and Counting"),
        ]
    );
    assert_eq!(harness.output_files().len(), 6);
}

#[tokio::test]
async fn test_forced_recent_topic_conflicts() {
    let harness = Harness::new(vec![Some(BODY)]);
    let mut ledger = harness.ledger();
    ledger.record(day(15), "Sauna Culture").unwrap();

    let request = PublishRequest {
        topic: Some("Sauna Culture".to_string()),
        ..PublishRequest::default()
    };
    let err = harness.publish(&mut ledger, request).await.unwrap_err();

    assert_eq!(err.kind(), "TopicConflictError");
    assert!(harness.output_files().is_empty());
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn test_record_failure_removes_written_files() {
    let harness = Harness::new(vec![Some(BODY)]);
    let mut ledger = harness.ledger();

    // The ledger was loaded; its directory disappears before the record
    std::fs::remove_dir_all(harness.temp.path().join("state")).unwrap();

    let err = harness
        .publish(&mut ledger, PublishRequest::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "PersistenceError");
    assert!(harness.output_files().is_empty());
    assert!(ledger.is_empty());
    assert!(!harness.ledger_path().exists());
}

#[tokio::test]
async fn test_existing_output_is_not_overwritten() {
    let harness = Harness::new(vec![Some(BODY)]);
    let mut ledger = harness.ledger();

    std::fs::create_dir_all(harness.temp.path().join("posts")).unwrap();
    let existing = harness.post_path("2026-01-15-finnish-greetings.mdx");
    std::fs::write(&existing, "hand-written").unwrap();

    let err = harness
        .publish(&mut ledger, PublishRequest::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "DuplicateOutputError");
    assert_eq!(std::fs::read_to_string(&existing).unwrap(), "hand-written");
    assert!(ledger.is_empty());
}
