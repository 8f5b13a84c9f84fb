//! Configuration for finblog.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (GEMINI_API_KEY, FINBLOG_HOME, FINBLOG_BOOKS_DIR,
//!    FINBLOG_OUTPUT_DIR, FINBLOG_CACHE_DIR, FINBLOG_RECENCY_WINDOW)
//! 2. Config file (.finblog/config.yaml)
//! 3. Defaults (~/.finblog)
//!
//! Config file discovery:
//! - Searches current directory and parents for .finblog/config.yaml
//! - Paths in config file are relative to the project root (parent of .finblog/)
//!
//! Configuration is loaded once per invocation and passed down explicitly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{FinblogError, Result};

pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-exp-image-generation";
pub const DEFAULT_IMAGE_STYLE: &str = "modern flat illustration";
pub const DEFAULT_RECENCY_WINDOW: usize = 10;

/// Topics offered when the config file does not list its own
pub const DEFAULT_TOPICS: &[&str] = &[
    "Finnish Greetings",
    "Numbers and Counting",
    "Days of the Week",
    "Months and Seasons",
    "Telling the Time",
    "Family Members",
    "Food and Drink",
    "At the Café",
    "Shopping at the Market",
    "Weather Talk",
    "Colours",
    "Vowel Harmony",
    "Consonant Gradation",
    "The Partitive Case",
    "Verb Types",
    "Asking Questions",
    "Directions and Places",
    "Sauna Culture",
    "Hobbies and Free Time",
    "Public Transport",
    "At the Doctor",
    "Finnish Holidays",
];

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub topics: TopicsConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory holding the ledger (relative to project root)
    pub home: Option<String>,
    /// Directory of textbook PDFs
    pub books: Option<String>,
    /// Extraction cache directory
    pub cache: Option<String>,
    /// Directory for generated MDX posts
    pub output: Option<String>,
    /// Directory for generated images (defaults to output)
    pub images: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeminiConfig {
    pub text_model: Option<String>,
    pub image_model: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopicsConfig {
    pub recency_window: Option<usize>,
    #[serde(default)]
    pub catalog: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationConfig {
    pub image_style: Option<String>,
    pub max_excerpt_chars: Option<usize>,
    pub timeout_seconds: Option<u64>,
    pub retry_delay_ms: Option<u64>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory (ledger and lock file)
    pub home: PathBuf,
    pub books_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub output_dir: PathBuf,
    pub images_dir: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Gemini API key (required only for generation)
    pub api_key: Option<String>,
    pub gemini: GeminiSettings,
    pub topics: TopicSettings,
    pub generation: GenerationSettings,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub text_model: String,
    pub image_model: String,
    pub base_url: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            base_url: crate::adapters::gemini::DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TopicSettings {
    /// Number of most recent ledger entries whose topics are excluded
    pub recency_window: usize,
    pub catalog: Vec<String>,
}

impl Default for TopicSettings {
    fn default() -> Self {
        Self {
            recency_window: DEFAULT_RECENCY_WINDOW,
            catalog: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub image_style: String,
    pub max_excerpt_chars: usize,
    pub timeout_seconds: u64,
    pub retry_delay_ms: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            image_style: DEFAULT_IMAGE_STYLE.to_string(),
            max_excerpt_chars: 6_000,
            timeout_seconds: 120,
            retry_delay_ms: 2_000,
        }
    }
}

impl GenerationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl ResolvedConfig {
    /// Configuration rooted at `home` with every other setting defaulted
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let output_dir = home.join("posts");
        Self {
            books_dir: home.join("books"),
            cache_dir: home.join("cache"),
            images_dir: output_dir.clone(),
            output_dir,
            home,
            config_file: None,
            api_key: None,
            gemini: GeminiSettings::default(),
            topics: TopicSettings::default(),
            generation: GenerationSettings::default(),
        }
    }

    /// Ledger file ($FINBLOG_HOME/ledger.json)
    pub fn ledger_path(&self) -> PathBuf {
        self.home.join("ledger.json")
    }

    /// Lock file guarding the ledger ($FINBLOG_HOME/ledger.lock)
    pub fn lock_path(&self) -> PathBuf {
        self.home.join("ledger.lock")
    }

    /// Check invariants that hold for every command
    pub fn validate(&self) -> Result<()> {
        if self.topics.catalog.iter().all(|t| t.trim().is_empty()) {
            return Err(FinblogError::Config(
                "topic catalog is empty; list topics under topics.catalog".to_string(),
            ));
        }
        if self.generation.max_excerpt_chars == 0 {
            return Err(FinblogError::Config(
                "generation.max_excerpt_chars must be greater than zero".to_string(),
            ));
        }
        if self.gemini.text_model.trim().is_empty() || self.gemini.image_model.trim().is_empty() {
            return Err(FinblogError::Config("gemini model names cannot be empty".to_string()));
        }
        Ok(())
    }

    /// API key, required by commands that call the generative service
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(FinblogError::Config(
                "GEMINI_API_KEY not found; set it in the environment or a .env file".to_string(),
            )),
        }
    }

    /// API key with all but the last four characters hidden
    pub fn masked_api_key(&self) -> String {
        match self.api_key.as_deref() {
            Some(key) if key.chars().count() > 4 => {
                let tail: String = key.chars().skip(key.chars().count() - 4).collect();
                format!("****{}", tail)
            }
            Some(_) => "****".to_string(),
            None => "(not set)".to_string(),
        }
    }
}

/// Find config file by searching a directory and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(".finblog").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        FinblogError::Config(format!("failed to read {}: {}", path.display(), e))
    })?;

    serde_yaml::from_str(&content).map_err(|e| {
        FinblogError::Config(format!("failed to parse {}: {}", path.display(), e))
    })
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration from the process environment and working directory
pub fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir()
        .map_err(|e| FinblogError::Config(format!("cannot read working directory: {}", e)))?;

    load_config_with(&cwd, |key| std::env::var(key).ok())
}

/// Load configuration starting discovery at `cwd`, reading variables through `env`
pub fn load_config_with(cwd: &Path, env: impl Fn(&str) -> Option<String>) -> Result<ResolvedConfig> {
    let config_file = find_config_file(cwd);
    let file = match config_file {
        Some(ref path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    // Base directory is the parent of .finblog/ (i.e., grandparent of config.yaml)
    let base_dir = config_file
        .as_ref()
        .and_then(|p| p.parent())
        .and_then(|p| p.parent())
        .unwrap_or(cwd)
        .to_path_buf();

    let home = if let Some(env_home) = env("FINBLOG_HOME") {
        PathBuf::from(env_home)
    } else if let Some(ref home) = file.paths.home {
        resolve_path(&base_dir, home)
    } else {
        dirs::home_dir()
            .ok_or_else(|| FinblogError::Config("failed to determine home directory".to_string()))?
            .join(".finblog")
    };

    let mut config = ResolvedConfig::with_home(&home);
    config.config_file = config_file;

    let pick = |var: &str, from_file: &Option<String>, default: PathBuf| -> PathBuf {
        if let Some(value) = env(var) {
            PathBuf::from(value)
        } else if let Some(path) = from_file {
            resolve_path(&base_dir, path)
        } else {
            default
        }
    };

    config.books_dir = pick("FINBLOG_BOOKS_DIR", &file.paths.books, config.books_dir.clone());
    config.cache_dir = pick("FINBLOG_CACHE_DIR", &file.paths.cache, config.cache_dir.clone());
    config.output_dir = pick("FINBLOG_OUTPUT_DIR", &file.paths.output, config.output_dir.clone());
    config.images_dir = match file.paths.images {
        Some(ref images) => resolve_path(&base_dir, images),
        None => config.output_dir.clone(),
    };

    config.api_key = env("GEMINI_API_KEY").filter(|k| !k.trim().is_empty());

    if let Some(model) = file.gemini.text_model {
        config.gemini.text_model = model;
    }
    if let Some(model) = file.gemini.image_model {
        config.gemini.image_model = model;
    }
    if let Some(url) = file.gemini.base_url {
        config.gemini.base_url = url;
    }

    config.topics.recency_window = match env("FINBLOG_RECENCY_WINDOW") {
        Some(raw) => raw.trim().parse().map_err(|_| {
            FinblogError::Config(format!(
                "FINBLOG_RECENCY_WINDOW must be a non-negative integer, got '{}'",
                raw
            ))
        })?,
        None => file.topics.recency_window.unwrap_or(DEFAULT_RECENCY_WINDOW),
    };
    if !file.topics.catalog.is_empty() {
        config.topics.catalog = file.topics.catalog;
    }

    let defaults = GenerationSettings::default();
    config.generation = GenerationSettings {
        image_style: file.generation.image_style.unwrap_or(defaults.image_style),
        max_excerpt_chars: file
            .generation
            .max_excerpt_chars
            .unwrap_or(defaults.max_excerpt_chars),
        timeout_seconds: file
            .generation
            .timeout_seconds
            .unwrap_or(defaults.timeout_seconds),
        retry_delay_ms: file
            .generation
            .retry_delay_ms
            .unwrap_or(defaults.retry_delay_ms),
    };

    config.validate()?;
    Ok(config)
}
