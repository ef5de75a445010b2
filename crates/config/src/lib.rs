//! Configuration loading, validation, and management for Askbook.
//!
//! Loads configuration from `~/.askbook/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use askbook_core::provider::{CompletionConfig, EmbeddingPurpose};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.askbook/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden in `[provider]`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Questions picked at random by "I'm feeling lucky"
    #[serde(default = "default_lucky_questions")]
    pub lucky_questions: Vec<String>,

    /// Model endpoint configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Where the pre-embedded corpus lives
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// Token budget and separator for context packing
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Preamble and few-shot exchanges
    #[serde(default)]
    pub prompt: PromptConfig,

    /// Question cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_lucky_questions() -> Vec<String> {
    vec![
        "What is The Minimalist Entrepreneur about?".into(),
        "How do I find my first customers?".into(),
        "Should I raise venture capital?".into(),
        "What is a minimalist entrepreneur?".into(),
        "How do I price my product?".into(),
    ]
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("corpus", &self.corpus)
            .field("pipeline", &self.pipeline)
            .field("prompt", &self.prompt)
            .field("cache", &self.cache)
            .field("gateway", &self.gateway)
            .field("lucky_questions", &self.lucky_questions)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("completion_api", &self.completion_api)
            .field("completions_model", &self.completions_model)
            .field("doc_embeddings_model", &self.doc_embeddings_model)
            .field("query_embeddings_model", &self.query_embeddings_model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_name")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL; defaults to the well-known URL for `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Which endpoint shape serves completions
    #[serde(default)]
    pub completion_api: CompletionApi,

    #[serde(default = "default_completions_model")]
    pub completions_model: String,

    #[serde(default = "default_doc_embeddings_model")]
    pub doc_embeddings_model: String,

    #[serde(default = "default_query_embeddings_model")]
    pub query_embeddings_model: String,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Upper bound on each remote call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Completion endpoint flavour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionApi {
    /// `POST /completions` with a raw prompt
    #[default]
    Completions,
    /// `POST /chat/completions` with the prompt as a single user message
    Chat,
}

fn default_provider_name() -> String {
    "openai".into()
}
fn default_completions_model() -> String {
    "text-davinci-003".into()
}
fn default_doc_embeddings_model() -> String {
    "text-search-curie-doc-001".into()
}
fn default_query_embeddings_model() -> String {
    "text-search-curie-query-001".into()
}
fn default_max_output_tokens() -> u32 {
    150
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            api_key: None,
            api_url: None,
            completion_api: CompletionApi::default(),
            completions_model: default_completions_model(),
            doc_embeddings_model: default_doc_embeddings_model(),
            query_embeddings_model: default_query_embeddings_model(),
            temperature: 0.0,
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    /// The embeddings model configured for `purpose`.
    pub fn embeddings_model(&self, purpose: EmbeddingPurpose) -> &str {
        match purpose {
            EmbeddingPurpose::Document => &self.doc_embeddings_model,
            EmbeddingPurpose::Query => &self.query_embeddings_model,
        }
    }

    /// The fixed generation settings passed with every completion.
    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.completions_model.clone(),
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    #[serde(default = "default_sections_path")]
    pub sections_path: PathBuf,

    #[serde(default = "default_embeddings_path")]
    pub embeddings_path: PathBuf,
}

fn default_sections_path() -> PathBuf {
    PathBuf::from("data/book.pdf.pages.csv")
}
fn default_embeddings_path() -> PathBuf {
    PathBuf::from("data/book.pdf.embeddings.csv")
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            sections_path: default_sections_path(),
            embeddings_path: default_embeddings_path(),
        }
    }
}

impl CorpusConfig {
    /// Point both files at `sections.csv` / `embeddings.csv` inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            sections_path: dir.join("sections.csv"),
            embeddings_path: dir.join("embeddings.csv"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Token budget for the packed context
    #[serde(default = "default_max_section_tokens")]
    pub max_section_tokens: usize,

    /// Prefix for every packed context fragment
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_max_section_tokens() -> usize {
    500
}
fn default_separator() -> String {
    "\n* ".into()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_section_tokens: default_max_section_tokens(),
            separator: default_separator(),
        }
    }
}

/// Static prompt material: the persona preamble and few-shot examples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default = "default_preamble")]
    pub preamble: String,

    #[serde(default = "default_few_shot")]
    pub few_shot: Vec<FewShotExchange>,
}

/// An example question/answer pair included in every prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FewShotExchange {
    pub question: String,
    pub answer: String,
}

impl FewShotExchange {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

fn default_preamble() -> String {
    "Sahil Lavingia is the founder and CEO of Gumroad and the author of The Minimalist \
     Entrepreneur. The following are questions answered in his voice. Keep each answer to \
     three sentences at most, use complete sentences, and stop once the point is made.\n\n\
     Context that may be useful, pulled from The Minimalist Entrepreneur:\n"
        .into()
}

fn default_few_shot() -> Vec<FewShotExchange> {
    vec![
        FewShotExchange::new(
            "How do I decide what kind of business I should start?",
            "Start with a community you already belong to and a problem its members keep \
             running into. Build the smallest thing that solves it, by hand if you have to, \
             and charge for it from day one.",
        ),
        FewShotExchange::new(
            "Do I need to raise money to get started?",
            "Usually not. Most businesses can start with a few hundred dollars and a product \
             that customers pay for. Profitability buys you the freedom to decide later.",
        ),
        FewShotExchange::new(
            "What is the best way to grow?",
            "Sell to your first hundred customers yourself before you think about marketing. \
             Then teach what you know in public and let the audience find you.",
        ),
    ]
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            preamble: default_preamble(),
            few_shot: default_few_shot(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// "memory" or "sqlite"
    #[serde(default = "default_cache_backend")]
    pub backend: String,

    /// SQLite database path (ignored by the memory backend)
    #[serde(default = "default_cache_path")]
    pub path: String,
}

fn default_cache_backend() -> String {
    "sqlite".into()
}
fn default_cache_path() -> String {
    "askbook.db".into()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            path: default_cache_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    3000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.askbook/config.toml).
    ///
    /// Also checks environment variables:
    /// - `ASKBOOK_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `ASKBOOK_MODEL` overrides the completions model
    /// - `ASKBOOK_CORPUS_DIR` points both corpus files into one directory
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_at(&Self::config_dir().join("config.toml"))
    }

    /// Like [`AppConfig::load`], but from an explicit file.
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var("ASKBOOK_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("ASKBOOK_MODEL") {
            self.provider.completions_model = model;
        }

        if let Ok(dir) = std::env::var("ASKBOOK_CORPUS_DIR") {
            self.corpus = CorpusConfig::in_dir(Path::new(&dir));
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".askbook")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.pipeline.max_section_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.max_section_tokens must be > 0".into(),
            ));
        }

        if self.pipeline.separator.is_empty() {
            return Err(ConfigError::ValidationError(
                "pipeline.separator must not be empty".into(),
            ));
        }

        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "provider.timeout_secs must be > 0".into(),
            ));
        }

        if !matches!(self.cache.backend.as_str(), "memory" | "sqlite") {
            return Err(ConfigError::ValidationError(format!(
                "unknown cache backend '{}' (expected \"memory\" or \"sqlite\")",
                self.cache.backend
            )));
        }

        Ok(())
    }

    /// The API key from `[provider]`, falling back to the top-level key.
    pub fn resolved_api_key(&self) -> Option<&str> {
        self.provider
            .api_key
            .as_deref()
            .or(self.api_key.as_deref())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.resolved_api_key().is_some()
    }

    /// Generate a default config TOML string (for the `config` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: ProviderConfig::default(),
            corpus: CorpusConfig::default(),
            pipeline: PipelineConfig::default(),
            prompt: PromptConfig::default(),
            cache: CacheConfig::default(),
            gateway: GatewayConfig::default(),
            lucky_questions: default_lucky_questions(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for askbook_core::Error {
    fn from(e: ConfigError) -> Self {
        askbook_core::Error::Config {
            message: e.to_string(),
        }
    }
}
