//! YAML configuration.
//!
//! Every routing knob lives here: thresholds, margins, top-k, and the
//! embedding endpoint. Nothing in the engine reads a hardcoded cutoff.
//! The file is created with defaults on first run and validated on load.

use homedir::my_home;
use serde::{Deserialize, Serialize};

use crate::corpus;
use crate::semantic::{
    DEFAULT_MODEL, DEFAULT_SCORE_THRESHOLD, DEFAULT_TIE_MARGIN, DEFAULT_TOP_K,
};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1/";
const DEFAULT_EMBED_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_INTENT_THRESHOLD: f32 = 0.6;
const DEFAULT_INTENT_MARGIN: f32 = 0.05;

/// Knobs for both fuzzy matchers: document ranking and intent ranking.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Minimum top-hit cosine similarity [-1, 1] before a document
    /// answer is returned instead of the fail-safe.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,

    /// Passages scoring within this margin of the top hit are all
    /// surfaced.
    #[serde(default = "default_tie_margin")]
    pub tie_margin: f32,

    /// Number of passages a semantic lookup considers.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum intent confidence [0, 1] before a question counts as
    /// structured-answerable.
    #[serde(default = "default_intent_threshold")]
    pub intent_threshold: f32,

    /// Two distinct intents scoring within this margin are ambiguous.
    #[serde(default = "default_intent_margin")]
    pub intent_margin: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            tie_margin: DEFAULT_TIE_MARGIN,
            top_k: DEFAULT_TOP_K,
            intent_threshold: DEFAULT_INTENT_THRESHOLD,
            intent_margin: DEFAULT_INTENT_MARGIN,
        }
    }
}

fn default_score_threshold() -> f32 {
    DEFAULT_SCORE_THRESHOLD
}

fn default_tie_margin() -> f32 {
    DEFAULT_TIE_MARGIN
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_intent_threshold() -> f32 {
    DEFAULT_INTENT_THRESHOLD
}

fn default_intent_margin() -> f32 {
    DEFAULT_INTENT_MARGIN
}

/// Embedding provider endpoint settings. The API key stays in the
/// environment, never in this file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Embedding model; must match the model the corpus was vectorized
    /// with.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_embed_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_EMBED_TIMEOUT_SECS,
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_embed_timeout_secs() -> u64 {
    DEFAULT_EMBED_TIMEOUT_SECS
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Mapped employee context file (produced upstream).
    #[serde(default)]
    pub context_path: String,

    /// Prebuilt vectorized corpus file (see the embed-corpus command).
    #[serde(default)]
    pub corpus_path: String,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            embedding: EmbeddingConfig::default(),
            context_path: String::new(),
            corpus_path: String::new(),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            base_path: String::new(),
        }
    }
}

impl Config {
    fn validate(&self) {
        let search = &self.search;
        if !(-1.0..=1.0).contains(&search.score_threshold) {
            panic!(
                "search.score_threshold must be between -1.0 and 1.0, got {}",
                search.score_threshold
            );
        }
        if search.tie_margin < 0.0 {
            panic!("search.tie_margin must be >= 0, got {}", search.tie_margin);
        }
        if search.top_k == 0 {
            panic!("search.top_k must be at least 1");
        }
        if !(0.0..=1.0).contains(&search.intent_threshold) {
            panic!(
                "search.intent_threshold must be between 0.0 and 1.0, got {}",
                search.intent_threshold
            );
        }
        if search.intent_margin < 0.0 {
            panic!(
                "search.intent_margin must be >= 0, got {}",
                search.intent_margin
            );
        }

        if self.embedding.timeout_secs == 0 {
            panic!("embedding.timeout_secs must be greater than 0");
        }
        if let Err(err) = url::Url::parse(&self.embedding.api_base) {
            panic!("embedding.api_base is not a valid url: {err}");
        }
    }

    pub fn load() -> Self {
        Self::load_with(&base_path())
    }

    pub fn load_with(base_path: &str) -> Self {
        let config_path = std::path::Path::new(base_path).join("config.yaml");

        // create new if does not exist
        if !config_path.exists() {
            std::fs::create_dir_all(base_path).expect("cannot create config directory");
            corpus::write_atomic(
                &config_path,
                serde_yml::to_string(&Self::default()).unwrap().as_bytes(),
            )
            .expect("cannot write default config");
        }

        let config_str =
            std::fs::read_to_string(&config_path).expect("config file is not readable");
        let mut config: Self = serde_yml::from_str(&config_str).expect("config is malformed");

        config.base_path = base_path.to_string();

        config.validate();

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config).unwrap() {
            config.save();
        }

        config
    }

    pub fn save(&self) {
        let config_path = std::path::Path::new(&self.base_path).join("config.yaml");
        let config_str = serde_yml::to_string(&self).unwrap();
        corpus::write_atomic(&config_path, config_str.as_bytes())
            .expect("cannot write config file");
    }
}

/// Base directory for config and data files.
pub fn base_path() -> String {
    std::env::var("HRDESK_BASE_PATH").unwrap_or_else(|_| {
        let home = my_home()
            .expect("Could not determine home directory")
            .expect("Home directory path is empty");
        format!("{}/.local/share/hrdesk", home.to_string_lossy())
    })
}
