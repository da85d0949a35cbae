use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::graph::{NodeKeyPolicy, ObjectStrategy};
use crate::llm::ModelChoice;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub graph: GraphConfig,
    pub llm: LlmConfig,
    pub knowledge_base: KnowledgeBaseConfig,
    /// Object-generation backends keyed by model name (`gpt2_xl`, `gpt_j`, `llama2`)
    #[serde(default)]
    pub backends: HashMap<String, BackendConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Traversal parameters and expansion policies
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    /// Knowledge-base id of the root entity, e.g. `Q76`
    pub root_entity: String,
    /// Skip the root label lookup and start from this label
    #[serde(default)]
    pub root_label: Option<String>,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_branch_limit")]
    pub branch_limit: usize,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default)]
    pub count_duplicate_skips: bool,
    #[serde(default)]
    pub split_multi_valued_objects: bool,
    #[serde(default = "default_true")]
    pub keep_unanswered_objects: bool,
    #[serde(default)]
    pub node_key: NodeKeyPolicy,
    #[serde(default)]
    pub object_strategy: ObjectStrategy,
    #[serde(default = "default_consensus_min_votes")]
    pub consensus_min_votes: usize,
}

/// Chat-completion service used for paraphrases and relation generation
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub max_retries: usize,
}

/// Wikipedia search + Wikidata entity access
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeBaseConfig {
    #[serde(default = "default_wikipedia_api")]
    pub wikipedia_api: String,
    #[serde(default = "default_wikidata_api")]
    pub wikidata_api: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Path to the curated relation allow-list
    #[serde(default = "default_allow_list")]
    pub allow_list: PathBuf,
    #[serde(default = "default_label_cache_capacity")]
    pub label_cache_capacity: usize,
}

/// A text-generation endpoint serving one causal language model
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
    #[serde(default = "default_backend_timeout_secs")]
    pub timeout_secs: u64,
}

/// Output and logging
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            log_level: default_log_level(),
        }
    }
}

fn default_max_depth() -> usize {
    2
}

fn default_branch_limit() -> usize {
    3
}

fn default_model_name() -> String {
    "llama2".to_string()
}

fn default_true() -> bool {
    true
}

fn default_consensus_min_votes() -> usize {
    2
}

fn default_llm_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_max_tokens() -> u32 {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_backend_timeout_secs() -> u64 {
    120
}

fn default_wikipedia_api() -> String {
    "https://en.wikipedia.org/w/api.php".to_string()
}

fn default_wikidata_api() -> String {
    "https://www.wikidata.org/w/api.php".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_user_agent() -> String {
    format!("graphseed/{}", env!("CARGO_PKG_VERSION"))
}

fn default_allow_list() -> PathBuf {
    PathBuf::from("relations.toml")
}

fn default_label_cache_capacity() -> usize {
    1000
}

fn default_max_new_tokens() -> u32 {
    50
}

fn default_output_path() -> PathBuf {
    PathBuf::from("graph.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in GRAPHSEED_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // Optional; a missing .env is not an error
        let _ = dotenv::dotenv();

        let config_path = std::env::var("GRAPHSEED_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        Self::load_from(&config_path)
    }

    /// Load and validate configuration from an explicit path
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.graph.root_entity.trim().is_empty() && self.graph.root_label.is_none() {
            anyhow::bail!("graph.root_entity must be set (or graph.root_label given)");
        }

        if self.graph.branch_limit == 0 {
            anyhow::bail!("graph.branch_limit must be greater than 0");
        }

        if self.graph.consensus_min_votes == 0 {
            anyhow::bail!("graph.consensus_min_votes must be greater than 0");
        }

        let model = self.model_choice()?;
        if !self.backends.contains_key(model.as_str()) {
            anyhow::bail!(
                "graph.model_name is '{}' but no [backends.{}] section is configured",
                model,
                model
            );
        }

        for (name, backend) in &self.backends {
            name.parse::<ModelChoice>()
                .with_context(|| format!("Unknown backend section [backends.{}]", name))?;
            url::Url::parse(&backend.url)
                .with_context(|| format!("backends.{}.url is not a valid URL", name))?;
        }

        url::Url::parse(&self.llm.base_url).context("llm.base_url is not a valid URL")?;
        url::Url::parse(&self.knowledge_base.wikipedia_api)
            .context("knowledge_base.wikipedia_api is not a valid URL")?;
        url::Url::parse(&self.knowledge_base.wikidata_api)
            .context("knowledge_base.wikidata_api is not a valid URL")?;

        // Check both environment variable and .env file (dotenv already loaded in Config::load)
        std::env::var(&self.llm.api_key_env).with_context(|| {
            format!(
                "Environment variable {} not set. Set it in your .env file or as an environment variable with your OpenAI API key.",
                self.llm.api_key_env
            )
        })?;

        if !self.knowledge_base.allow_list.is_file() {
            anyhow::bail!(
                "allow_list file does not exist: {}",
                self.knowledge_base.allow_list.display()
            );
        }

        Ok(())
    }

    /// Backend selected for object generation
    pub fn model_choice(&self) -> Result<ModelChoice> {
        self.graph
            .model_name
            .parse::<ModelChoice>()
            .with_context(|| format!("Invalid graph.model_name: {}", self.graph.model_name))
    }

    /// Read the chat-service API key from the environment
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.llm.api_key_env)
            .with_context(|| format!("Environment variable {} not set", self.llm.api_key_env))
    }
}
