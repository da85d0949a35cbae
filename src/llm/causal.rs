//! Causal language-model backends for object generation.

use crate::config::BackendConfig;
use crate::error::{GraphseedError, Result};
use crate::llm::TextGenerator;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// The closed set of object-generation models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelChoice {
    Gpt2Xl,
    GptJ,
    Llama2,
}

impl ModelChoice {
    pub const ALL: [ModelChoice; 3] = [ModelChoice::Gpt2Xl, ModelChoice::GptJ, ModelChoice::Llama2];

    /// Name used in config files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelChoice::Gpt2Xl => "gpt2_xl",
            ModelChoice::GptJ => "gpt_j",
            ModelChoice::Llama2 => "llama2",
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelChoice {
    type Err = GraphseedError;

    fn from_str(s: &str) -> Result<Self> {
        ModelChoice::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                GraphseedError::InvalidInput(format!(
                    "unknown model '{}', expected one of gpt2_xl, gpt_j, llama2",
                    s
                ))
            })
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParameters,
}

#[derive(Serialize)]
struct GenerateParameters {
    max_new_tokens: u32,
    return_full_text: bool,
}

#[derive(Deserialize)]
struct Generated {
    generated_text: String,
}

/// Text-generation servers answer with either one object or a one-element list
#[derive(Deserialize)]
#[serde(untagged)]
enum GenerateResponse {
    Single(Generated),
    Batch(Vec<Generated>),
}

/// HTTP client for a text-generation endpoint (`POST {url}/generate`)
///
/// Returns the prompt followed by the continuation, like decoding the full
/// output sequence of a causal LM.
pub struct CausalLm {
    client: Client,
    url: String,
    max_new_tokens: u32,
}

impl CausalLm {
    pub fn new(url: &str, max_new_tokens: u32, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GraphseedError::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            max_new_tokens,
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        Self::new(
            &config.url,
            config.max_new_tokens,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait::async_trait]
impl TextGenerator for CausalLm {
    async fn complete(&self, _system: &str, prompt: &str, max_tokens: u32) -> Result<String> {
        let request = GenerateRequest {
            inputs: prompt,
            parameters: GenerateParameters {
                max_new_tokens: max_tokens.min(self.max_new_tokens),
                return_full_text: false,
            },
        };

        let start = std::time::Instant::now();
        let response = self
            .client
            .post(format!("{}/generate", self.url))
            .json(&request)
            .send()
            .await
            .map_err(|e| GraphseedError::Llm(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(GraphseedError::Llm(format!(
                "Generation backend error {}: {}",
                status, body
            )));
        }

        let generated = match response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| GraphseedError::Llm(format!("Failed to parse response: {}", e)))?
        {
            GenerateResponse::Single(g) => g.generated_text,
            GenerateResponse::Batch(batch) => batch
                .into_iter()
                .next()
                .map(|g| g.generated_text)
                .ok_or_else(|| GraphseedError::Llm("Empty generation batch".to_string()))?,
        };

        log::debug!("Generation at {} took {:?}", self.url, start.elapsed());
        Ok(format!("{}{}", prompt, generated))
    }
}

/// Object-generation backends, built once at startup
#[derive(Default, Clone)]
pub struct ObjectBackends {
    backends: HashMap<ModelChoice, Arc<dyn TextGenerator>>,
}

impl ObjectBackends {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a backend for every `[backends.<name>]` section
    pub fn from_config(configs: &HashMap<String, BackendConfig>) -> Result<Self> {
        let mut backends = Self::new();
        for (name, config) in configs {
            let model: ModelChoice = name.parse()?;
            backends.insert(model, Arc::new(CausalLm::from_config(config)?));
        }
        Ok(backends)
    }

    pub fn insert(&mut self, model: ModelChoice, backend: Arc<dyn TextGenerator>) {
        self.backends.insert(model, backend);
    }

    pub fn get(&self, model: ModelChoice) -> Option<&Arc<dyn TextGenerator>> {
        self.backends.get(&model)
    }
}
