//! Generative text services.
//!
//! Everything that talks to a language model goes through [`TextGenerator`]:
//! the chat-completion client used for paraphrases and relation lists, and the
//! causal-LM backends used for object generation.

pub mod causal;
pub mod openai;

pub use causal::{CausalLm, ModelChoice, ObjectBackends};
pub use openai::OpenAiChat;

use crate::error::Result;

/// A text-completion capability.
///
/// `system` is an instruction for chat-style services; causal backends ignore it.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str, max_tokens: u32) -> Result<String>;
}
