//! Alternate surface forms for entity and relation labels.

use std::collections::HashSet;
use std::sync::Arc;

use super::sanitize::{
    is_valid_relation_paraphrase, is_valid_subject_paraphrase, sanitize_input, split_lines,
    strip_tag,
};
use crate::llm::TextGenerator;

const SUBJECT_SYSTEM: &str = "Generate paraphrases for the subject in specific form.";
const RELATION_SYSTEM: &str = "Generate paraphrases for the relation.";

const SUBJECT_EXAMPLES: &str = "Bill Clinton is also known as:\n\
- William Clinton\n\
- William Jefferson Clinton\n\
- The 42nd president of the United States\n\
\n\
United Kingdom is also known as:\n\
- UK\n\
- Britain\n\
- England\n\
\n";

const RELATION_EXAMPLES: &str = "'notable work' may be described as:\n\
- A work of great value\n\
- A work of importance\n\
'notable work' refers to:\n\
- Significant achievements\n\
- Important contributions\n\
please describe 'notable work' in a few words:\n\
- Key accomplishments\n\
- Major works\n\
\n";

pub fn subject_prompt(label: &str) -> String {
    format!("{}{} is also known as:", SUBJECT_EXAMPLES, label)
}

/// The three instruction templates used for relation paraphrasing
pub fn relation_instructions(label: &str) -> Vec<String> {
    vec![
        format!("'{}' may be described as:", label),
        format!("'{}' refers to:", label),
        format!("please describe '{}' in a few words:", label),
    ]
}

pub struct Paraphraser {
    llm: Arc<dyn TextGenerator>,
    max_tokens: u32,
}

impl Paraphraser {
    pub fn new(llm: Arc<dyn TextGenerator>, max_tokens: u32) -> Self {
        Self { llm, max_tokens }
    }

    /// Alternate names for an entity, in response order.
    ///
    /// Returns an empty list when generation fails.
    pub async fn paraphrase_subject(&self, label: &str) -> Vec<String> {
        let response = match self
            .llm
            .complete(SUBJECT_SYSTEM, &subject_prompt(label), self.max_tokens)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Subject paraphrasing failed for '{}': {}", label, e);
                return Vec::new();
            }
        };

        let mut paraphrases = Vec::new();
        for line in split_lines(&response) {
            let candidate = sanitize_input(strip_tag(line));
            if is_valid_subject_paraphrase(&candidate) {
                paraphrases.push(candidate);
            } else {
                log::debug!("Invalid paraphrase discarded: {:?}", candidate);
            }
        }

        log::info!("Subject paraphrases for '{}': {:?}", label, paraphrases);
        paraphrases
    }

    /// Distinct alternate phrasings of a relation, pooled over three prompts
    pub async fn paraphrase_relation(&self, label: &str) -> HashSet<String> {
        let instructions = relation_instructions(label);
        let mut paraphrases = HashSet::new();

        for instruction in &instructions {
            let prompt = format!("{}{}", RELATION_EXAMPLES, instruction);
            let response = match self
                .llm
                .complete(RELATION_SYSTEM, &prompt, self.max_tokens)
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("Relation paraphrasing failed for '{}': {}", label, e);
                    continue;
                }
            };

            paraphrases.extend(
                split_lines(&response)
                    .into_iter()
                    .filter(|line| is_valid_relation_paraphrase(line, &instructions))
                    .map(sanitize_input)
                    .filter(|p| !p.is_empty()),
            );
        }

        log::info!("Relation paraphrases for '{}': {:?}", label, paraphrases);
        paraphrases
    }
}
