//! Object synthesis: "what is <relation> of <subject>?" answered by a causal LM.

use crate::llm::{ModelChoice, ObjectBackends};

/// Returned whenever no answer can be extracted
pub const NO_ANSWER: &str = "No answer found.";

const OBJECT_MAX_NEW_TOKENS: u32 = 50;

const OBJECT_EXAMPLES: &str = "Based on the information provided, please answer the following question in strict format:\n\
Q: Monte Cremasco # country\n\
A: Italy\n\
Q: Johnny Depp # children\n\
A: Jack Depp, Lily-Rose Depp\n\
Q: Wolfgang Sauseng # employer\n\
A: University of Music and Performing Arts Vienna\n";

/// The open query line the model is asked to complete
pub fn query_string(subject: &str, relation: &str) -> String {
    format!("Q: {} # {}\nA:", subject, relation)
}

pub fn object_prompt(subject: &str, relation: &str) -> String {
    format!("{}{}", OBJECT_EXAMPLES, query_string(subject, relation))
}

/// Pull the answer for `subject # relation` out of a full model output.
///
/// Takes the text after the first exact occurrence of the query up to the next
/// `Q:` line. `None` when the query is missing or the answer is blank.
pub fn extract_answer(response: &str, subject: &str, relation: &str) -> Option<String> {
    let query = query_string(subject, relation);
    let start = response.find(&query)? + query.len();
    let rest = &response[start..];
    let end = rest.find("\nQ:").unwrap_or(rest.len());
    let answer = rest[..end].trim();
    (!answer.is_empty()).then(|| answer.to_string())
}

/// Split a multi-valued answer (`"Jack Depp, Lily-Rose Depp"`) into objects
pub fn split_objects(answer: &str) -> Vec<String> {
    answer
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct ObjectGenerator {
    backends: ObjectBackends,
}

impl ObjectGenerator {
    pub fn new(backends: ObjectBackends) -> Self {
        Self { backends }
    }

    /// Most likely object for (subject, relation), or [`NO_ANSWER`]
    pub async fn generate_object(&self, subject: &str, relation: &str, model: ModelChoice) -> String {
        let Some(backend) = self.backends.get(model) else {
            log::warn!("No backend configured for model {}", model);
            return NO_ANSWER.to_string();
        };

        let prompt = object_prompt(subject, relation);
        let response = match backend.complete("", &prompt, OBJECT_MAX_NEW_TOKENS).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Object generation failed for '{} # {}': {}", subject, relation, e);
                return NO_ANSWER.to_string();
            }
        };
        log::debug!("Full response: {}", response);

        let answer = extract_answer(&response, subject, relation)
            .unwrap_or_else(|| NO_ANSWER.to_string());
        log::info!("Generated object for '{} # {}': {}", subject, relation, answer);
        answer
    }
}
