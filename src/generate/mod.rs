//! Prompted generation: paraphrases and relation objects.

pub mod object;
pub mod paraphrase;
pub mod sanitize;

pub use object::{ObjectGenerator, NO_ANSWER};
pub use paraphrase::Paraphraser;
