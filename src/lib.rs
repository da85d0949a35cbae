pub mod config;
pub mod error;
pub mod cache;
pub mod llm;
pub mod kb;
pub mod generate;
pub mod relations;
pub mod graph;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{GraphseedError, Result};
pub use graph::{GraphBuilder, KnowledgeGraph};
