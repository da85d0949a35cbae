//! Knowledge-base access: Wikipedia search, Wikidata entities, label resolution
//! and the curated relation allow-list.

pub mod allow_list;
pub mod resolver;
pub mod wikimedia;

pub use allow_list::AllowList;
pub use resolver::{is_unresolvable, LabelResolver, INVALID_ID, NO_LABEL};
pub use wikimedia::WikimediaClient;

use crate::error::Result;
use std::collections::HashMap;

/// One text-search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
}

/// An encyclopedia page as seen by the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    /// Set when this page is a redirect
    pub redirect_target: Option<String>,
    /// Linked structured-data item, e.g. `Q76`
    pub entity_id: Option<String>,
}

/// Target of a single claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimTarget {
    /// Another knowledge-base entity
    Entity(String),
    /// A scalar value (string, quantity, time, coordinates, ...) or no value
    Literal,
}

/// A structured-data entity (item or property)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entity {
    pub id: String,
    /// language code -> label
    pub labels: HashMap<String, String>,
    /// property id -> claim targets
    pub claims: HashMap<String, Vec<ClaimTarget>>,
}

/// Knowledge-base client contract
#[async_trait::async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Full-text search, results in source order
    async fn search(&self, text: &str, limit: usize) -> Result<Vec<SearchHit>>;

    /// Fetch page metadata; `None` if the page does not exist
    async fn page(&self, title: &str) -> Result<Option<Page>>;

    /// Fetch an item or property; `None` if it does not exist
    async fn get_entity(&self, id: &str) -> Result<Option<Entity>>;

    /// Label of a property in `language`
    async fn get_property(&self, id: &str, language: &str) -> Result<Option<String>> {
        Ok(self
            .get_entity(id)
            .await?
            .and_then(|e| e.labels.get(language).cloned()))
    }
}
