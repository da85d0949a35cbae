//! Label <-> knowledge-base id resolution. Never fails: lookups that go wrong
//! come back as sentinel labels or `None`.

use crate::cache::LabelCache;
use crate::kb::KnowledgeBase;
use std::sync::Arc;

/// The entity exists but has no label in the configured language
pub const NO_LABEL: &str = "No label found";
/// The lookup failed or the entity does not exist
pub const INVALID_ID: &str = "Invalid ID";

/// True for the sentinel values returned by [`LabelResolver::label_of`]
pub fn is_unresolvable(label: &str) -> bool {
    label == NO_LABEL || label == INVALID_ID
}

pub struct LabelResolver {
    kb: Arc<dyn KnowledgeBase>,
    language: String,
    cache: Option<LabelCache>,
}

impl LabelResolver {
    pub fn new(kb: Arc<dyn KnowledgeBase>, language: &str) -> Self {
        Self {
            kb,
            language: language.to_string(),
            cache: None,
        }
    }

    /// Memoize successful label lookups; capacity 0 disables the cache
    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = (capacity > 0).then(|| LabelCache::new(capacity));
        self
    }

    /// Human-readable label for an item (`Q…`) or property (`P…`) id
    pub async fn label_of(&self, id: &str) -> String {
        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(id)) {
            return cached;
        }

        let label = if id.starts_with('P') {
            match self.kb.get_property(id, &self.language).await {
                Ok(Some(label)) => label,
                Ok(None) => NO_LABEL.to_string(),
                Err(e) => {
                    log::warn!("Error fetching label for ID {}: {}", id, e);
                    INVALID_ID.to_string()
                }
            }
        } else {
            match self.kb.get_entity(id).await {
                Ok(Some(entity)) => entity
                    .labels
                    .get(&self.language)
                    .cloned()
                    .unwrap_or_else(|| NO_LABEL.to_string()),
                Ok(None) => {
                    log::warn!("No entity found for ID {}", id);
                    INVALID_ID.to_string()
                }
                Err(e) => {
                    log::warn!("Error fetching label for ID {}: {}", id, e);
                    INVALID_ID.to_string()
                }
            }
        };

        log::debug!("Label for {}: {}", id, label);
        if !is_unresolvable(&label) {
            if let Some(cache) = &self.cache {
                cache.put(id.to_string(), label.clone());
            }
        }
        label
    }

    /// Best-effort knowledge-base id for a label.
    ///
    /// Only the first search hit is considered. A redirect is followed once;
    /// a page without a linked entity resolves to `None`.
    pub async fn id_of(&self, candidate: &str) -> Option<String> {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return None;
        }

        let hit = match self.kb.search(candidate, 1).await {
            Ok(hits) => hits.into_iter().next(),
            Err(e) => {
                log::warn!("Search failed for '{}': {}", candidate, e);
                return None;
            }
        };
        let Some(hit) = hit else {
            log::debug!("No search results for '{}'", candidate);
            return None;
        };

        let mut page = self.fetch_page(&hit.title).await?;
        if let Some(target) = page.redirect_target.take() {
            page = self.fetch_page(&target).await?;
        }

        match page.entity_id {
            Some(id) => {
                log::debug!("Resolved '{}' to {}", candidate, id);
                Some(id)
            }
            None => {
                log::debug!("No entity linked to page '{}' for '{}'", page.title, candidate);
                None
            }
        }
    }

    async fn fetch_page(&self, title: &str) -> Option<crate::kb::Page> {
        match self.kb.page(title).await {
            Ok(page) => page,
            Err(e) => {
                log::warn!("Page lookup failed for '{}': {}", title, e);
                None
            }
        }
    }
}
