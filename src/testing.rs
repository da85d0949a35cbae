//! In-memory doubles for the external services.

use crate::error::{GraphseedError, Result};
use crate::kb::{ClaimTarget, Entity, KnowledgeBase, Page, SearchHit};
use crate::llm::TextGenerator;
use std::collections::HashMap;
use std::sync::Mutex;

type Responder = Box<dyn Fn(&str, &str) -> Result<String> + Send + Sync>;

/// Text generator answering from a closure over (system, prompt)
pub struct ScriptedGenerator {
    respond: Responder,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(respond: impl Fn(&str, &str) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answers with `text`
    pub fn constant(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_, _| Ok(text.clone()))
    }

    /// Always fails
    pub fn failing() -> Self {
        Self::new(|_, _| Err(GraphseedError::Llm("service unavailable".to_string())))
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, system: &str, prompt: &str, _max_tokens: u32) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.respond)(system, prompt)
    }
}

/// Knowledge base backed by maps
#[derive(Default)]
pub struct InMemoryKb {
    search: HashMap<String, Vec<String>>,
    pages: HashMap<String, Page>,
    entities: HashMap<String, Entity>,
    fail: bool,
    pub calls: Mutex<Vec<String>>,
}

impl InMemoryKb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call errors
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, query: &str, titles: &[&str]) -> Self {
        self.search.insert(
            query.to_string(),
            titles.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    pub fn with_page(mut self, title: &str, entity_id: Option<&str>) -> Self {
        self.pages.insert(
            title.to_string(),
            Page {
                title: title.to_string(),
                redirect_target: None,
                entity_id: entity_id.map(str::to_string),
            },
        );
        self
    }

    pub fn with_redirect(mut self, title: &str, target: &str) -> Self {
        self.pages.insert(
            title.to_string(),
            Page {
                title: title.to_string(),
                redirect_target: Some(target.to_string()),
                entity_id: None,
            },
        );
        self
    }

    /// Convenience: search hit + page + entity id for a label in one go
    pub fn with_article(self, label: &str, entity_id: &str) -> Self {
        self.with_search(label, &[label]).with_page(label, Some(entity_id))
    }

    /// Entity with an English label and entity-valued claims, one (property, target) per pair
    pub fn with_entity(mut self, id: &str, label: Option<&str>, claims: &[(&str, &str)]) -> Self {
        let mut entity = Entity {
            id: id.to_string(),
            ..Entity::default()
        };
        if let Some(label) = label {
            entity.labels.insert("en".to_string(), label.to_string());
        }
        for (property, target) in claims {
            entity
                .claims
                .entry(property.to_string())
                .or_default()
                .push(ClaimTarget::Entity(target.to_string()));
        }
        self.entities.insert(id.to_string(), entity);
        self
    }

    /// Entity whose claims only have literal values
    pub fn with_literal_claims(mut self, id: &str, properties: &[&str]) -> Self {
        let mut entity = Entity {
            id: id.to_string(),
            ..Entity::default()
        };
        for property in properties {
            entity
                .claims
                .insert(property.to_string(), vec![ClaimTarget::Literal]);
        }
        self.entities.insert(id.to_string(), entity);
        self
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            return Err(GraphseedError::KnowledgeBase("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl KnowledgeBase for InMemoryKb {
    async fn search(&self, text: &str, limit: usize) -> Result<Vec<SearchHit>> {
        self.record(format!("search:{}", text))?;
        Ok(self
            .search
            .get(text)
            .map(|titles| {
                titles
                    .iter()
                    .take(limit)
                    .map(|t| SearchHit { title: t.clone() })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn page(&self, title: &str) -> Result<Option<Page>> {
        self.record(format!("page:{}", title))?;
        Ok(self.pages.get(title).cloned())
    }

    async fn get_entity(&self, id: &str) -> Result<Option<Entity>> {
        self.record(format!("entity:{}", id))?;
        Ok(self.entities.get(id).cloned())
    }
}
