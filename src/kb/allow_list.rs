use crate::error::{GraphseedError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Deserialize)]
struct AllowListFile {
    #[serde(default)]
    relation: Vec<AllowListEntry>,
}

/// `name` is for readers of the file; only `id` is used
#[derive(Deserialize)]
struct AllowListEntry {
    #[serde(default)]
    id: String,
}

/// Curated relation ids considered in scope for structured expansion.
///
/// Entry order is kept; it decides which relations a node expands first.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    ids: Vec<String>,
    index: HashSet<String>,
}

impl AllowList {
    /// Build from ids, dropping blanks and repeats
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        for id in ids {
            let id = id.into().trim().to_string();
            if !id.is_empty() && list.index.insert(id.clone()) {
                list.ids.push(id);
            }
        }
        list
    }

    /// Parse the TOML form:
    ///
    /// ```toml
    /// [[relation]]
    /// name = "place of birth"
    /// id = "P19"
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: AllowListFile = toml::from_str(content)
            .map_err(|e| GraphseedError::Parse(format!("allow-list: {}", e)))?;
        Ok(Self::from_ids(file.relation.into_iter().map(|e| e.id)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let list = Self::from_toml_str(&content)?;
        log::info!("Loaded {} allowed relations from {}", list.len(), path.display());
        Ok(list)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Ids in curated order
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
