//! MediaWiki action API client: Wikipedia for search and pages, Wikidata for entities.

use crate::config::KnowledgeBaseConfig;
use crate::error::{GraphseedError, Result};
use crate::kb::{ClaimTarget, Entity, KnowledgeBase, Page, SearchHit};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    title: String,
}

#[derive(Deserialize)]
struct PageResponse {
    query: Option<PageQuery>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct PageQuery {
    #[serde(default)]
    redirects: Vec<Redirect>,
    #[serde(default)]
    pages: Vec<PageItem>,
}

#[derive(Deserialize)]
struct Redirect {
    to: String,
}

#[derive(Deserialize)]
struct PageItem {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    pageprops: Option<PageProps>,
}

#[derive(Deserialize)]
struct PageProps {
    wikibase_item: Option<String>,
}

#[derive(Deserialize)]
struct EntitiesResponse {
    #[serde(default)]
    entities: HashMap<String, EntityItem>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct EntityItem {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    missing: Option<String>,
    #[serde(default)]
    labels: HashMap<String, LabelValue>,
    #[serde(default)]
    claims: HashMap<String, Vec<Statement>>,
}

#[derive(Deserialize)]
struct LabelValue {
    value: String,
}

#[derive(Deserialize)]
struct Statement {
    mainsnak: Snak,
}

#[derive(Deserialize)]
struct Snak {
    #[serde(default)]
    datavalue: Option<DataValue>,
}

#[derive(Deserialize)]
struct DataValue {
    #[serde(rename = "type")]
    kind: String,
    value: serde_json::Value,
}

impl Statement {
    fn target(&self) -> ClaimTarget {
        match &self.mainsnak.datavalue {
            Some(dv) if dv.kind == "wikibase-entityid" => dv
                .value
                .get("id")
                .and_then(|id| id.as_str())
                .map(|id| ClaimTarget::Entity(id.to_string()))
                .unwrap_or(ClaimTarget::Literal),
            _ => ClaimTarget::Literal,
        }
    }
}

/// Wikipedia + Wikidata over HTTP
pub struct WikimediaClient {
    client: Client,
    wikipedia_api: String,
    wikidata_api: String,
    language: String,
}

impl WikimediaClient {
    pub fn new(
        wikipedia_api: &str,
        wikidata_api: &str,
        language: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self> {
        // Wikimedia rejects anonymous clients without a user agent
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| GraphseedError::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            wikipedia_api: wikipedia_api.to_string(),
            wikidata_api: wikidata_api.to_string(),
            language: language.to_string(),
        })
    }

    pub fn from_config(config: &KnowledgeBaseConfig) -> Result<Self> {
        Self::new(
            &config.wikipedia_api,
            &config.wikidata_api,
            &config.language,
            &config.user_agent,
            Duration::from_secs(config.timeout_secs),
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, params: &[(&str, &str)]) -> Result<T> {
        let start = std::time::Instant::now();
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| GraphseedError::KnowledgeBase(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GraphseedError::KnowledgeBase(format!(
                "{} returned {}",
                url, status
            )));
        }

        let parsed = response
            .json::<T>()
            .await
            .map_err(|e| GraphseedError::KnowledgeBase(format!("Failed to parse response: {}", e)))?;
        log::debug!("GET {} took {:?}", url, start.elapsed());
        Ok(parsed)
    }
}

fn api_failure(err: ApiError) -> GraphseedError {
    GraphseedError::KnowledgeBase(format!("{}: {}", err.code, err.info))
}

#[async_trait::async_trait]
impl KnowledgeBase for WikimediaClient {
    async fn search(&self, text: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let limit = limit.to_string();
        let response: SearchResponse = self
            .get_json(
                &self.wikipedia_api,
                &[
                    ("action", "query"),
                    ("list", "search"),
                    ("srsearch", text),
                    ("srlimit", limit.as_str()),
                    ("format", "json"),
                    ("formatversion", "2"),
                ],
            )
            .await?;

        if let Some(err) = response.error {
            return Err(api_failure(err));
        }

        Ok(response
            .query
            .map(|q| q.search)
            .unwrap_or_default()
            .into_iter()
            .map(|item| SearchHit { title: item.title })
            .collect())
    }

    async fn page(&self, title: &str) -> Result<Option<Page>> {
        let response: PageResponse = self
            .get_json(
                &self.wikipedia_api,
                &[
                    ("action", "query"),
                    ("titles", title),
                    ("prop", "pageprops"),
                    ("ppprop", "wikibase_item"),
                    ("redirects", "1"),
                    ("format", "json"),
                    ("formatversion", "2"),
                ],
            )
            .await?;

        if let Some(err) = response.error {
            return Err(api_failure(err));
        }

        let Some(query) = response.query else {
            return Ok(None);
        };

        // The API resolves whole chains; report only the first hop so the
        // caller decides how far to follow
        if let Some(redirect) = query.redirects.into_iter().next() {
            return Ok(Some(Page {
                title: title.to_string(),
                redirect_target: Some(redirect.to),
                entity_id: None,
            }));
        }

        Ok(query
            .pages
            .into_iter()
            .next()
            .filter(|p| !p.missing && !p.invalid)
            .map(|p| Page {
                title: p.title,
                redirect_target: None,
                entity_id: p.pageprops.and_then(|pp| pp.wikibase_item),
            }))
    }

    async fn get_entity(&self, id: &str) -> Result<Option<Entity>> {
        let response: EntitiesResponse = self
            .get_json(
                &self.wikidata_api,
                &[
                    ("action", "wbgetentities"),
                    ("ids", id),
                    ("props", "labels|claims"),
                    ("languages", self.language.as_str()),
                    ("format", "json"),
                ],
            )
            .await?;

        if let Some(err) = response.error {
            if err.code == "no-such-entity" {
                return Ok(None);
            }
            return Err(api_failure(err));
        }

        let Some(item) = response.entities.into_values().next() else {
            return Ok(None);
        };
        if item.missing.is_some() {
            return Ok(None);
        }

        Ok(Some(Entity {
            id: item.id.unwrap_or_else(|| id.to_string()),
            labels: item
                .labels
                .into_iter()
                .map(|(lang, label)| (lang, label.value))
                .collect(),
            claims: item
                .claims
                .into_iter()
                .map(|(property, statements)| {
                    (property, statements.iter().map(Statement::target).collect())
                })
                .collect(),
        }))
    }
}
