//! Candidate relations for a subject: structured lookup first, generation as fallback.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::generate::sanitize::{sanitize_input, split_hash_list};
use crate::kb::{ClaimTarget, KnowledgeBase};
use crate::llm::TextGenerator;

const RELATIONS_SYSTEM: &str =
    "Answer the query exactly in the format of the provided examples, listing attributes separated by #.";

const RELATION_EXAMPLES: &str = "Q: Javier Culson\n\
A: participant of # place of birth # sex or gender # country of citizenship # occupation # family name # given name # educated at # sport # sports discipline competed in\n\
Q: René Magritte\n\
A: ethnic group # place of birth # place of death # sex or gender # spouse # country of citizenship # member of political party # native language # place of burial # cause of death # residence # family name # given name # manner of death # educated at # field of work # work location # represented by\n\
Q: Nadym\n\
A: country # capital of # coordinate location # population # area # elevation above sea level\n\
Q: Stryn\n\
A: significant event # head of government # country # capital # separated from\n\
Q: 1585\n\
A: said to be the same as # follows\n\
Q: Bornheim\n\
A: head of government # country # member of # coordinate location # population # area # elevation above sea level\n\
Q: Aló Presidente\n\
A: genre # country of origin # cast member # original network\n";

pub fn relations_prompt(label: &str) -> String {
    format!("{}Q: {}\nA:", RELATION_EXAMPLES, label)
}

pub struct RelationSource {
    kb: Arc<dyn KnowledgeBase>,
    llm: Arc<dyn TextGenerator>,
    max_tokens: u32,
}

impl RelationSource {
    pub fn new(kb: Arc<dyn KnowledgeBase>, llm: Arc<dyn TextGenerator>, max_tokens: u32) -> Self {
        Self { kb, llm, max_tokens }
    }

    /// Property ids of `id`'s claims that point at other entities.
    ///
    /// Absent ids and failed lookups give an empty set.
    pub async fn relations_of(&self, id: Option<&str>) -> BTreeSet<String> {
        let Some(id) = id else {
            return BTreeSet::new();
        };

        let entity = match self.kb.get_entity(id).await {
            Ok(Some(entity)) => entity,
            Ok(None) => {
                log::debug!("No entity for {}", id);
                return BTreeSet::new();
            }
            Err(e) => {
                log::warn!("Failed to fetch entity {}: {}", id, e);
                return BTreeSet::new();
            }
        };

        let relations: BTreeSet<String> = entity
            .claims
            .into_iter()
            .filter(|(_, targets)| targets.iter().any(|t| matches!(t, ClaimTarget::Entity(_))))
            .map(|(property, _)| property)
            .collect();
        log::debug!("Relations fetched for {}: {:?}", id, relations);
        relations
    }

    /// Plausible relation labels for `label`, generated in `a # b # c` form
    pub async fn generate_relations(&self, label: &str) -> Vec<String> {
        let response = match self
            .llm
            .complete(RELATIONS_SYSTEM, &relations_prompt(label), self.max_tokens)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Relation generation failed for '{}': {}", label, e);
                return Vec::new();
            }
        };

        let flattened = response.trim().replace('\n', " ");
        let relations: Vec<String> = split_hash_list(&flattened)
            .into_iter()
            .map(sanitize_input)
            .filter(|r| !r.is_empty())
            .collect();
        log::info!("Generated relations for '{}': {:?}", label, relations);
        relations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryKb, ScriptedGenerator};

    fn source(kb: InMemoryKb, llm: ScriptedGenerator) -> RelationSource {
        RelationSource::new(Arc::new(kb), Arc::new(llm), 100)
    }

    #[tokio::test]
    async fn test_relations_of_entity_valued_claims_only() {
        let kb = InMemoryKb::new()
            .with_entity("Q76", Some("Barack Obama"), &[("P26", "Q13133"), ("P27", "Q30")]);
        let relations = source(kb, ScriptedGenerator::failing())
            .relations_of(Some("Q76"))
            .await;
        assert_eq!(relations.into_iter().collect::<Vec<_>>(), vec!["P26", "P27"]);

        let literal = InMemoryKb::new().with_literal_claims("Q1", &["P569", "P1477"]);
        let relations = source(literal, ScriptedGenerator::failing())
            .relations_of(Some("Q1"))
            .await;
        assert!(relations.is_empty());
    }

    #[tokio::test]
    async fn test_relations_of_absent_or_failing() {
        let src = source(InMemoryKb::failing(), ScriptedGenerator::failing());
        assert!(src.relations_of(None).await.is_empty());
        assert!(src.relations_of(Some("Q76")).await.is_empty());

        let src = source(InMemoryKb::new(), ScriptedGenerator::failing());
        assert!(src.relations_of(Some("Q404")).await.is_empty());
    }

    #[test]
    fn test_relations_prompt_has_seven_examples() {
        let prompt = relations_prompt("Barack Obama");
        assert_eq!(prompt.matches("\nA: ").count(), 7);
        assert!(prompt.ends_with("Q: Barack Obama\nA:"));
    }

    #[tokio::test]
    async fn test_generate_relations_splits_and_sanitizes() {
        let llm = ScriptedGenerator::constant("1. spouse # country of citizenship\n# occupation #  # 2. educated at");
        let relations = source(InMemoryKb::new(), llm)
            .generate_relations("Barack Obama")
            .await;
        assert_eq!(
            relations,
            vec!["spouse", "country of citizenship", "occupation", "educated at"]
        );
    }

    #[tokio::test]
    async fn test_generate_relations_failure_is_empty() {
        let relations = source(InMemoryKb::new(), ScriptedGenerator::failing())
            .generate_relations("Barack Obama")
            .await;
        assert!(relations.is_empty());
    }
}
