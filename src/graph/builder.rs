//! Breadth-first, depth- and branch-bounded graph construction.
//!
//! Each dequeued (label, depth) entry is fully expanded before the next one:
//! paraphrase the label, look up relations for every surface form, keep the
//! allow-listed ones (or generate relation labels when none survive), then
//! generate one object per relation until the branch cap is reached.

use std::collections::{HashSet, VecDeque};

use crate::config::GraphConfig;
use crate::error::Result;
use crate::generate::object::split_objects;
use crate::generate::{ObjectGenerator, Paraphraser, NO_ANSWER};
use crate::graph::{KnowledgeGraph, NodeKeyPolicy, ObjectStrategy};
use crate::kb::{is_unresolvable, AllowList, LabelResolver};
use crate::llm::ModelChoice;
use crate::relations::RelationSource;

/// Traversal limits and expansion policies
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub max_depth: usize,
    /// Maximum new outgoing edges per expanded node
    pub branch_limit: usize,
    pub model: ModelChoice,
    /// Whether an already-existing (subject, object) pair uses up a branch
    pub count_duplicate_skips: bool,
    /// Split comma-separated answers into one edge per value
    pub split_multi_valued_objects: bool,
    /// Keep `"No answer found."` as an object node
    pub keep_unanswered_objects: bool,
    pub node_key: NodeKeyPolicy,
    pub object_strategy: ObjectStrategy,
    pub consensus_min_votes: usize,
}

impl BuildOptions {
    pub fn new(max_depth: usize, branch_limit: usize, model: ModelChoice) -> Self {
        Self {
            max_depth,
            branch_limit,
            model,
            count_duplicate_skips: false,
            split_multi_valued_objects: false,
            keep_unanswered_objects: true,
            node_key: NodeKeyPolicy::ExactLabel,
            object_strategy: ObjectStrategy::Direct,
            consensus_min_votes: 2,
        }
    }

    pub fn from_config(config: &GraphConfig) -> Result<Self> {
        Ok(Self {
            max_depth: config.max_depth,
            branch_limit: config.branch_limit,
            model: config.model_name.parse()?,
            count_duplicate_skips: config.count_duplicate_skips,
            split_multi_valued_objects: config.split_multi_valued_objects,
            keep_unanswered_objects: config.keep_unanswered_objects,
            node_key: config.node_key,
            object_strategy: config.object_strategy,
            consensus_min_votes: config.consensus_min_votes,
        })
    }
}

/// Counters collected over one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Entries that went through relation discovery
    pub expanded: usize,
    /// Entries at max_depth, kept as leaves
    pub leaves: usize,
    /// Entries deeper than max_depth, dropped on dequeue
    pub discarded: usize,
    /// Expansions that fell back to generated relation labels
    pub relation_fallbacks: usize,
    pub duplicate_skips: usize,
    pub unanswered: usize,
}

/// Relation labels chosen for one subject, in expansion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredRelations {
    pub labels: Vec<String>,
    /// No allow-listed relation survived; `labels` were generated
    pub generated: bool,
}

pub struct BuildOutcome {
    pub graph: KnowledgeGraph,
    pub stats: BuildStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FrontierEntry {
    label: String,
    depth: usize,
}

/// What happened to a dequeued entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expansion {
    Discarded,
    Leaf,
    Expanded { new_edges: usize },
}

pub struct GraphBuilder {
    resolver: LabelResolver,
    paraphraser: Paraphraser,
    relations: RelationSource,
    objects: ObjectGenerator,
    allow_list: AllowList,
    options: BuildOptions,
}

impl GraphBuilder {
    pub fn new(
        resolver: LabelResolver,
        paraphraser: Paraphraser,
        relations: RelationSource,
        objects: ObjectGenerator,
        allow_list: AllowList,
        options: BuildOptions,
    ) -> Self {
        Self {
            resolver,
            paraphraser,
            relations,
            objects,
            allow_list,
            options,
        }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn resolver(&self) -> &LabelResolver {
        &self.resolver
    }

    /// Build the graph rooted at `root_label`. Always terminates; never fails.
    pub async fn construct(&self, root_label: &str) -> BuildOutcome {
        let mut graph = KnowledgeGraph::new(self.options.node_key);
        let mut frontier = VecDeque::new();
        let mut stats = BuildStats::default();

        log::info!("Starting graph construction with root entity: {}", root_label);
        frontier.push_back(FrontierEntry {
            label: root_label.to_string(),
            depth: 0,
        });

        while let Some(entry) = frontier.pop_front() {
            log::info!("Processing entity: {} at depth: {}", entry.label, entry.depth);
            match self
                .expand(&entry, &mut graph, &mut frontier, &mut stats)
                .await
            {
                Expansion::Discarded => stats.discarded += 1,
                Expansion::Leaf => stats.leaves += 1,
                Expansion::Expanded { new_edges } => {
                    stats.expanded += 1;
                    log::debug!("Expanded '{}' with {} new edges", entry.label, new_edges);
                }
            }
        }

        log::info!(
            "Graph construction completed: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        BuildOutcome { graph, stats }
    }

    async fn expand(
        &self,
        entry: &FrontierEntry,
        graph: &mut KnowledgeGraph,
        frontier: &mut VecDeque<FrontierEntry>,
        stats: &mut BuildStats,
    ) -> Expansion {
        if entry.depth > self.options.max_depth {
            log::debug!("Depth {} exceeds max depth, skipping '{}'", entry.depth, entry.label);
            return Expansion::Discarded;
        }

        if graph.add_node(&entry.label) {
            log::info!("Added node: {} at depth {}", entry.label, entry.depth);
        }

        if entry.depth == self.options.max_depth {
            log::debug!("Reached maximum depth at node: {}, not expanding further", entry.label);
            return Expansion::Leaf;
        }

        let discovered = self.discover_relations(&entry.label).await;
        if discovered.generated {
            stats.relation_fallbacks += 1;
        }

        let mut new_edges = 0;
        'relations: for relation in &discovered.labels {
            if new_edges >= self.options.branch_limit {
                log::debug!("Branch limit reached for '{}'", entry.label);
                break;
            }

            for object in self.objects_for(&entry.label, relation, stats).await {
                if new_edges >= self.options.branch_limit {
                    break 'relations;
                }

                if graph.add_edge(&entry.label, &object, relation) {
                    log::info!(
                        "Added edge from '{}' to '{}' with relation '{}' at depth {}",
                        entry.label,
                        object,
                        relation,
                        entry.depth
                    );
                    let label = graph.canonical(&object).unwrap_or(object.as_str()).to_string();
                    frontier.push_back(FrontierEntry {
                        label,
                        depth: entry.depth + 1,
                    });
                    new_edges += 1;
                } else {
                    stats.duplicate_skips += 1;
                    if self.options.count_duplicate_skips {
                        new_edges += 1;
                    }
                }
            }
        }

        Expansion::Expanded { new_edges }
    }

    /// Relations `label` is expanded with.
    ///
    /// Allow-listed relations of the label and its paraphrases, in allow-list
    /// order; generated relation labels when none survive.
    pub async fn discover_relations(&self, label: &str) -> DiscoveredRelations {
        let paraphrases = self.paraphraser.paraphrase_subject(label).await;

        let mut candidates = vec![label.to_string()];
        for paraphrase in paraphrases {
            if !candidates.contains(&paraphrase) {
                candidates.push(paraphrase);
            }
        }

        let mut retained = HashSet::new();
        for candidate in &candidates {
            let id = self.resolver.id_of(candidate).await;
            let relations = self.relations.relations_of(id.as_deref()).await;
            retained.extend(
                relations
                    .into_iter()
                    .filter(|r| self.allow_list.contains(r)),
            );
        }

        if retained.is_empty() {
            log::info!("No allow-listed relations for '{}', generating relations", label);
            return DiscoveredRelations {
                labels: self.relations.generate_relations(label).await,
                generated: true,
            };
        }

        let mut labels = Vec::new();
        for id in self.allow_list.ids().iter().filter(|id| retained.contains(*id)) {
            let relation_label = self.resolver.label_of(id).await;
            if is_unresolvable(&relation_label) {
                log::warn!("Skipping relation {}: {}", id, relation_label);
                continue;
            }
            if !labels.contains(&relation_label) {
                labels.push(relation_label);
            }
        }
        log::info!("Relations for '{}': {:?}", label, labels);
        DiscoveredRelations {
            labels,
            generated: false,
        }
    }

    /// Object labels for one (subject, relation) pair under the configured policies
    async fn objects_for(&self, subject: &str, relation: &str, stats: &mut BuildStats) -> Vec<String> {
        let answers = match self.options.object_strategy {
            ObjectStrategy::Direct => {
                let answer = self
                    .objects
                    .generate_object(subject, relation, self.options.model)
                    .await;
                if answer == NO_ANSWER {
                    stats.unanswered += 1;
                    if !self.options.keep_unanswered_objects {
                        return Vec::new();
                    }
                }
                vec![answer]
            }
            ObjectStrategy::Consensus => self.consensus_objects(subject, relation, stats).await,
        };

        if self.options.split_multi_valued_objects {
            answers.iter().flat_map(|a| split_objects(a)).collect()
        } else {
            answers
        }
    }

    /// Objects that at least `consensus_min_votes` phrasings of `relation` agree on
    async fn consensus_objects(
        &self,
        subject: &str,
        relation: &str,
        stats: &mut BuildStats,
    ) -> Vec<String> {
        let mut phrasings: Vec<String> = self
            .paraphraser
            .paraphrase_relation(relation)
            .await
            .into_iter()
            .filter(|p| p != relation)
            .collect();
        phrasings.sort();
        phrasings.insert(0, relation.to_string());

        let mut votes: Vec<(String, usize)> = Vec::new();
        for phrasing in &phrasings {
            let answer = self
                .objects
                .generate_object(subject, phrasing, self.options.model)
                .await;
            if answer == NO_ANSWER {
                stats.unanswered += 1;
                continue;
            }
            match votes.iter_mut().find(|(object, _)| *object == answer) {
                Some((_, count)) => *count += 1,
                None => votes.push((answer, 1)),
            }
        }

        let accepted: Vec<String> = votes
            .into_iter()
            .filter(|(_, count)| *count >= self.options.consensus_min_votes)
            .map(|(object, _)| object)
            .collect();
        log::debug!(
            "Consensus objects for '{} # {}' over {} phrasings: {:?}",
            subject,
            relation,
            phrasings.len(),
            accepted
        );
        accepted
    }
}
