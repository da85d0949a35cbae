use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use graphseed::generate::{ObjectGenerator, Paraphraser};
use graphseed::graph::{depths_from, BuildOptions, GraphBuilder, GraphSink, JsonFileSink};
use graphseed::kb::{is_unresolvable, AllowList, KnowledgeBase, LabelResolver, WikimediaClient};
use graphseed::llm::{ObjectBackends, OpenAiChat, TextGenerator};
use graphseed::relations::RelationSource;
use graphseed::Config;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "graphseed")]
#[command(about = "Grow a knowledge graph from a root entity using a knowledge base and language models")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the graph and write it as JSON
    Build {
        /// Root entity id (overrides graph.root_entity)
        #[arg(long)]
        root: Option<String>,

        /// Start from this label instead of looking the root id up
        #[arg(long)]
        root_label: Option<String>,

        #[arg(long)]
        max_depth: Option<usize>,

        #[arg(long)]
        branch_limit: Option<usize>,

        /// Object backend: gpt2_xl, gpt_j or llama2
        #[arg(long)]
        model: Option<String>,

        /// Output file (overrides output.path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the label of a knowledge-base id
    Label { id: String },
    /// Print the knowledge-base id a label resolves to
    Resolve { label: String },
    /// Print paraphrases of an entity label, or of a relation label with --relation
    Paraphrase {
        label: String,

        #[arg(long)]
        relation: bool,
    },
    /// Print the relations the builder would expand a label with
    Relations { label: String },
}

fn build_kb(config: &Config) -> Result<Arc<dyn KnowledgeBase>> {
    let client = WikimediaClient::from_config(&config.knowledge_base)?;
    Ok(Arc::new(client))
}

fn build_resolver(config: &Config, kb: Arc<dyn KnowledgeBase>) -> LabelResolver {
    LabelResolver::new(kb, &config.knowledge_base.language)
        .with_cache(config.knowledge_base.label_cache_capacity)
}

fn build_chat(config: &Config) -> Result<Arc<dyn TextGenerator>> {
    let chat = OpenAiChat::new(
        config.api_key()?,
        config.llm.model.clone(),
        &config.llm.base_url,
        Duration::from_secs(config.llm.timeout_secs),
    )?
    .with_max_retries(config.llm.max_retries);
    Ok(Arc::new(chat))
}

fn build_builder(config: &Config, options: BuildOptions) -> Result<GraphBuilder> {
    let kb = build_kb(config)?;
    let chat = build_chat(config)?;
    let backends = ObjectBackends::from_config(&config.backends)?;
    if backends.get(options.model).is_none() {
        anyhow::bail!("No [backends.{}] section is configured", options.model);
    }
    let allow_list = AllowList::load(&config.knowledge_base.allow_list)?;
    if allow_list.is_empty() {
        log::warn!("Allow-list is empty; every expansion will use generated relations");
    }

    Ok(GraphBuilder::new(
        build_resolver(config, kb.clone()),
        Paraphraser::new(chat.clone(), config.llm.max_tokens),
        RelationSource::new(kb, chat, config.llm.max_tokens),
        ObjectGenerator::new(backends),
        allow_list,
        options,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load()?;

    // RUST_LOG wins over the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", config.output.log_level.as_str()),
    )
    .init();

    log::info!("Starting graphseed v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Build {
            root,
            root_label,
            max_depth,
            branch_limit,
            model,
            output,
        } => {
            let mut config = config;
            if let Some(root) = root {
                config.graph.root_entity = root;
                config.graph.root_label = None;
            }
            if root_label.is_some() {
                config.graph.root_label = root_label;
            }
            if let Some(max_depth) = max_depth {
                config.graph.max_depth = max_depth;
            }
            if let Some(branch_limit) = branch_limit {
                if branch_limit == 0 {
                    anyhow::bail!("--branch-limit must be greater than 0");
                }
                config.graph.branch_limit = branch_limit;
            }
            if let Some(model) = model {
                config.graph.model_name = model;
            }
            if let Some(output) = output {
                config.output.path = output;
            }
            run_build(&config).await?;
        }
        Command::Label { id } => {
            let resolver = build_resolver(&config, build_kb(&config)?);
            println!("{}", resolver.label_of(&id).await);
        }
        Command::Resolve { label } => {
            let resolver = build_resolver(&config, build_kb(&config)?);
            match resolver.id_of(&label).await {
                Some(id) => println!("{}", id),
                None => println!("No entity found for '{}'", label),
            }
        }
        Command::Paraphrase { label, relation } => {
            let paraphraser = Paraphraser::new(build_chat(&config)?, config.llm.max_tokens);
            if relation {
                let mut paraphrases: Vec<_> =
                    paraphraser.paraphrase_relation(&label).await.into_iter().collect();
                paraphrases.sort();
                for p in paraphrases {
                    println!("{}", p);
                }
            } else {
                for p in paraphraser.paraphrase_subject(&label).await {
                    println!("{}", p);
                }
            }
        }
        Command::Relations { label } => {
            run_relations(&config, &label).await?;
        }
    }

    Ok(())
}

async fn run_build(config: &Config) -> Result<()> {
    let options = BuildOptions::from_config(&config.graph)?;
    let builder = build_builder(config, options)?;

    let root = match &config.graph.root_label {
        Some(label) => label.clone(),
        None => {
            let label = builder.resolver().label_of(&config.graph.root_entity).await;
            if is_unresolvable(&label) {
                anyhow::bail!(
                    "Could not resolve root entity {}: {}",
                    config.graph.root_entity,
                    label
                );
            }
            label
        }
    };

    log::info!(
        "Building graph from '{}' (max_depth={}, branch_limit={}, model={})",
        root,
        builder.options().max_depth,
        builder.options().branch_limit,
        builder.options().model
    );

    let start = Instant::now();
    let outcome = builder.construct(&root).await;
    let elapsed = start.elapsed();

    JsonFileSink::new(&config.output.path)
        .write(&outcome.graph, &root)
        .with_context(|| format!("Failed to write {}", config.output.path.display()))?;

    let mut per_depth: BTreeMap<usize, usize> = BTreeMap::new();
    for depth in depths_from(&outcome.graph, &root).into_values() {
        *per_depth.entry(depth).or_default() += 1;
    }

    let stats = &outcome.stats;
    println!("Root: {}", root);
    println!(
        "Nodes: {}  Edges: {}  ({:.1}s)",
        outcome.graph.node_count(),
        outcome.graph.edge_count(),
        elapsed.as_secs_f64()
    );
    for (depth, count) in &per_depth {
        println!("  depth {}: {} nodes", depth, count);
    }
    println!(
        "Expanded: {}  Leaves: {}  Relation fallbacks: {}  Duplicate skips: {}  Unanswered: {}",
        stats.expanded,
        stats.leaves,
        stats.relation_fallbacks,
        stats.duplicate_skips,
        stats.unanswered
    );
    println!("Written to {}", config.output.path.display());

    Ok(())
}

async fn run_relations(config: &Config, label: &str) -> Result<()> {
    let builder = build_builder(config, BuildOptions::from_config(&config.graph)?)?;
    let discovered = builder.discover_relations(label).await;

    if discovered.generated {
        println!("No allow-listed relations for '{}'; generated:", label);
    } else {
        println!("Allow-listed relations for '{}':", label);
    }
    for relation in &discovered.labels {
        println!("  {}", relation);
    }
    Ok(())
}
