//! pathmine CLI: inferential-path mining over entity graphs.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use pathmine::config::MiningConfig;
use pathmine::dataset::{self, GraphDocument};
use pathmine::engine::{Collaborators, Miner};
use pathmine::export::{export_paths, export_patterns};
use pathmine::graph::{CompatibilityTable, KnowledgeBase};
use pathmine::pattern::StaticFrequency;

#[derive(Parser)]
#[command(name = "pathmine", version, about = "Inferential-path mining engine")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mine weighted patterns from a graph.
    Mine {
        #[command(flatten)]
        input: Input,

        #[command(flatten)]
        overrides: Overrides,

        /// Document-frequency table (JSON rows of names and count).
        #[arg(long)]
        frequency: Option<PathBuf>,

        /// Show only the heaviest N patterns.
        #[arg(long)]
        top: Option<usize>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print the raw path corpus.
    Paths {
        #[command(flatten)]
        input: Input,

        #[command(flatten)]
        overrides: Overrides,

        /// Print each fact sequence once.
        #[arg(long)]
        distinct: bool,

        /// Print JSON instead of one path per line.
        #[arg(long)]
        json: bool,
    },

    /// Reconcile a graph with a knowledge base and print the result as JSON.
    Enforce {
        #[command(flatten)]
        input: Input,

        /// Confidence cutoff (0 disables pruning).
        #[arg(long)]
        cutoff: Option<f32>,

        /// Write the enforced graph here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML.
    Config,
}

#[derive(Args)]
struct Input {
    /// Graph file (JSON with entities and facts).
    #[arg(long)]
    graph: PathBuf,

    /// Knowledge-base file (JSON with facts and compatible relation pairs).
    #[arg(long)]
    kb: Option<PathBuf>,
}

#[derive(Args)]
struct Overrides {
    /// Maximum open-path length.
    #[arg(long)]
    max_depth: Option<usize>,

    /// Aggregation worker count.
    #[arg(long)]
    workers: Option<usize>,

    /// Confidence cutoff (0 disables pruning).
    #[arg(long)]
    cutoff: Option<f32>,

    /// Scale weights by document co-occurrence (`--document-factor=false` to disable).
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    document_factor: Option<bool>,

    /// Attach facts to trie nodes by entity name when identity fails.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    alias_fallback: Option<bool>,
}

impl Overrides {
    fn apply(&self, config: &mut MiningConfig) {
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        if let Some(workers) = self.workers {
            config.worker_count = workers;
        }
        if let Some(cutoff) = self.cutoff {
            config.confidence_cutoff = cutoff;
        }
        if let Some(enabled) = self.document_factor {
            config.document_factor = enabled;
        }
        if let Some(enabled) = self.alias_fallback {
            config.name_alias_fallback = enabled;
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<MiningConfig> {
    Ok(match path {
        Some(path) => MiningConfig::load(path)?,
        None => MiningConfig::default(),
    })
}

fn load_knowledge(path: Option<&Path>) -> Result<Option<(KnowledgeBase, CompatibilityTable)>> {
    path.map(dataset::load_knowledge)
        .transpose()
        .map_err(Into::into)
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Mine {
            input,
            overrides,
            frequency,
            top,
            json,
        } => {
            overrides.apply(&mut config);
            let miner = Miner::new(config)?;
            let mut graph = dataset::load_graph(&input.graph)?;
            let knowledge = load_knowledge(input.kb.as_deref())?;
            let table: Option<StaticFrequency> =
                frequency.as_deref().map(dataset::load_frequency).transpose()?;

            let mut collab = Collaborators::new();
            if let Some((kb, compat)) = &knowledge {
                collab = collab.with_knowledge(kb, compat);
            }
            if let Some(table) = &table {
                collab = collab.with_frequency(table);
            }

            let report = miner.run(&mut graph, &collab)?;
            let rows = export_patterns(&report.patterns, top);

            if json {
                let json = serde_json::to_string_pretty(&rows).into_diagnostic()?;
                println!("{json}");
            } else {
                let e = &report.enforcement;
                println!(
                    "Enforcement: {} contradictions removed, {} pruned, {} gaps filled",
                    e.contradictions_removed, e.pruned, e.gaps_filled
                );
                println!(
                    "Paths: {} ({} loops), patterns: {}, total weight: {:.3}",
                    report.corpus.len(),
                    report.corpus.stats().loops,
                    report.patterns.len(),
                    report.patterns.total()
                );
                if rows.is_empty() {
                    println!("No patterns found.");
                }
                for row in &rows {
                    println!("  {:>10.3}  [{}] {}", row.weight, row.kind, row.pattern);
                }
            }
        }

        Commands::Paths {
            input,
            overrides,
            distinct,
            json,
        } => {
            overrides.apply(&mut config);
            let miner = Miner::new(config)?;
            let mut graph = dataset::load_graph(&input.graph)?;
            let knowledge = load_knowledge(input.kb.as_deref())?;

            let mut collab = Collaborators::new();
            if let Some((kb, compat)) = &knowledge {
                collab = collab.with_knowledge(kb, compat);
            }

            miner.enforce(&mut graph, &collab)?;
            let corpus = miner.search(&graph)?;

            if json {
                let rows = export_paths(&corpus, distinct);
                let json = serde_json::to_string_pretty(&rows).into_diagnostic()?;
                println!("{json}");
            } else if distinct {
                for path in corpus.distinct() {
                    println!("{path}");
                }
            } else {
                for path in corpus.paths() {
                    println!("{path}");
                }
            }
        }

        Commands::Enforce {
            input,
            cutoff,
            output,
        } => {
            if let Some(cutoff) = cutoff {
                config.confidence_cutoff = cutoff;
            }
            let miner = Miner::new(config)?;
            let mut graph = dataset::load_graph(&input.graph)?;
            let knowledge = load_knowledge(input.kb.as_deref())?;

            let mut collab = Collaborators::new();
            if let Some((kb, compat)) = &knowledge {
                collab = collab.with_knowledge(kb, compat);
            }

            let report = miner.enforce(&mut graph, &collab)?;
            eprintln!(
                "Enforcement: {} contradictions removed, {} pruned, {} gaps filled",
                report.contradictions_removed, report.pruned, report.gaps_filled
            );

            let doc = GraphDocument::from_graph(&graph);
            match output {
                Some(path) => {
                    dataset::write_json(&path, &doc)?;
                    eprintln!("Wrote {} facts to {}", doc.facts.len(), path.display());
                }
                None => {
                    let json = serde_json::to_string_pretty(&doc).into_diagnostic()?;
                    println!("{json}");
                }
            }
        }

        Commands::Config => {
            config.validate()?;
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
