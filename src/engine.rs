//! Miner facade: top-level API for a mining run.
//!
//! The `Miner` runs the stages in order (consistency enforcement, bounded
//! path search, canonicalization and weighted aggregation) and returns
//! everything a caller may want to inspect in one [`MiningReport`].

use crate::config::MiningConfig;
use crate::error::MineResult;
use crate::graph::{
    BoundedPathSearch, Cooccurrence, EnforcementReport, EntityGraph, GraphConsistencyEnforcer,
    KnowledgeBase, PathCorpus,
};
use crate::pattern::{DocumentFrequency, PatternWeights, WeightedAggregator};
use crate::symbol::Relation;

/// External collaborators consulted during a run. All are optional.
#[derive(Clone, Copy, Default)]
pub struct Collaborators<'a> {
    /// Ground truth for consistency enforcement.
    pub knowledge: Option<&'a KnowledgeBase>,
    /// Relation compatibility; without one, only identical relations co-occur.
    pub compatibility: Option<&'a dyn Cooccurrence>,
    /// Document-frequency oracle, used when `document_factor` is enabled.
    pub frequency: Option<&'a dyn DocumentFrequency>,
}

impl<'a> Collaborators<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_knowledge(mut self, kb: &'a KnowledgeBase, compat: &'a dyn Cooccurrence) -> Self {
        self.knowledge = Some(kb);
        self.compatibility = Some(compat);
        self
    }

    pub fn with_frequency(mut self, oracle: &'a dyn DocumentFrequency) -> Self {
        self.frequency = Some(oracle);
        self
    }
}

/// Everything produced by one mining run.
#[derive(Debug, Clone)]
pub struct MiningReport {
    /// What consistency enforcement changed (all zero when skipped).
    pub enforcement: EnforcementReport,
    /// The raw path corpus.
    pub corpus: PathCorpus,
    /// Aggregated pattern weights.
    pub patterns: PatternWeights,
}

/// The path-mining engine.
#[derive(Debug, Clone)]
pub struct Miner {
    config: MiningConfig,
}

impl Miner {
    /// Create a miner, validating the configuration.
    pub fn new(config: MiningConfig) -> MineResult<Self> {
        config.validate()?;
        tracing::info!(
            max_depth = config.max_depth,
            workers = config.worker_count,
            cutoff = config.confidence_cutoff,
            document_factor = config.document_factor,
            "initializing path miner"
        );
        Ok(Self { config })
    }

    pub fn config(&self) -> &MiningConfig {
        &self.config
    }

    /// Reconcile `graph` with the knowledge base, if one is supplied, and
    /// apply the confidence cutoff.
    pub fn enforce(
        &self,
        graph: &mut EntityGraph,
        collaborators: &Collaborators<'_>,
    ) -> MineResult<EnforcementReport> {
        let empty = KnowledgeBase::new();
        let kb = collaborators.knowledge.unwrap_or(&empty);
        if kb.is_empty() && self.config.confidence_cutoff <= 0.0 {
            return Ok(EnforcementReport::default());
        }
        let identical_only = |a: &Relation, b: &Relation| a == b;
        let compat: &dyn Cooccurrence = match collaborators.compatibility {
            Some(compat) => compat,
            None => &identical_only,
        };
        let report = GraphConsistencyEnforcer::new(kb, compat)
            .with_cutoff(self.config.confidence_cutoff)
            .enforce(graph)?;
        Ok(report)
    }

    /// Enumerate bounded paths over a read-only graph.
    pub fn search(&self, graph: &EntityGraph) -> MineResult<PathCorpus> {
        Ok(BoundedPathSearch::new(graph, self.config.search()).run()?)
    }

    /// Canonicalize and weigh a path corpus.
    pub fn aggregate(
        &self,
        corpus: &PathCorpus,
        collaborators: &Collaborators<'_>,
    ) -> MineResult<PatternWeights> {
        let mut aggregator =
            WeightedAggregator::new(self.config.worker_count).with_base_weight(self.config.base_weight);
        if self.config.document_factor {
            match collaborators.frequency {
                Some(oracle) => aggregator = aggregator.with_document_factor(oracle),
                None => tracing::warn!(
                    "document_factor is enabled but no frequency source was supplied; weights are unscaled"
                ),
            }
        }
        Ok(aggregator.aggregate(corpus.paths())?)
    }

    /// Run every stage. `graph` is left in its enforced state.
    pub fn run(
        &self,
        graph: &mut EntityGraph,
        collaborators: &Collaborators<'_>,
    ) -> MineResult<MiningReport> {
        let enforcement = self.enforce(graph, collaborators)?;
        let corpus = self.search(graph)?;
        let patterns = self.aggregate(&corpus, collaborators)?;

        tracing::info!(
            vertices = graph.vertex_count(),
            facts = graph.fact_count(),
            paths = corpus.len(),
            loops = corpus.stats().loops,
            patterns = patterns.len(),
            "mining run complete"
        );

        Ok(MiningReport {
            enforcement,
            corpus,
            patterns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MineError;
    use crate::graph::{CompatibilityTable, Fact};
    use crate::pattern::StaticFrequency;
    use crate::symbol::{Entity, EntityType};

    fn e(name: &str) -> Entity {
        Entity::new(name, EntityType::Person)
    }

    fn config(max_depth: usize) -> MiningConfig {
        MiningConfig {
            max_depth,
            worker_count: 2,
            ..Default::default()
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = Miner::new(MiningConfig {
            max_depth: 0,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, MineError::Config(_)));
    }

    #[test]
    fn run_without_collaborators() {
        let miner = Miner::new(config(1)).unwrap();
        let mut graph: EntityGraph = [Fact::new(e("X"), "rel1", e("Y"))].into_iter().collect();
        let report = miner.run(&mut graph, &Collaborators::new()).unwrap();
        assert!(report.enforcement.is_noop());
        assert_eq!(report.corpus.distinct().len(), 1);
        assert_eq!(report.patterns.len(), 1);
    }

    #[test]
    fn run_enforces_before_searching() {
        let miner = Miner::new(MiningConfig {
            confidence_cutoff: 0.5,
            ..config(2)
        })
        .unwrap();
        let mut graph: EntityGraph = [
            Fact::new(e("X"), "weak", e("Y")).with_confidence(0.3),
            Fact::new(e("Y"), "strong", e("Z")).with_confidence(0.9),
        ]
        .into_iter()
        .collect();
        let report = miner.run(&mut graph, &Collaborators::new()).unwrap();
        assert_eq!(report.enforcement.pruned, 1);
        assert!(
            report
                .corpus
                .paths()
                .iter()
                .all(|p| p.facts().all(|f| f.relation.as_str() == "strong"))
        );
    }

    #[test]
    fn knowledge_without_compatibility_means_identical_only() {
        let miner = Miner::new(config(1)).unwrap();
        let mut graph: EntityGraph = [Fact::new(e("X"), "rel_conflict", e("Y"))].into_iter().collect();
        let mut kb = KnowledgeBase::new();
        kb.insert(e("X"), "rel_known", "Y");
        let collab = Collaborators {
            knowledge: Some(&kb),
            ..Default::default()
        };
        let report = miner.enforce(&mut graph, &collab).unwrap();
        assert_eq!(report.contradictions_removed, 1);
        assert_eq!(report.gaps_filled, 1);
    }

    #[test]
    fn compatibility_table_is_honored() {
        let miner = Miner::new(config(1)).unwrap();
        let mut graph: EntityGraph = [Fact::new(e("X"), "a", e("Y"))].into_iter().collect();
        let mut kb = KnowledgeBase::new();
        kb.insert(e("X"), "b", "Y");
        let table = CompatibilityTable::new().with("a", "b");
        let report = miner
            .enforce(&mut graph, &Collaborators::new().with_knowledge(&kb, &table))
            .unwrap();
        assert_eq!(report.contradictions_removed, 0);
        assert_eq!(graph.fact_count(), 2);
    }

    #[test]
    fn document_factor_needs_opt_in() {
        let mut table = StaticFrequency::new();
        table.insert(["X", "Y"], 2.0).unwrap();
        let collab = Collaborators::new().with_frequency(&table);
        let graph: EntityGraph = [Fact::new(e("X"), "rel1", e("Y"))].into_iter().collect();

        let plain = Miner::new(config(1)).unwrap();
        let corpus = plain.search(&graph).unwrap();
        assert_eq!(plain.aggregate(&corpus, &collab).unwrap().total(), 1.0);

        let scaled = Miner::new(MiningConfig {
            document_factor: true,
            ..config(1)
        })
        .unwrap();
        assert_eq!(scaled.aggregate(&corpus, &collab).unwrap().total(), 0.5);
    }
}
