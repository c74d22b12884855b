//! MI confidence score
//!
//! The score combines three normalised components computed from the
//! evidence of a clustered interaction:
//!
//! - detection methods, weighted by method category
//! - interaction types, weighted by type
//! - number of distinct publications
//!
//! Each component sums its weights into `a` and normalises it as
//! `log(a + 1) / log(b + 1)` capped at 1, where `b` is the component's
//! saturation point. The final score is the weighted mean of the three
//! components rounded to two decimals.

use crate::model::{ClusteredInteraction, Evidence};
use crate::source::OntologyLookup;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Computes the confidence of one clustered interaction
pub trait ConfidenceScorer: Send + Sync {
    /// Score in [0, 1]; deterministic in the interaction's evidence
    fn score(&self, interaction: &ClusteredInteraction) -> f64;
}

/// Weights and lookup tables of the MI score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiScoreConfig {
    pub method_weight: f64,
    pub type_weight: f64,
    pub publication_weight: f64,

    /// Saturation points of the three components
    pub method_saturation: f64,
    pub type_saturation: f64,
    pub publication_saturation: f64,

    /// Detection method (or method category) MI id -> category score
    pub method_scores: BTreeMap<String, f64>,
    pub unknown_method_score: f64,

    /// Interaction type MI id -> type score
    pub type_scores: BTreeMap<String, f64>,
    pub unknown_type_score: f64,
}

impl Default for MiScoreConfig {
    fn default() -> Self {
        let method_scores = [
            ("MI:0013", 1.0),  // biophysical
            ("MI:0401", 1.0),  // biochemical
            ("MI:0090", 0.66), // protein complementation assay
            ("MI:0018", 0.66), // two hybrid
            ("MI:0254", 0.10), // genetic interference
            ("MI:0255", 0.10), // post transcriptional interference
            ("MI:0428", 0.33), // imaging technique
            ("MI:0686", 0.05), // unspecified method
        ];
        let type_scores = [
            ("MI:0407", 1.0),  // direct interaction
            ("MI:0915", 0.66), // physical association
            ("MI:0914", 0.33), // association
            ("MI:0403", 0.33), // colocalization
        ];

        Self {
            method_weight: 1.0,
            type_weight: 1.0,
            publication_weight: 1.0,
            method_saturation: 7.0,
            type_saturation: 7.0,
            publication_saturation: 7.0,
            method_scores: method_scores
                .iter()
                .map(|(id, s)| (id.to_string(), *s))
                .collect(),
            unknown_method_score: 0.05,
            type_scores: type_scores
                .iter()
                .map(|(id, s)| (id.to_string(), *s))
                .collect(),
            unknown_type_score: 0.05,
        }
    }
}

/// Normalised log score of one component
fn normalised(a: f64, saturation: f64) -> f64 {
    if a <= 0.0 || saturation <= 0.0 {
        return 0.0;
    }
    ((a + 1.0).ln() / (saturation + 1.0).ln()).min(1.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// IntAct MI score
pub struct MiScorer {
    config: MiScoreConfig,
    ontology: Option<Arc<dyn OntologyLookup>>,
}

impl MiScorer {
    pub fn new(config: MiScoreConfig) -> Self {
        Self {
            config,
            ontology: None,
        }
    }

    /// Resolve detection methods missing from the table through their
    /// ontology ancestors
    pub fn with_ontology(mut self, ontology: Arc<dyn OntologyLookup>) -> Self {
        self.ontology = Some(ontology);
        self
    }

    fn method_score(&self, method: &str) -> f64 {
        if let Some(score) = self.config.method_scores.get(method) {
            return *score;
        }
        self.ontology
            .as_ref()
            .map(|ontology| ontology.ancestors(method))
            .into_iter()
            .flatten()
            .filter_map(|ancestor| self.config.method_scores.get(&ancestor).copied())
            .fold(None, |best: Option<f64>, s| Some(best.map_or(s, |b| b.max(s))))
            .unwrap_or(self.config.unknown_method_score)
    }

    fn type_score(&self, interaction_type: Option<&str>) -> f64 {
        interaction_type
            .and_then(|t| self.config.type_scores.get(t).copied())
            .unwrap_or(self.config.unknown_type_score)
    }

    /// Score of an evidence set
    pub fn score_evidence(&self, evidences: &BTreeSet<Evidence>) -> f64 {
        if evidences.is_empty() {
            return 0.0;
        }
        let c = &self.config;

        let method_a: f64 = evidences
            .iter()
            .map(|e| self.method_score(&e.detection_method))
            .sum();
        let type_a: f64 = evidences
            .iter()
            .map(|e| self.type_score(e.interaction_type.as_deref()))
            .sum();
        let publications = evidences
            .iter()
            .map(|e| e.publication.as_str())
            .collect::<BTreeSet<_>>()
            .len() as f64;

        let total_weight = c.method_weight + c.type_weight + c.publication_weight;
        if total_weight <= 0.0 {
            return 0.0;
        }

        let weighted = c.method_weight * normalised(method_a, c.method_saturation)
            + c.type_weight * normalised(type_a, c.type_saturation)
            + c.publication_weight * normalised(publications, c.publication_saturation);

        round2((weighted / total_weight).clamp(0.0, 1.0))
    }
}

impl Default for MiScorer {
    fn default() -> Self {
        Self::new(MiScoreConfig::default())
    }
}

impl ConfidenceScorer for MiScorer {
    fn score(&self, interaction: &ClusteredInteraction) -> f64 {
        self.score_evidence(&interaction.evidences)
    }
}
