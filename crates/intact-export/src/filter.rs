//! Export filter and classifier
//!
//! Partitions every clustered interaction of a polarity into "to export"
//! and "to exclude". An interaction is excluded as soon as one enabled
//! predicate holds for it; interactions without an identifiable
//! interactor on either side are excluded whatever the flags say.

use crate::cluster::{InteractionCluster, MiClusterContext};
use crate::error::{ExportError, Result};
use crate::model::{ClusteredInteraction, InteractionId, Polarity};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Predicates enabled for one export run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FilterConfig {
    pub exclude_spoke_expanded: bool,
    pub exclude_low_confidence: bool,

    /// Interactions scoring strictly below this are low confidence
    pub confidence_threshold: Option<f64>,

    /// Exclude interactions where either side is not a UniProtKB protein
    pub exclude_non_uniprot_interactors: bool,

    pub exclude_negative: bool,

    /// When set, at least one evidence must use one of these detection methods
    pub allowed_detection_methods: Option<BTreeSet<String>>,
}

impl FilterConfig {
    /// Reject invalid or contradictory flag combinations
    pub fn validate(&self) -> Result<()> {
        match (self.exclude_low_confidence, self.confidence_threshold) {
            (true, None) => {
                return Err(ExportError::Config(
                    "exclude_low_confidence requires a confidence threshold".to_string(),
                ))
            },
            (false, Some(threshold)) => {
                return Err(ExportError::Config(format!(
                    "confidence threshold {} given while low-confidence exclusion is disabled",
                    threshold
                )))
            },
            (true, Some(threshold)) if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) => {
                return Err(ExportError::Config(format!(
                    "confidence threshold must be within [0, 1], got {}",
                    threshold
                )))
            },
            _ => {},
        }

        if matches!(self.allowed_detection_methods, Some(ref methods) if methods.is_empty()) {
            return Err(ExportError::Config(
                "detection method allow-list is empty; every interaction would be excluded"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// Why an interaction was not exported
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    UnresolvableAccession,
    Negative,
    NonUniprotInteractor,
    UnsupportedDetectionMethod,
    SpokeExpanded,
    LowConfidence,
}

/// Export/exclude split of one polarity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolarityPartition {
    pub to_export: BTreeSet<InteractionId>,
    pub to_exclude: BTreeSet<InteractionId>,
}

impl PolarityPartition {
    pub fn all(&self) -> BTreeSet<InteractionId> {
        self.to_export.union(&self.to_exclude).copied().collect()
    }
}

/// Result of classifying a cluster
#[derive(Debug, Clone)]
pub struct ExportedClusteredInteractions<'a> {
    cluster: &'a InteractionCluster,
    positive: PolarityPartition,
    negative: PolarityPartition,
    exclusions: BTreeMap<ExclusionReason, usize>,
}

impl<'a> ExportedClusteredInteractions<'a> {
    pub fn cluster(&self) -> &'a InteractionCluster {
        self.cluster
    }

    pub fn context(&self) -> &'a MiClusterContext {
        self.cluster.context()
    }

    pub fn partition(&self, polarity: Polarity) -> &PolarityPartition {
        match polarity {
            Polarity::Positive => &self.positive,
            Polarity::Negative => &self.negative,
        }
    }

    pub fn positive(&self) -> &PolarityPartition {
        &self.positive
    }

    pub fn negative(&self) -> &PolarityPartition {
        &self.negative
    }

    pub fn is_exported(&self, id: InteractionId) -> bool {
        self.positive.to_export.contains(&id) || self.negative.to_export.contains(&id)
    }

    /// Number of excluded interactions per first matching reason
    pub fn exclusions(&self) -> &BTreeMap<ExclusionReason, usize> {
        &self.exclusions
    }
}

fn exclusion_reason(
    interaction: &ClusteredInteraction,
    context: &MiClusterContext,
    config: &FilterConfig,
) -> Option<ExclusionReason> {
    if !interaction.is_resolvable() {
        return Some(ExclusionReason::UnresolvableAccession);
    }

    if config.exclude_negative && interaction.negative {
        return Some(ExclusionReason::Negative);
    }

    if config.exclude_non_uniprot_interactors {
        let uniprot_protein = |i: &crate::model::Interactor| {
            i.uniprot_ac().is_some() && i.interactor_type.is_protein()
        };
        if !uniprot_protein(&interaction.interactor_a) || !uniprot_protein(&interaction.interactor_b) {
            return Some(ExclusionReason::NonUniprotInteractor);
        }
    }

    if let Some(ref allowed) = config.allowed_detection_methods {
        if !interaction
            .evidences
            .iter()
            .any(|e| allowed.contains(&e.detection_method))
        {
            return Some(ExclusionReason::UnsupportedDetectionMethod);
        }
    }

    if config.exclude_spoke_expanded && context.is_spoke_expanded(interaction.id) {
        return Some(ExclusionReason::SpokeExpanded);
    }

    if config.exclude_low_confidence {
        if let Some(threshold) = config.confidence_threshold {
            if interaction.score < threshold {
                return Some(ExclusionReason::LowConfidence);
            }
        }
    }

    None
}

/// Classify every interaction of the cluster, positives and negatives independently
pub fn classify<'a>(
    cluster: &'a InteractionCluster,
    config: &FilterConfig,
) -> Result<ExportedClusteredInteractions<'a>> {
    config.validate()?;

    let context = cluster.context();
    let mut positive = PolarityPartition::default();
    let mut negative = PolarityPartition::default();
    let mut exclusions: BTreeMap<ExclusionReason, usize> = BTreeMap::new();

    for interaction in cluster.interactions() {
        let partition = match interaction.polarity() {
            Polarity::Positive => &mut positive,
            Polarity::Negative => &mut negative,
        };

        match exclusion_reason(interaction, context, config) {
            None => {
                partition.to_export.insert(interaction.id);
            },
            Some(reason) => {
                if reason == ExclusionReason::UnresolvableAccession {
                    warn!(
                        interaction_id = %interaction.id,
                        "Dropping interaction without resolvable accession"
                    );
                }
                partition.to_exclude.insert(interaction.id);
                *exclusions.entry(reason).or_default() += 1;
            },
        }
    }

    info!(
        positive_exported = positive.to_export.len(),
        positive_excluded = positive.to_exclude.len(),
        negative_exported = negative.to_export.len(),
        negative_excluded = negative.to_exclude.len(),
        "Classification finished"
    );

    Ok(ExportedClusteredInteractions {
        cluster,
        positive,
        negative,
        exclusions,
    })
}
