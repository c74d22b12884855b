//! Per-batch clustering context
//!
//! Built once when the cluster is frozen and read-only afterwards: there is
//! no public way to mutate a [`MiClusterContext`] once it exists.

use crate::entry::master_accession;
use crate::model::{ClusteredInteraction, InteractionId, Interactor};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// (variant accession, owning IntAct accession)
pub type TransSplicedVariant = (String, String);

#[derive(Debug, Clone, Default)]
pub struct MiClusterContext {
    gene_names: BTreeMap<String, String>,
    spoke_expanded: BTreeSet<InteractionId>,
    trans_spliced: BTreeMap<String, BTreeSet<TransSplicedVariant>>,
}

impl MiClusterContext {
    pub fn gene_name(&self, accession: &str) -> Option<&str> {
        self.gene_names.get(accession).map(String::as_str)
    }

    pub fn is_spoke_expanded(&self, id: InteractionId) -> bool {
        self.spoke_expanded.contains(&id)
    }

    pub fn spoke_expanded(&self) -> &BTreeSet<InteractionId> {
        &self.spoke_expanded
    }

    /// Variants declared under `master` whose own accession has a different prefix
    pub fn trans_spliced_variants(&self, master: &str) -> impl Iterator<Item = &TransSplicedVariant> {
        self.trans_spliced.get(master).into_iter().flatten()
    }

    pub fn has_trans_spliced_variants(&self) -> bool {
        !self.trans_spliced.is_empty()
    }
}

/// Single-writer builder used while freezing a cluster
#[derive(Debug, Default)]
pub(crate) struct ContextBuilder {
    context: MiClusterContext,
}

impl ContextBuilder {
    pub(crate) fn observe(&mut self, interaction: &ClusteredInteraction, spoke_expanded: bool) {
        if spoke_expanded {
            self.context.spoke_expanded.insert(interaction.id);
        }
        self.observe_interactor(&interaction.interactor_a);
        self.observe_interactor(&interaction.interactor_b);
    }

    fn observe_interactor(&mut self, interactor: &Interactor) {
        let Some(accession) = interactor.uniprot_ac() else {
            return;
        };

        if let Some(gene) = interactor.gene_name.as_deref().filter(|g| !g.trim().is_empty()) {
            self.context
                .gene_names
                .entry(accession.to_string())
                .or_insert_with(|| gene.to_string());
        }

        if let Some(parent) = interactor.parent_accession.as_deref() {
            if master_accession(accession) != parent {
                debug!(accession, master = parent, "Recording trans-spliced variant");
                self.context
                    .trans_spliced
                    .entry(parent.to_string())
                    .or_default()
                    .insert((
                        accession.to_string(),
                        interactor.intact_ac().unwrap_or_default().to_string(),
                    ));
            }
        }
    }

    pub(crate) fn finish(self) -> MiClusterContext {
        self.context
    }
}
