//! Interaction cluster store
//!
//! Raw binary interactions are merged into [`ClusteredInteraction`]s keyed
//! by their unordered interactor pair and polarity. Clustering runs in two
//! phases:
//!
//! 1. [`ClusterBuilder`] accepts raw interactions, possibly from several
//!    threads at once. Writers targeting different pairs proceed in
//!    parallel; writers targeting the same pair are serialised by the
//!    shard lock of the underlying map.
//! 2. [`ClusterBuilder::freeze`] scores every interaction, builds the
//!    accession index and the [`MiClusterContext`], and returns an
//!    immutable [`InteractionCluster`].

pub mod context;

pub use context::{MiClusterContext, TransSplicedVariant};

use crate::error::Result;
use crate::model::{ClusteredInteraction, InteractionId, Polarity, RawInteraction};
use crate::score::ConfidenceScorer;
use crate::source::InteractionSource;
use context::ContextBuilder;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Raw interactions merged per clustering call
pub const DEFAULT_CLUSTER_CHUNK_SIZE: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PairKey {
    Pair {
        low: String,
        high: String,
        polarity: Polarity,
    },
    /// An interactor without any identifier; never merged with anything
    Unresolved(u64),
}

#[derive(Debug)]
struct Accumulator {
    interaction: ClusteredInteraction,
    /// True while every contributing raw interaction came from spoke expansion
    spoke_expanded: bool,
}

impl Accumulator {
    fn new(id: InteractionId, raw: RawInteraction) -> Self {
        Self {
            spoke_expanded: raw.spoke_expanded,
            interaction: ClusteredInteraction {
                id,
                negative: raw.negative,
                interactor_a: raw.interactor_a,
                interactor_b: raw.interactor_b,
                evidences: raw.evidences.into_iter().collect(),
                go_annotations: raw.go_annotations.into_iter().collect(),
                score: 0.0,
            },
        }
    }

    fn merge(&mut self, raw: RawInteraction) {
        self.spoke_expanded &= raw.spoke_expanded;
        self.interaction.evidences.extend(raw.evidences);
        self.interaction.go_annotations.extend(raw.go_annotations);
    }
}

/// Concurrent accumulation phase of the cluster store
#[derive(Debug, Default)]
pub struct ClusterBuilder {
    clusters: DashMap<PairKey, Accumulator>,
    next_id: AtomicU64,
}

impl ClusterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> InteractionId {
        InteractionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Merge a raw interaction into its cluster, creating it on first sight
    pub fn add_interaction(&self, raw: RawInteraction) -> InteractionId {
        let (a, b) = match (raw.interactor_a.identifier(), raw.interactor_b.identifier()) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                let id = self.allocate_id();
                self.clusters
                    .insert(PairKey::Unresolved(id.0), Accumulator::new(id, raw));
                return id;
            },
        };

        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let key = PairKey::Pair {
            low,
            high,
            polarity: raw.polarity(),
        };

        match self.clusters.entry(key) {
            Entry::Occupied(mut occupied) => {
                let accumulator = occupied.get_mut();
                accumulator.merge(raw);
                accumulator.interaction.id
            },
            Entry::Vacant(vacant) => {
                let id = self.allocate_id();
                vacant.insert(Accumulator::new(id, raw));
                id
            },
        }
    }

    /// Merge one chunk of raw interactions in parallel
    pub fn add_chunk(&self, chunk: Vec<RawInteraction>) -> Vec<InteractionId> {
        chunk
            .into_par_iter()
            .map(|raw| self.add_interaction(raw))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Score every interaction and build the read-only store
    pub fn freeze(self, scorer: &dyn ConfidenceScorer) -> InteractionCluster {
        let mut accumulators: Vec<Accumulator> =
            self.clusters.into_iter().map(|(_, acc)| acc).collect();
        accumulators.sort_by_key(|acc| acc.interaction.id);

        let mut interactions = BTreeMap::new();
        let mut index: BTreeMap<String, BTreeSet<InteractionId>> = BTreeMap::new();
        let mut context = ContextBuilder::default();

        for Accumulator {
            mut interaction,
            spoke_expanded,
        } in accumulators
        {
            interaction.score = scorer.score(&interaction);
            context.observe(&interaction, spoke_expanded);

            // unresolvable interactions are kept for classification but
            // never reached through an accession
            if interaction.is_resolvable() {
                for interactor in [&interaction.interactor_a, &interaction.interactor_b] {
                    if let Some(identifier) = interactor.identifier() {
                        index.entry(identifier).or_default().insert(interaction.id);
                    }
                }
            }
            interactions.insert(interaction.id, interaction);
        }

        info!(
            interactions = interactions.len(),
            accessions = index.len(),
            "Cluster frozen"
        );

        InteractionCluster {
            interactions,
            index,
            context: context.finish(),
        }
    }
}

/// Cluster every interaction of `source`, `chunk_size` raw interactions at a time
///
/// A read failure anywhere in the source aborts the whole batch; nothing
/// from a partial pass is returned.
pub fn cluster_source(
    source: &dyn InteractionSource,
    chunk_size: usize,
    scorer: &dyn ConfidenceScorer,
) -> Result<InteractionCluster> {
    let chunk_size = chunk_size.max(1);
    let builder = ClusterBuilder::new();
    let mut chunk = Vec::with_capacity(chunk_size);
    let mut read = 0usize;

    for raw in source.iterate_all()? {
        chunk.push(raw?);
        read += 1;
        if chunk.len() == chunk_size {
            builder.add_chunk(std::mem::replace(&mut chunk, Vec::with_capacity(chunk_size)));
            debug!(read, clusters = builder.len(), "Clustered chunk");
        }
    }
    if !chunk.is_empty() {
        builder.add_chunk(chunk);
    }

    info!(read, clusters = builder.len(), "Clustering finished");
    Ok(builder.freeze(scorer))
}

/// Read-only store of clustered interactions with its accession index
#[derive(Debug, Clone, Default)]
pub struct InteractionCluster {
    interactions: BTreeMap<InteractionId, ClusteredInteraction>,
    index: BTreeMap<String, BTreeSet<InteractionId>>,
    context: MiClusterContext,
}

impl InteractionCluster {
    pub fn by_id(&self, id: InteractionId) -> Option<&ClusteredInteraction> {
        self.interactions.get(&id)
    }

    pub fn ids_for_accession<'a>(&'a self, accession: &str) -> impl Iterator<Item = InteractionId> + 'a {
        self.index.get(accession).into_iter().flatten().copied()
    }

    pub fn interactions(&self) -> impl Iterator<Item = &ClusteredInteraction> {
        self.interactions.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = InteractionId> + '_ {
        self.interactions.keys().copied()
    }

    /// Every UniProtKB accession taking part in at least one interaction
    pub fn uniprot_accessions(&self) -> BTreeSet<String> {
        self.interactions
            .values()
            .filter(|i| i.is_resolvable())
            .flat_map(|i| [i.interactor_a.uniprot_ac(), i.interactor_b.uniprot_ac()])
            .flatten()
            .map(str::to_string)
            .collect()
    }

    pub fn context(&self) -> &MiClusterContext {
        &self.context
    }

    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }
}
