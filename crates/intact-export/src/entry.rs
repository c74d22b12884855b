//! UniProt entry resolution
//!
//! Groups the sorted accession space into entries: a master accession plus
//! the isoforms and feature chains that belong to it. Isoforms
//! (`P12345-2`) and chains (`P12345-PRO_0000012345`) share the master's
//! prefix and therefore sort right after it. Trans-spliced variants carry a
//! different prefix and are folded in through the cluster context.
//!
//! When an accession could belong to two masters, the master visited first
//! in sorted order keeps it. This mirrors upstream curation and is left as
//! is. An isoform whose master was already folded into another entry forms
//! an entry of its own, so no accession is emitted twice.

use crate::cluster::InteractionCluster;
use crate::filter::ExportedClusteredInteractions;
use crate::model::InteractionId;
use std::collections::{btree_set, BTreeSet, HashSet};
use std::ops::Bound;
use tracing::trace;

/// Master accession of an isoform or feature chain; a master maps to itself
pub fn master_accession(accession: &str) -> &str {
    accession
        .split_once('-')
        .map_or(accession, |(master, _)| master)
}

/// A master accession and the other accessions of the same biological entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniprotEntry {
    pub master: String,

    /// Members with at least one interaction selected for export
    pub positive_members: Vec<String>,

    /// Members whose interactions were all excluded
    pub negative_members: Vec<String>,
}

impl UniprotEntry {
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.positive_members
            .iter()
            .chain(self.negative_members.iter())
            .map(String::as_str)
    }

    /// Master first, then every member
    pub fn accessions(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.master.as_str()).chain(self.members())
    }

    pub fn contains(&self, accession: &str) -> bool {
        self.accessions().any(|a| a == accession)
    }

    /// Ids of every interaction involving the master or a member
    pub fn interaction_ids(&self, cluster: &InteractionCluster) -> BTreeSet<InteractionId> {
        self.accessions()
            .flat_map(|accession| cluster.ids_for_accession(accession))
            .collect()
    }
}

/// Lazy iterator over the entries of a sorted accession set
pub struct EntryResolver<'a> {
    accessions: &'a BTreeSet<String>,
    exported: &'a ExportedClusteredInteractions<'a>,
    remaining: btree_set::Iter<'a, String>,
    visited: HashSet<&'a str>,
}

/// Resolve entries in ascending accession order
///
/// Each call starts a fresh pass over `accessions`.
pub fn resolve_entries<'a>(
    accessions: &'a BTreeSet<String>,
    exported: &'a ExportedClusteredInteractions<'a>,
) -> EntryResolver<'a> {
    EntryResolver {
        accessions,
        exported,
        remaining: accessions.iter(),
        visited: HashSet::new(),
    }
}

impl<'a> EntryResolver<'a> {
    fn has_exported_interaction(&self, accession: &str) -> bool {
        self.exported
            .cluster()
            .ids_for_accession(accession)
            .any(|id| self.exported.is_exported(id))
    }

    fn build_entry(&mut self, candidate: &'a str) -> UniprotEntry {
        let mut master = master_accession(candidate);
        if master != candidate && self.visited.contains(master) {
            // the master already went out as another entry's trans-spliced variant
            trace!(candidate, master, "Master already consumed, isoform stands alone");
            master = candidate;
        }
        let mut members: Vec<&'a str> = self
            .accessions
            .range::<str, _>((Bound::Included(master), Bound::Unbounded))
            .take_while(|a| a.starts_with(master))
            .map(String::as_str)
            .filter(|a| *a != master && master_accession(a) == master)
            .filter(|a| !self.visited.contains(a))
            .collect();

        for (variant, owner) in self.exported.context().trans_spliced_variants(master) {
            if let Some(variant) = self.accessions.get(variant.as_str()) {
                if !self.visited.contains(variant.as_str()) && !members.contains(&variant.as_str()) {
                    trace!(master, variant = %variant, owner = %owner, "Folding trans-spliced variant");
                    members.push(variant.as_str());
                }
            }
        }
        members.sort_unstable();

        if let Some(master) = self.accessions.get(master) {
            self.visited.insert(master.as_str());
        }
        let mut entry = UniprotEntry {
            master: master.to_string(),
            positive_members: Vec::new(),
            negative_members: Vec::new(),
        };
        for member in members {
            self.visited.insert(member);
            if self.has_exported_interaction(member) {
                entry.positive_members.push(member.to_string());
            } else {
                entry.negative_members.push(member.to_string());
            }
        }

        entry
    }
}

impl<'a> Iterator for EntryResolver<'a> {
    type Item = UniprotEntry;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let candidate = self.remaining.next()?;
            if self.visited.contains(candidate.as_str()) {
                continue;
            }
            return Some(self.build_entry(candidate.as_str()));
        }
    }
}
