//! CC line converter
//!
//! One record per master:
//!
//! ```text
//! AC   P12345<TAB>GENE1; Self (9606, EBI-1, 2); GENE2 (10090, EBI-2, 1)<TAB>
//! ```
//!
//! Partners inside the same entry (self-interactions, isoform pairs)
//! collapse into a single `Self` row, which always sorts first. Other rows
//! sort by case-insensitive gene name, then case-sensitive gene name, then
//! partner accession.
//!
//! Negative interactions get their own rows, prefixed with `NOT` and placed
//! after the positive row of the same partner.

use super::{FormatVersion, LineContext};
use crate::entry::UniprotEntry;
use crate::model::{Evidence, InteractionId, Interactor};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Gene name of the row describing partners inside the master's own entry
pub const SELF_GENE: &str = "Self";

/// Prefix of rows built from negative interactions
pub const NEGATIVE_PREFIX: &str = "NOT";

/// Placeholder for missing gene names, organisms and accessions
const UNKNOWN: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CcRow {
    pub gene: String,
    pub partner_accession: String,
    pub taxid: Option<i64>,
    pub intact_ac: Option<String>,
    pub evidence_count: usize,
    pub negative: bool,
}

impl CcRow {
    fn is_self(&self) -> bool {
        self.gene == SELF_GENE
    }

    fn sort_cmp(&self, other: &Self) -> Ordering {
        other
            .is_self()
            .cmp(&self.is_self())
            .then_with(|| self.gene.to_lowercase().cmp(&other.gene.to_lowercase()))
            .then_with(|| self.gene.cmp(&other.gene))
            .then_with(|| self.partner_accession.cmp(&other.partner_accession))
            .then_with(|| self.negative.cmp(&other.negative))
    }

    fn render(&self) -> String {
        let prefix = if self.negative {
            format!("{} ", NEGATIVE_PREFIX)
        } else {
            String::new()
        };
        format!(
            "{}{} ({}, {}, {})",
            prefix,
            self.gene,
            self.taxid.map_or_else(|| UNKNOWN.to_string(), |t| t.to_string()),
            self.intact_ac.as_deref().unwrap_or(UNKNOWN),
            self.evidence_count
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CcParameters {
    pub master: String,
    pub master_gene: String,
    pub rows: Vec<CcRow>,
}

impl CcParameters {
    pub fn render(&self, _version: FormatVersion) -> String {
        let rows: Vec<String> = self.rows.iter().map(CcRow::render).collect();
        let body = std::iter::once(self.master_gene.clone())
            .chain(rows)
            .collect::<Vec<_>>()
            .join("; ");
        format!("AC   {}\t{}\t\n", self.master, body)
    }
}

#[derive(Default)]
struct RowAccumulator<'a> {
    evidences: BTreeSet<&'a Evidence>,
    partner: Option<&'a Interactor>,
}

/// Build the CC record of an entry from its exported interactions
///
/// `exported` holds both polarities; each polarity fills separate rows.
pub fn convert(
    exported: &BTreeSet<InteractionId>,
    _excluded: &BTreeSet<InteractionId>,
    ctx: &LineContext<'_>,
    entry: &UniprotEntry,
) -> Option<CcParameters> {
    let cluster = ctx.cluster();
    // keyed by (negative, partner); partner None = row of partners inside the entry
    let mut rows: BTreeMap<(bool, Option<&str>), RowAccumulator<'_>> = BTreeMap::new();

    for interaction in exported.iter().filter_map(|id| cluster.by_id(*id)) {
        for local in entry.accessions() {
            let Some((_, partner)) = interaction.sides_for(local) else {
                continue;
            };
            let Some(partner_ac) = partner.uniprot_ac() else {
                continue;
            };
            let key = if entry.contains(partner_ac) {
                None
            } else {
                Some(partner_ac)
            };
            let row = rows.entry((interaction.negative, key)).or_default();
            row.evidences.extend(interaction.evidences.iter());
            if row.partner.is_none() {
                row.partner = Some(partner);
            }
        }
    }

    let master_interactor = ctx.find_interactor(exported, &entry.master);
    let master_gene = ctx
        .gene_name(&entry.master, master_interactor)
        .unwrap_or_else(|| UNKNOWN.to_string());

    let mut rows: Vec<CcRow> = rows
        .into_iter()
        .filter(|(_, row)| !row.evidences.is_empty())
        .map(|((negative, key), row)| match key {
            None => CcRow {
                gene: SELF_GENE.to_string(),
                partner_accession: entry.master.clone(),
                taxid: master_interactor.and_then(|i| i.organism),
                intact_ac: master_interactor.and_then(|i| i.intact_ac()).map(str::to_string),
                evidence_count: row.evidences.len(),
                negative,
            },
            Some(partner_ac) => CcRow {
                gene: ctx
                    .gene_name(partner_ac, row.partner)
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                partner_accession: partner_ac.to_string(),
                taxid: row.partner.and_then(|p| p.organism),
                intact_ac: row.partner.and_then(|p| p.intact_ac()).map(str::to_string),
                evidence_count: row.evidences.len(),
                negative,
            },
        })
        .collect();

    if rows.is_empty() {
        return None;
    }
    rows.sort_by(CcRow::sort_cmp);

    Some(CcParameters {
        master: entry.master.clone(),
        master_gene,
        rows,
    })
}
