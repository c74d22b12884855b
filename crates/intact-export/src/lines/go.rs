//! GO (GPAD) line converter
//!
//! Every curated GO annotation of an exported positive interaction yields
//! one line per local accession of the entry, with the partner as
//! with/from. Identical lines are emitted once.

use super::{tab_line, FormatVersion, LineContext};
use crate::entry::UniprotEntry;
use crate::model::{GoAnnotation, InteractionId};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Roots of the three GO aspects
pub const GO_ROOTS: [&str; 3] = ["GO:0005575", "GO:0008150", "GO:0003674"];

/// GPAD relation between gene product and GO term
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoRelation {
    LocatedIn,
    InvolvedIn,
    Enables,
}

impl GoRelation {
    /// Map a curated qualifier onto its relation
    pub fn from_qualifier(qualifier: &str) -> Option<Self> {
        match qualifier.trim().to_lowercase().as_str() {
            "component" | "part_of" | "part of" | "located_in" => Some(GoRelation::LocatedIn),
            "process" | "involved_in" => Some(GoRelation::InvolvedIn),
            "function" | "enables" => Some(GoRelation::Enables),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GoRelation::LocatedIn => "located_in",
            GoRelation::InvolvedIn => "involved_in",
            GoRelation::Enables => "enables",
        }
    }

    pub fn relation_id(&self) -> &'static str {
        match self {
            GoRelation::LocatedIn => "RO:0001025",
            GoRelation::InvolvedIn => "RO:0002331",
            GoRelation::Enables => "RO:0002327",
        }
    }
}

/// Why an annotation produced no line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingQualifier,
    UnknownQualifier,
    MissingEvidenceCode,
    MissingReference,
    UnknownGoTerm,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GoLine {
    pub object_id: String,
    pub go_id: String,
    pub relation: GoRelation,
    pub reference: String,
    pub evidence_code: String,
    pub with_from: Option<String>,
    pub interacting_taxon: Option<i64>,
}

/// An annotation of one interaction that could not be rendered
///
/// Keyed by interaction rather than accession: both interactors see the
/// same annotation, the skip is still one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SkippedAnnotation {
    pub interaction_id: InteractionId,
    pub annotation: GoAnnotation,
    pub reason: SkipReason,
}

/// Lines of one entry plus the annotations that could not be rendered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParameters {
    pub lines: BTreeSet<GoLine>,
    pub skipped: BTreeSet<SkippedAnnotation>,
    pub date: String,
    pub assigned_by: String,
}

impl GoParameters {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn render(&self, version: FormatVersion) -> String {
        self.lines
            .iter()
            .map(|line| self.render_line(line, version))
            .collect()
    }

    fn render_line(&self, line: &GoLine, version: FormatVersion) -> String {
        let with_from = line
            .with_from
            .as_ref()
            .map(|partner| format!("UniProtKB:{}", partner))
            .unwrap_or_default();

        match version {
            FormatVersion::V1 => {
                let taxon = line
                    .interacting_taxon
                    .map(|t| format!("taxon:{}", t))
                    .unwrap_or_default();
                tab_line(&[
                    "UniProtKB",
                    &line.object_id,
                    line.relation.label(),
                    &line.go_id,
                    &line.reference,
                    &line.evidence_code,
                    &with_from,
                    &taxon,
                    &self.date.replace('-', ""),
                    &self.assigned_by,
                    "",
                    "",
                ])
            },
            FormatVersion::V2 => {
                let taxon = line
                    .interacting_taxon
                    .map(|t| format!("NCBITaxon:{}", t))
                    .unwrap_or_default();
                tab_line(&[
                    &format!("UniProtKB:{}", line.object_id),
                    line.relation.relation_id(),
                    &line.go_id,
                    &line.reference,
                    &line.evidence_code,
                    &with_from,
                    &taxon,
                    &self.date,
                    &self.assigned_by,
                    "",
                    "",
                ])
            },
        }
    }
}

fn is_known_term(ctx: &LineContext<'_>, go_id: &str) -> bool {
    match ctx.ontology {
        None => true,
        Some(ontology) => {
            GO_ROOTS.contains(&go_id) || ontology.ancestors(go_id).iter().any(|a| GO_ROOTS.contains(&a.as_str()))
        },
    }
}

fn line_fields(annotation: &GoAnnotation, ctx: &LineContext<'_>) -> Result<(GoRelation, String, String), SkipReason> {
    let qualifier = annotation.qualifier.as_deref().ok_or(SkipReason::MissingQualifier)?;
    let relation = GoRelation::from_qualifier(qualifier).ok_or(SkipReason::UnknownQualifier)?;
    let evidence_code = annotation.evidence_code.clone().ok_or(SkipReason::MissingEvidenceCode)?;
    let reference = annotation.reference.clone().ok_or(SkipReason::MissingReference)?;
    if !is_known_term(ctx, &annotation.go_id) {
        return Err(SkipReason::UnknownGoTerm);
    }
    Ok((relation, reference, evidence_code))
}

/// Build the GPAD lines of an entry
///
/// Returns `None` when the entry has no renderable annotation and nothing
/// was skipped.
pub fn convert(
    exported: &BTreeSet<InteractionId>,
    _excluded: &BTreeSet<InteractionId>,
    ctx: &LineContext<'_>,
    entry: &UniprotEntry,
) -> Option<GoParameters> {
    let cluster = ctx.cluster();
    let mut params = GoParameters {
        date: ctx.date.format("%Y-%m-%d").to_string(),
        assigned_by: ctx.assigned_by.clone(),
        ..GoParameters::default()
    };

    for interaction in exported.iter().filter_map(|id| cluster.by_id(*id)) {
        if interaction.negative || interaction.go_annotations.is_empty() {
            continue;
        }
        for local_ac in entry.accessions() {
            let Some((local, partner)) = interaction.sides_for(local_ac) else {
                continue;
            };
            for annotation in &interaction.go_annotations {
                match line_fields(annotation, ctx) {
                    Ok((relation, reference, evidence_code)) => {
                        let interacting_taxon = partner.organism.filter(|taxon| Some(*taxon) != local.organism);
                        params.lines.insert(GoLine {
                            object_id: local_ac.to_string(),
                            go_id: annotation.go_id.clone(),
                            relation,
                            reference,
                            evidence_code,
                            with_from: partner.uniprot_ac().map(str::to_string),
                            interacting_taxon,
                        });
                    },
                    Err(reason) => {
                        debug!(
                            interaction_id = %interaction.id,
                            go_id = %annotation.go_id,
                            ?reason,
                            "Skipping GO annotation"
                        );
                        params.skipped.insert(SkippedAnnotation {
                            interaction_id: interaction.id,
                            annotation: annotation.clone(),
                            reason,
                        });
                    },
                }
            }
        }
    }

    (!params.lines.is_empty() || !params.skipped.is_empty()).then_some(params)
}
