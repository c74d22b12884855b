//! GPI line converter
//!
//! Describes the gene products referenced by the GPAD file: the master of
//! the entry and every member with an exported interaction. Members
//! point at the master as their parent; in version 2 the master also lists
//! its members.

use super::{tab_line, union, FormatVersion, LineContext};
use crate::entry::UniprotEntry;
use crate::model::InteractionId;
use std::collections::BTreeSet;
use tracing::debug;

/// PRO term for "protein"
pub const PROTEIN_TYPE_V2: &str = "PR:000000001";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpiLine {
    pub accession: String,
    pub symbol: String,
    pub name: String,
    pub taxon: i64,
    pub parent: Option<String>,
    pub members: Vec<String>,
    pub intact_ac: Option<String>,
}

impl GpiLine {
    fn render(&self, version: FormatVersion) -> String {
        let parent = self
            .parent
            .as_ref()
            .map(|p| format!("UniProtKB:{}", p))
            .unwrap_or_default();
        let xrefs = self
            .intact_ac
            .as_ref()
            .map(|ac| format!("IntAct:{}", ac))
            .unwrap_or_default();

        match version {
            FormatVersion::V1 => tab_line(&[
                "UniProtKB",
                &self.accession,
                &self.symbol,
                &self.name,
                "",
                "protein",
                &format!("taxon:{}", self.taxon),
                &parent,
                &xrefs,
                "",
            ]),
            FormatVersion::V2 => {
                let members = self
                    .members
                    .iter()
                    .map(|m| format!("UniProtKB:{}", m))
                    .collect::<Vec<_>>()
                    .join("|");
                tab_line(&[
                    &format!("UniProtKB:{}", self.accession),
                    &self.symbol,
                    &self.name,
                    "",
                    PROTEIN_TYPE_V2,
                    &format!("NCBITaxon:{}", self.taxon),
                    "",
                    &parent,
                    &members,
                    &xrefs,
                    "",
                ])
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpiParameters {
    pub lines: Vec<GpiLine>,
}

impl GpiParameters {
    pub fn render(&self, version: FormatVersion) -> String {
        self.lines.iter().map(|line| line.render(version)).collect()
    }
}

/// Build the GPI lines of an entry
///
/// Absent when nothing of the entry is exported or when the master's
/// organism is unknown. Members without an organism are left out.
pub fn convert(
    exported: &BTreeSet<InteractionId>,
    excluded: &BTreeSet<InteractionId>,
    ctx: &LineContext<'_>,
    entry: &UniprotEntry,
) -> Option<GpiParameters> {
    if exported.is_empty() {
        return None;
    }
    let all = union(exported, excluded);

    let describe = |accession: &str, parent: Option<&str>| -> Option<GpiLine> {
        let interactor = ctx.find_interactor(&all, accession);
        let Some(taxon) = interactor.and_then(|i| i.organism) else {
            debug!(accession, "No organism for GPI line");
            return None;
        };
        Some(GpiLine {
            accession: accession.to_string(),
            symbol: ctx
                .gene_name(accession, interactor)
                .unwrap_or_else(|| accession.to_string()),
            name: interactor
                .and_then(|i| i.full_name.clone())
                .unwrap_or_default(),
            taxon,
            parent: parent.map(str::to_string),
            members: Vec::new(),
            intact_ac: interactor.and_then(|i| i.intact_ac()).map(str::to_string),
        })
    };

    let mut master = describe(&entry.master, None)?;
    let members: Vec<GpiLine> = entry
        .positive_members
        .iter()
        .filter_map(|member| describe(member, Some(&entry.master)))
        .collect();

    let mut member_acs: Vec<String> = members.iter().map(|m| m.accession.clone()).collect();
    member_acs.sort();
    master.members = member_acs;

    let mut lines = Vec::with_capacity(members.len() + 1);
    lines.push(master);
    lines.extend(members);
    Some(GpiParameters { lines })
}
