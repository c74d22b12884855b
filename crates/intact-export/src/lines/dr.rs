//! DR line converter
//!
//! `P12345<TAB>IntAct<TAB>P12345<TAB>4<TAB>` where the count is the number
//! of distinct positive interactions of the entry, exported or not.

use super::{union, FormatVersion, LineContext};
use crate::entry::UniprotEntry;
use crate::model::InteractionId;
use std::collections::BTreeSet;

pub const DR_DATABASE: &str = "IntAct";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrParameters {
    pub master: String,
    pub interaction_count: usize,
}

impl DrParameters {
    pub fn render(&self, _version: FormatVersion) -> String {
        super::tab_line(&[
            &self.master,
            DR_DATABASE,
            &self.master,
            &self.interaction_count.to_string(),
        ])
    }
}

pub fn convert(
    exported: &BTreeSet<InteractionId>,
    excluded: &BTreeSet<InteractionId>,
    ctx: &LineContext<'_>,
    entry: &UniprotEntry,
) -> Option<DrParameters> {
    let cluster = ctx.cluster();
    let interaction_count = union(exported, excluded)
        .into_iter()
        .filter_map(|id| cluster.by_id(id))
        .filter(|interaction| !interaction.negative)
        .count();

    (interaction_count > 0).then(|| DrParameters {
        master: entry.master.clone(),
        interaction_count,
    })
}
