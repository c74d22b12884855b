//! Line converters
//!
//! Each converter is a pure function from the interactions of one UniProt
//! entry to the parameters of one output record. Missing optional data
//! never raises: the converter returns `None` (or reports the skipped
//! annotation) and the exporter logs, counts and moves on.
//!
//! Rendering is dispatched on [`FormatVersion`]. Every data line ends with
//! a tab before the newline.

pub mod cc;
pub mod dr;
pub mod go;
pub mod gpi;

use crate::cluster::{InteractionCluster, MiClusterContext};
use crate::entry::master_accession;
use crate::error::ExportError;
use crate::filter::ExportedClusteredInteractions;
use crate::model::{InteractionId, Interactor};
use crate::source::OntologyLookup;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Version of an output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum FormatVersion {
    #[default]
    V1,
    V2,
}

impl FromStr for FormatVersion {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "v1" | "1.1" | "1.2" => Ok(FormatVersion::V1),
            "2" | "v2" | "2.0" => Ok(FormatVersion::V2),
            _ => Err(ExportError::Config(format!("Unknown format version: {}", s))),
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatVersion::V1 => f.write_str("1"),
            FormatVersion::V2 => f.write_str("2"),
        }
    }
}

/// Output formats produced per UniProt entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineFormat {
    Cc,
    Dr,
    Go,
    Gpi,
}

impl LineFormat {
    pub const ALL: [LineFormat; 4] = [LineFormat::Cc, LineFormat::Dr, LineFormat::Go, LineFormat::Gpi];

    pub fn as_str(&self) -> &'static str {
        match self {
            LineFormat::Cc => "cc",
            LineFormat::Dr => "dr",
            LineFormat::Go => "go",
            LineFormat::Gpi => "gpi",
        }
    }

    /// Versions this format can be rendered in
    pub fn supports(&self, version: FormatVersion) -> bool {
        match self {
            LineFormat::Cc | LineFormat::Dr => version == FormatVersion::V1,
            LineFormat::Go | LineFormat::Gpi => true,
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            LineFormat::Cc => "uniprotlinks.cc",
            LineFormat::Dr => "uniprotlinks.dr",
            LineFormat::Go => "uniprotlinks.gpad",
            LineFormat::Gpi => "uniprotlinks.gpi",
        }
    }

    /// Version line opening the file
    pub fn version_header(&self, version: FormatVersion) -> &'static str {
        match (self, version) {
            (LineFormat::Cc, _) => "!cc-version: 1",
            (LineFormat::Dr, _) => "!dr-version: 1",
            (LineFormat::Go, FormatVersion::V1) => "!gpa-version: 1.1",
            (LineFormat::Go, FormatVersion::V2) => "!gpad-version: 2.0",
            (LineFormat::Gpi, FormatVersion::V1) => "!gpi-version: 1.2",
            (LineFormat::Gpi, FormatVersion::V2) => "!gpi-version: 2.0",
        }
    }
}

impl fmt::Display for LineFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only inputs shared by every converter call of a run
pub struct LineContext<'a> {
    pub exported: &'a ExportedClusteredInteractions<'a>,
    pub date: NaiveDate,
    pub assigned_by: String,
    pub ontology: Option<&'a dyn OntologyLookup>,
}

impl<'a> LineContext<'a> {
    pub fn new(exported: &'a ExportedClusteredInteractions<'a>, date: NaiveDate) -> Self {
        Self {
            exported,
            date,
            assigned_by: "IntAct".to_string(),
            ontology: None,
        }
    }

    pub fn cluster(&self) -> &'a InteractionCluster {
        self.exported.cluster()
    }

    pub fn context(&self) -> &'a MiClusterContext {
        self.exported.context()
    }

    /// Interactor record of `accession` from any interaction in `ids`
    pub fn find_interactor<'s>(
        &self,
        ids: impl IntoIterator<Item = &'s InteractionId>,
        accession: &str,
    ) -> Option<&'a Interactor> {
        let cluster = self.cluster();
        ids.into_iter()
            .filter_map(|id| cluster.by_id(*id))
            .find_map(|interaction| interaction.sides_for(accession).map(|(local, _)| local))
    }

    /// Gene name from the cluster context, the interactor, then the master
    pub fn gene_name(&self, accession: &str, interactor: Option<&Interactor>) -> Option<String> {
        let context = self.context();
        context
            .gene_name(accession)
            .or_else(|| interactor.and_then(|i| i.gene_name.as_deref()))
            .or_else(|| context.gene_name(master_accession(accession)))
            .map(str::to_string)
    }
}

/// Terminate a record: tab-join the columns and add the trailing tab
pub(crate) fn tab_line(columns: &[&str]) -> String {
    let mut line = columns.join("\t");
    line.push_str("\t\n");
    line
}

pub(crate) fn union(a: &BTreeSet<InteractionId>, b: &BTreeSet<InteractionId>) -> BTreeSet<InteractionId> {
    a.union(b).copied().collect()
}
