//! Interaction data model
//!
//! Raw binary interactions as read from the interaction source, and the
//! deduplicated [`ClusteredInteraction`] they are merged into.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Database names accepted for UniProtKB cross-references
pub const UNIPROT_DATABASES: [&str; 2] = ["uniprotkb", "uniprot"];

/// Database name of IntAct interactor accessions (EBI-xxxx)
pub const INTACT_DATABASE: &str = "intact";

// ============================================================================
// Interactor
// ============================================================================

/// Molecule type of an interactor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InteractorType {
    #[default]
    Protein,
    Peptide,
    SmallMolecule,
    NucleicAcid,
    Complex,
    Other,
}

impl InteractorType {
    /// Proteins and peptides are the only types exported to UniProt
    pub fn is_protein(self) -> bool {
        matches!(self, InteractorType::Protein | InteractorType::Peptide)
    }
}

/// One participant of a binary interaction
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Interactor {
    /// Cross-references keyed by lowercase database name
    #[serde(default)]
    pub xrefs: BTreeMap<String, Vec<String>>,

    /// NCBI taxonomy id
    #[serde(default)]
    pub organism: Option<i64>,

    #[serde(default)]
    pub gene_name: Option<String>,

    #[serde(default)]
    pub full_name: Option<String>,

    #[serde(default)]
    pub interactor_type: InteractorType,

    /// Master accession declared by curation for isoforms and chains whose
    /// accession does not share the master's prefix (trans-spliced products)
    #[serde(default)]
    pub parent_accession: Option<String>,
}

impl Interactor {
    /// Protein interactor with a UniProtKB and an IntAct accession
    pub fn protein(uniprot_ac: &str, intact_ac: &str, organism: i64, gene_name: Option<&str>) -> Self {
        let mut xrefs = BTreeMap::new();
        xrefs.insert("uniprotkb".to_string(), vec![uniprot_ac.to_string()]);
        xrefs.insert(INTACT_DATABASE.to_string(), vec![intact_ac.to_string()]);
        Self {
            xrefs,
            organism: Some(organism),
            gene_name: gene_name.map(str::to_string),
            ..Self::default()
        }
    }

    fn first_xref(&self, database: &str) -> Option<&str> {
        self.xrefs
            .iter()
            .find(|(db, _)| db.eq_ignore_ascii_case(database))
            .and_then(|(_, ids)| ids.first())
            .map(String::as_str)
    }

    pub fn uniprot_ac(&self) -> Option<&str> {
        UNIPROT_DATABASES.iter().find_map(|db| self.first_xref(db))
    }

    pub fn intact_ac(&self) -> Option<&str> {
        self.first_xref(INTACT_DATABASE)
    }

    /// Identifier used for clustering: UniProtKB, then IntAct, then any
    /// other cross-reference as `db:id`
    pub fn identifier(&self) -> Option<String> {
        if let Some(ac) = self.uniprot_ac().or_else(|| self.intact_ac()) {
            return Some(ac.to_string());
        }
        self.xrefs
            .iter()
            .find_map(|(db, ids)| ids.first().map(|id| format!("{}:{}", db, id)))
    }
}

// ============================================================================
// Evidence and GO annotations
// ============================================================================

/// One piece of experimental support for an interaction
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Evidence {
    /// Interaction detection method (e.g., "MI:0018" two hybrid)
    pub detection_method: String,

    /// Interaction type (e.g., "MI:0915" physical association)
    #[serde(default)]
    pub interaction_type: Option<String>,

    /// Publication identifier (e.g., "PMID:12345")
    pub publication: String,

    #[serde(default)]
    pub experiment: Option<String>,

    /// IntAct interaction accession (EBI-xxxx)
    #[serde(default)]
    pub interaction_ac: Option<String>,
}

impl Evidence {
    pub fn new(detection_method: &str, publication: &str) -> Self {
        Self {
            detection_method: detection_method.to_string(),
            interaction_type: None,
            publication: publication.to_string(),
            experiment: None,
            interaction_ac: None,
        }
    }
}

/// GO term curated on an interaction
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GoAnnotation {
    pub go_id: String,

    /// "component"/"part_of", "process" or "function"
    #[serde(default)]
    pub qualifier: Option<String>,

    /// ECO evidence code (e.g., "ECO:0000269")
    #[serde(default)]
    pub evidence_code: Option<String>,

    /// Supporting reference (e.g., "PMID:12345")
    #[serde(default)]
    pub reference: Option<String>,
}

// ============================================================================
// Raw and clustered interactions
// ============================================================================

/// Positive or negative interaction evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn from_negative(negative: bool) -> Self {
        if negative {
            Polarity::Negative
        } else {
            Polarity::Positive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Positive => "positive",
            Polarity::Negative => "negative",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A binary interaction as delivered by the interaction source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInteraction {
    pub interactor_a: Interactor,
    pub interactor_b: Interactor,

    #[serde(default)]
    pub evidences: Vec<Evidence>,

    #[serde(default)]
    pub go_annotations: Vec<GoAnnotation>,

    #[serde(default)]
    pub negative: bool,

    /// Produced by spoke expansion of an n-ary interaction
    #[serde(default)]
    pub spoke_expanded: bool,
}

impl RawInteraction {
    pub fn new(interactor_a: Interactor, interactor_b: Interactor) -> Self {
        Self {
            interactor_a,
            interactor_b,
            evidences: Vec::new(),
            go_annotations: Vec::new(),
            negative: false,
            spoke_expanded: false,
        }
    }

    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidences.push(evidence);
        self
    }

    pub fn with_go(mut self, annotation: GoAnnotation) -> Self {
        self.go_annotations.push(annotation);
        self
    }

    pub fn negative(mut self) -> Self {
        self.negative = true;
        self
    }

    pub fn spoke_expanded(mut self) -> Self {
        self.spoke_expanded = true;
        self
    }

    pub fn polarity(&self) -> Polarity {
        Polarity::from_negative(self.negative)
    }

    /// Publication of the first evidence, used to group chunked exports
    pub fn publication(&self) -> Option<&str> {
        self.evidences.first().map(|e| e.publication.as_str())
    }

    pub fn experiment(&self) -> Option<&str> {
        self.evidences.first().and_then(|e| e.experiment.as_deref())
    }
}

/// Synthetic id assigned to a clustered interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InteractionId(pub u64);

impl fmt::Display for InteractionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deduplicated binary interaction with accumulated evidence
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteredInteraction {
    pub id: InteractionId,
    pub interactor_a: Interactor,
    pub interactor_b: Interactor,
    pub evidences: BTreeSet<Evidence>,
    pub go_annotations: BTreeSet<GoAnnotation>,
    pub negative: bool,
    pub score: f64,
}

impl ClusteredInteraction {
    pub fn polarity(&self) -> Polarity {
        Polarity::from_negative(self.negative)
    }

    pub fn uniprot_acs(&self) -> (Option<&str>, Option<&str>) {
        (self.interactor_a.uniprot_ac(), self.interactor_b.uniprot_ac())
    }

    /// Both sides carry an identifier
    pub fn is_resolvable(&self) -> bool {
        self.interactor_a.identifier().is_some() && self.interactor_b.identifier().is_some()
    }

    pub fn is_self_interaction(&self) -> bool {
        matches!(self.uniprot_acs(), (Some(a), Some(b)) if a == b)
    }

    /// The (local, partner) interactors seen from `accession`
    pub fn sides_for(&self, accession: &str) -> Option<(&Interactor, &Interactor)> {
        if self.interactor_a.uniprot_ac() == Some(accession) {
            Some((&self.interactor_a, &self.interactor_b))
        } else if self.interactor_b.uniprot_ac() == Some(accession) {
            Some((&self.interactor_b, &self.interactor_a))
        } else {
            None
        }
    }

    pub fn publications(&self) -> BTreeSet<&str> {
        self.evidences.iter().map(|e| e.publication.as_str()).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_interactor_identifier_precedence() {
        let protein = Interactor::protein("P12345", "EBI-1", 9606, Some("ABC"));
        assert_eq!(protein.uniprot_ac(), Some("P12345"));
        assert_eq!(protein.intact_ac(), Some("EBI-1"));
        assert_eq!(protein.identifier().as_deref(), Some("P12345"));

        let mut chemical = Interactor::default();
        chemical
            .xrefs
            .insert("chebi".to_string(), vec!["CHEBI:15377".to_string()]);
        assert_eq!(chemical.uniprot_ac(), None);
        assert_eq!(chemical.identifier().as_deref(), Some("chebi:CHEBI:15377"));

        assert_eq!(Interactor::default().identifier(), None);
    }

    #[test]
    fn test_uniprot_database_alias_is_case_insensitive() {
        let mut interactor = Interactor::default();
        interactor
            .xrefs
            .insert("UniProt".to_string(), vec!["Q99999".to_string()]);
        assert_eq!(interactor.uniprot_ac(), Some("Q99999"));
    }

    #[test]
    fn test_raw_interaction_deserializes_with_defaults() {
        let json = r#"{
            "interactor_a": {"xrefs": {"uniprotkb": ["P1"]}, "organism": 9606},
            "interactor_b": {"xrefs": {"uniprotkb": ["P2"]}},
            "evidences": [{"detection_method": "MI:0018", "publication": "PMID:1"}]
        }"#;
        let raw: RawInteraction = serde_json::from_str(json).unwrap();
        assert!(!raw.negative);
        assert!(!raw.spoke_expanded);
        assert_eq!(raw.polarity(), Polarity::Positive);
        assert_eq!(raw.publication(), Some("PMID:1"));
        assert_eq!(raw.interactor_b.interactor_type, InteractorType::Protein);
    }

    #[test]
    fn test_sides_for() {
        let interaction = ClusteredInteraction {
            id: InteractionId(1),
            interactor_a: Interactor::protein("P1", "EBI-1", 9606, None),
            interactor_b: Interactor::protein("P2", "EBI-2", 10090, None),
            evidences: BTreeSet::new(),
            go_annotations: BTreeSet::new(),
            negative: false,
            score: 0.0,
        };
        let (local, partner) = interaction.sides_for("P2").unwrap();
        assert_eq!(local.organism, Some(10090));
        assert_eq!(partner.uniprot_ac(), Some("P1"));
        assert!(interaction.sides_for("P3").is_none());
        assert!(!interaction.is_self_interaction());
    }
}
