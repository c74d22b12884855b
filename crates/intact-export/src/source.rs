//! Collaborators consumed by the export engine
//!
//! The persistence layer and the taxonomy/ontology services live outside
//! this crate. They are reached through the narrow traits below; the
//! implementations here read flat files or hold data in memory.

use crate::error::{ExportError, Result};
use crate::model::RawInteraction;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ============================================================================
// Interaction source
// ============================================================================

pub type InteractionIter<'a> = Box<dyn Iterator<Item = Result<RawInteraction>> + 'a>;

/// Finite, restartable stream of raw binary interactions
pub trait InteractionSource {
    /// Start a fresh pass over every interaction
    fn iterate_all(&self) -> Result<InteractionIter<'_>>;
}

/// Interactions held in memory
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    interactions: Vec<RawInteraction>,
}

impl VecSource {
    pub fn new(interactions: Vec<RawInteraction>) -> Self {
        Self { interactions }
    }
}

impl InteractionSource for VecSource {
    fn iterate_all(&self) -> Result<InteractionIter<'_>> {
        Ok(Box::new(self.interactions.iter().cloned().map(Ok)))
    }
}

/// Interactions stored one JSON object per line
#[derive(Debug, Clone)]
pub struct JsonLinesSource {
    path: PathBuf,
}

impl JsonLinesSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl InteractionSource for JsonLinesSource {
    fn iterate_all(&self) -> Result<InteractionIter<'_>> {
        info!(path = %self.path.display(), "Reading interactions");
        let lines = serde_jsonlines::json_lines::<RawInteraction, _>(&self.path).map_err(|e| {
            ExportError::Source(format!("Cannot open {}: {}", self.path.display(), e))
        })?;

        let path = self.path.clone();
        Ok(Box::new(lines.enumerate().map(move |(index, line)| {
            line.map_err(|e| {
                ExportError::Source(format!("{} line {}: {}", path.display(), index + 1, e))
            })
        })))
    }
}

// ============================================================================
// Taxonomy
// ============================================================================

/// Resolves NCBI taxonomy ids to scientific names
pub trait TaxonomyLookup: Send + Sync {
    fn scientific_name(&self, tax_id: i64) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryTaxonomy {
    names: HashMap<i64, String>,
}

impl InMemoryTaxonomy {
    pub fn insert(&mut self, tax_id: i64, name: impl Into<String>) {
        self.names.insert(tax_id, name.into());
    }

    /// Load a two-column `taxid<TAB>scientific name` file
    pub fn from_tsv(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .from_path(path.as_ref())?;

        let mut taxonomy = Self::default();
        for row in reader.deserialize::<(i64, String)>() {
            let (tax_id, name) = row?;
            taxonomy.insert(tax_id, name);
        }

        debug!(taxa = taxonomy.names.len(), "Loaded taxonomy names");
        Ok(taxonomy)
    }
}

impl TaxonomyLookup for InMemoryTaxonomy {
    fn scientific_name(&self, tax_id: i64) -> Option<String> {
        self.names.get(&tax_id).cloned()
    }
}

// ============================================================================
// Ontology
// ============================================================================

/// Resolves ontology terms (GO, PSI-MI) to all of their ancestors
pub trait OntologyLookup: Send + Sync {
    fn ancestors(&self, term_id: &str) -> BTreeSet<String>;
}

/// Parent links held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryOntology {
    parents: BTreeMap<String, BTreeSet<String>>,
}

impl InMemoryOntology {
    pub fn add_parent(&mut self, child: &str, parent: &str) {
        self.parents
            .entry(child.to_string())
            .or_default()
            .insert(parent.to_string());
    }

    /// Load a two-column `child<TAB>parent` file, one link per row
    pub fn from_tsv(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .from_path(path.as_ref())?;

        let mut ontology = Self::default();
        for row in reader.deserialize::<(String, String)>() {
            let (child, parent) = row?;
            ontology.add_parent(&child, &parent);
        }

        debug!(terms = ontology.parents.len(), "Loaded ontology links");
        Ok(ontology)
    }
}

impl OntologyLookup for InMemoryOntology {
    fn ancestors(&self, term_id: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut pending: Vec<&str> = vec![term_id];

        while let Some(term) = pending.pop() {
            for parent in self.parents.get(term).into_iter().flatten() {
                if seen.insert(parent.clone()) {
                    pending.push(parent);
                }
            }
        }

        seen
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_json_lines_source_reads_every_line() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"interactor_a": {{"xrefs": {{"uniprotkb": ["P1"]}}}}, "interactor_b": {{"xrefs": {{"uniprotkb": ["P2"]}}}}}}"#
        )
        .unwrap();
        writeln!(
            file,
            r#"{{"interactor_a": {{"xrefs": {{"uniprotkb": ["P1"]}}}}, "interactor_b": {{"xrefs": {{"uniprotkb": ["P3"]}}}}, "negative": true}}"#
        )
        .unwrap();

        let source = JsonLinesSource::new(file.path());
        let all: Vec<_> = source.iterate_all().unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[1].negative);

        // restartable
        assert_eq!(source.iterate_all().unwrap().count(), 2);
    }

    #[test]
    fn test_json_lines_source_reports_bad_line() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();

        let source = JsonLinesSource::new(file.path());
        let first = source.iterate_all().unwrap().next().unwrap();
        assert!(matches!(first, Err(ExportError::Source(_))));
    }

    #[test]
    fn test_missing_source_file_is_source_error() {
        let source = JsonLinesSource::new("/nonexistent/interactions.jsonl");
        assert!(matches!(source.iterate_all(), Err(ExportError::Source(_))));
    }

    #[test]
    fn test_taxonomy_from_tsv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# taxid\tname").unwrap();
        writeln!(file, "9606\tHomo sapiens").unwrap();
        writeln!(file, "10090\tMus musculus").unwrap();

        let taxonomy = InMemoryTaxonomy::from_tsv(file.path()).unwrap();
        assert_eq!(taxonomy.scientific_name(9606).as_deref(), Some("Homo sapiens"));
        assert_eq!(taxonomy.scientific_name(7227), None);
    }

    #[test]
    fn test_ontology_ancestors_are_transitive() {
        let mut ontology = InMemoryOntology::default();
        ontology.add_parent("GO:0000003", "GO:0000002");
        ontology.add_parent("GO:0000002", "GO:0008150");
        ontology.add_parent("GO:0000003", "GO:0008150");

        let ancestors = ontology.ancestors("GO:0000003");
        assert_eq!(ancestors.len(), 2);
        assert!(ancestors.contains("GO:0008150"));
        assert!(ontology.ancestors("GO:0008150").is_empty());
    }

    #[test]
    fn test_ontology_from_tsv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "GO:0005634\tGO:0043231").unwrap();
        writeln!(file, "GO:0043231\tGO:0005575").unwrap();

        let ontology = InMemoryOntology::from_tsv(file.path()).unwrap();
        assert!(ontology.ancestors("GO:0005634").contains("GO:0005575"));
    }
}
