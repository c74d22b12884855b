//! MITAB 2.5 chunk files
//!
//! Each [`PublicationChunk`] becomes one tab-separated file with the
//! 15 standard MITAB 2.5 columns, named `<publication>[_negative]_<index>.txt`.

use crate::chunk::{ChunkSink, PublicationChunk};
use crate::error::{ExportError, Result};
use crate::model::{Interactor, Polarity, RawInteraction, INTACT_DATABASE};
use crate::source::TaxonomyLookup;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MITAB_25_HEADER: [&str; 15] = [
    "#ID(s) interactor A",
    "ID(s) interactor B",
    "Alt. ID(s) interactor A",
    "Alt. ID(s) interactor B",
    "Alias(es) interactor A",
    "Alias(es) interactor B",
    "Interaction detection method(s)",
    "Publication 1st author(s)",
    "Publication Identifier(s)",
    "Taxid interactor A",
    "Taxid interactor B",
    "Interaction type(s)",
    "Source database(s)",
    "Interaction identifier(s)",
    "Confidence value(s)",
];

const EMPTY: &str = "-";
const SOURCE_DATABASE: &str = "psi-mi:\"MI:0469\"(IntAct)";

/// File name of a chunk, with characters unsafe in paths replaced
pub fn chunk_file_name(chunk: &PublicationChunk) -> String {
    let publication: String = chunk
        .publication
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect();
    match chunk.polarity {
        Polarity::Positive => format!("{}_{}.txt", publication, chunk.index),
        Polarity::Negative => format!("{}_negative_{}.txt", publication, chunk.index),
    }
}

fn join_or_empty(values: impl IntoIterator<Item = String>) -> String {
    let values: BTreeSet<String> = values.into_iter().collect();
    if values.is_empty() {
        EMPTY.to_string()
    } else {
        values.into_iter().collect::<Vec<_>>().join("|")
    }
}

fn primary_id(interactor: &Interactor) -> String {
    interactor
        .uniprot_ac()
        .map(|ac| format!("uniprotkb:{}", ac))
        .or_else(|| interactor.intact_ac().map(|ac| format!("intact:{}", ac)))
        .or_else(|| interactor.identifier())
        .unwrap_or_else(|| EMPTY.to_string())
}

fn alternative_ids(interactor: &Interactor) -> String {
    let primary = primary_id(interactor);
    join_or_empty(
        interactor
            .xrefs
            .iter()
            .flat_map(|(db, ids)| ids.iter().map(move |id| format!("{}:{}", db, id)))
            .filter(|id| *id != primary),
    )
}

fn aliases(interactor: &Interactor) -> String {
    join_or_empty(
        interactor
            .gene_name
            .iter()
            .map(|gene| format!("uniprotkb:{}(gene name)", gene)),
    )
}

/// `pubmed:123` for PubMed ids, the identifier unchanged otherwise
fn publication_id(publication: &str) -> String {
    match publication.split_once(':') {
        Some((db, id)) if db.eq_ignore_ascii_case("pmid") || db.eq_ignore_ascii_case("pubmed") => {
            format!("pubmed:{}", id)
        },
        _ => publication.to_string(),
    }
}

pub struct MitabChunkWriter<'t> {
    output_dir: PathBuf,
    taxonomy: &'t dyn TaxonomyLookup,
    written: Vec<PathBuf>,
}

impl<'t> MitabChunkWriter<'t> {
    pub fn new(output_dir: impl Into<PathBuf>, taxonomy: &'t dyn TaxonomyLookup) -> Self {
        Self {
            output_dir: output_dir.into(),
            taxonomy,
            written: Vec::new(),
        }
    }

    /// Files written so far, in emission order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn taxid(&self, interactor: &Interactor) -> String {
        match interactor.organism {
            None => EMPTY.to_string(),
            Some(taxid) => match self.taxonomy.scientific_name(taxid) {
                Some(name) => format!("taxid:{}({})", taxid, name),
                None => format!("taxid:{}", taxid),
            },
        }
    }

    fn row(&self, raw: &RawInteraction) -> [String; 15] {
        let a = &raw.interactor_a;
        let b = &raw.interactor_b;
        let methods = join_or_empty(
            raw.evidences
                .iter()
                .map(|e| format!("psi-mi:\"{}\"", e.detection_method)),
        );
        let publications = join_or_empty(raw.evidences.iter().map(|e| publication_id(&e.publication)));
        let types = join_or_empty(
            raw.evidences
                .iter()
                .filter_map(|e| e.interaction_type.as_ref())
                .map(|t| format!("psi-mi:\"{}\"", t)),
        );
        let interaction_ids = join_or_empty(
            raw.evidences
                .iter()
                .filter_map(|e| e.interaction_ac.as_ref())
                .map(|ac| format!("{}:{}", INTACT_DATABASE, ac)),
        );

        [
            primary_id(a),
            primary_id(b),
            alternative_ids(a),
            alternative_ids(b),
            aliases(a),
            aliases(b),
            methods,
            EMPTY.to_string(),
            publications,
            self.taxid(a),
            self.taxid(b),
            types,
            SOURCE_DATABASE.to_string(),
            interaction_ids,
            EMPTY.to_string(),
        ]
    }

    fn write_file(&self, path: &Path, chunk: &PublicationChunk) -> std::result::Result<(), csv::Error> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(csv::QuoteStyle::Never)
            .has_headers(false)
            .from_path(path)?;

        writer.write_record(MITAB_25_HEADER)?;
        for raw in &chunk.interactions {
            writer.write_record(self.row(raw))?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn csv_sink_error(path: &Path, err: csv::Error) -> ExportError {
    match err.into_kind() {
        csv::ErrorKind::Io(io) => ExportError::sink(path, io),
        other => ExportError::Parse(format!("{:?}", other)),
    }
}

impl ChunkSink for MitabChunkWriter<'_> {
    fn write_chunk(&mut self, chunk: &PublicationChunk) -> Result<()> {
        let path = self.output_dir.join(chunk_file_name(chunk));
        self.write_file(&path, chunk)
            .map_err(|e| csv_sink_error(&path, e))?;
        debug!(path = %path.display(), rows = chunk.interactions.len(), "Wrote MITAB chunk");
        self.written.push(path);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::chunk::PublicationChunker;
    use crate::model::Evidence;
    use crate::source::{InMemoryTaxonomy, VecSource};
    use tempfile::TempDir;

    fn chunk(publication: &str, polarity: Polarity, index: usize) -> PublicationChunk {
        PublicationChunk {
            publication: publication.to_string(),
            polarity,
            index,
            interactions: Vec::new(),
        }
    }

    #[test]
    fn test_chunk_file_names() {
        assert_eq!(chunk_file_name(&chunk("PMID:123", Polarity::Positive, 2)), "PMID_123_2.txt");
        assert_eq!(
            chunk_file_name(&chunk("doi/10.1/x", Polarity::Negative, 1)),
            "doi_10.1_x_negative_1.txt"
        );
    }

    #[test]
    fn test_mitab_rows() {
        let dir = TempDir::new().unwrap();
        let mut taxonomy = InMemoryTaxonomy::default();
        taxonomy.insert(9606, "Homo sapiens");

        let mut evidence = Evidence::new("MI:0018", "PMID:12345");
        evidence.interaction_type = Some("MI:0915".to_string());
        evidence.interaction_ac = Some("EBI-100".to_string());
        let raw = RawInteraction::new(
            Interactor::protein("P12345", "EBI-1", 9606, Some("ABC1")),
            Interactor::protein("Q67890", "EBI-2", 10090, None),
        )
        .with_evidence(evidence);

        let mut writer = MitabChunkWriter::new(dir.path(), &taxonomy);
        PublicationChunker::new(10)
            .export_source(&VecSource::new(vec![raw]), &mut writer)
            .unwrap();

        assert_eq!(writer.written().len(), 1);
        let content = std::fs::read_to_string(&writer.written()[0]).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("#ID(s) interactor A\t"));

        let columns: Vec<_> = lines[1].split('\t').collect();
        assert_eq!(columns.len(), 15);
        assert_eq!(columns[0], "uniprotkb:P12345");
        assert_eq!(columns[2], "intact:EBI-1");
        assert_eq!(columns[4], "uniprotkb:ABC1(gene name)");
        assert_eq!(columns[5], "-");
        assert_eq!(columns[6], "psi-mi:\"MI:0018\"");
        assert_eq!(columns[8], "pubmed:12345");
        assert_eq!(columns[9], "taxid:9606(Homo sapiens)");
        assert_eq!(columns[10], "taxid:10090");
        assert_eq!(columns[11], "psi-mi:\"MI:0915\"");
        assert_eq!(columns[13], "intact:EBI-100");
        assert!(writer.written()[0].ends_with("PMID_12345_1.txt"));
    }

    #[test]
    fn test_unwritable_directory_is_sink_error() {
        let dir = TempDir::new().unwrap();
        let taxonomy = InMemoryTaxonomy::default();
        let mut writer = MitabChunkWriter::new(dir.path().join("missing"), &taxonomy);

        let result = writer.write_chunk(&chunk("PMID:1", Polarity::Positive, 1));
        assert!(matches!(result, Err(ExportError::Sink { .. })));
    }
}
