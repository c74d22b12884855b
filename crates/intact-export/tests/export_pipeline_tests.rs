//! End-to-end tests for the UniProt export: source → cluster → classify →
//! resolve → convert → write

use chrono::NaiveDate;
use intact_export::lines::go::SkipReason;
use intact_export::{
    ExclusionReason, ExportConfig, ExportError, FormatVersion, InMemoryOntology, JsonLinesSource, LineFormat,
    MiScorer, UniprotExporter,
};
use std::io::Write;
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

/// Data lines of an output file, header removed
fn data_lines(path: PathBuf) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("Failed to read output")
        .split_inclusive('\n')
        .filter(|line| !line.starts_with('!'))
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Default rule, version 1 formats
// ============================================================================

#[test]
fn test_default_export_of_fixture() {
    let dir = TempDir::new().unwrap();
    let config = ExportConfig::default();
    let source = JsonLinesSource::new(fixture_path("interactions.jsonl"));
    let exporter = UniprotExporter::new(&config, dir.path(), date());

    let summary = exporter
        .export_source(&source, &MiScorer::default())
        .expect("Export failed");

    assert!(summary.is_success());
    assert_eq!(summary.entries, 3);
    assert_eq!(summary.exclusions[&ExclusionReason::UnresolvableAccession], 1);
    assert_eq!(summary.exclusions[&ExclusionReason::SpokeExpanded], 1);
    assert_eq!(summary.exclusions[&ExclusionReason::NonUniprotInteractor], 1);
    assert_eq!(summary.skipped_go_annotations[&SkipReason::MissingQualifier], 1);

    assert_eq!(
        data_lines(exporter.output_path(LineFormat::Cc)),
        vec![
            "AC   P12345\tABC1; XYZ (10090, EBI-2, 3); NOT XYZ (10090, EBI-2, 1)\t\n",
            "AC   Q67890\tXYZ; Self (10090, EBI-2, 1); ABC1 (9606, EBI-1, 2); NOT ABC1 (9606, EBI-1, 1); \
             ABC1 (9606, EBI-3, 1)\t\n",
        ]
    );

    assert_eq!(
        data_lines(exporter.output_path(LineFormat::Dr)),
        vec![
            "O99999\tIntAct\tO99999\t1\t\n",
            "P12345\tIntAct\tP12345\t4\t\n",
            "Q67890\tIntAct\tQ67890\t3\t\n",
        ]
    );

    assert_eq!(
        data_lines(exporter.output_path(LineFormat::Go)),
        vec![
            "UniProtKB\tP12345\tlocated_in\tGO:0005634\tPMID:100\tECO:0000353\tUniProtKB:Q67890\ttaxon:10090\t20240315\tIntAct\t\t\t\n",
            "UniProtKB\tQ67890\tlocated_in\tGO:0005634\tPMID:100\tECO:0000353\tUniProtKB:P12345\ttaxon:9606\t20240315\tIntAct\t\t\t\n",
        ]
    );

    assert_eq!(
        data_lines(exporter.output_path(LineFormat::Gpi)),
        vec![
            "UniProtKB\tP12345\tABC1\tABC transporter 1\t\tprotein\ttaxon:9606\t\tIntAct:EBI-1\t\t\n",
            "UniProtKB\tP12345-2\tABC1\t\t\tprotein\ttaxon:9606\tUniProtKB:P12345\tIntAct:EBI-3\t\t\n",
            "UniProtKB\tQ67890\tXYZ\t\t\tprotein\ttaxon:10090\t\tIntAct:EBI-2\t\t\n",
        ]
    );
}

#[test]
fn test_headers_follow_requested_versions() {
    let dir = TempDir::new().unwrap();
    let config = ExportConfig {
        go_version: FormatVersion::V2,
        gpi_version: FormatVersion::V2,
        ..ExportConfig::default()
    };
    let source = JsonLinesSource::new(fixture_path("interactions.jsonl"));
    let exporter = UniprotExporter::new(&config, dir.path(), date());
    exporter.export_source(&source, &MiScorer::default()).unwrap();

    let gpad = std::fs::read_to_string(exporter.output_path(LineFormat::Go)).unwrap();
    assert!(gpad.starts_with("!gpad-version: 2.0\n!generated-by: IntAct\n!date-generated: 2024-03-15\n"));
    for line in gpad.lines().filter(|l| !l.starts_with('!')) {
        assert_eq!(line.split('\t').count(), 12);
        assert!(line.contains("\t2024-03-15\t"));
    }

    let gpi = std::fs::read_to_string(exporter.output_path(LineFormat::Gpi)).unwrap();
    assert!(gpi.starts_with("!gpi-version: 2.0\n"));
    let master = gpi.lines().find(|l| l.starts_with("UniProtKB:P12345\t")).unwrap();
    assert!(master.contains("\tUniProtKB:P12345-2\t"));
}

// ============================================================================
// Rules and lookups
// ============================================================================

#[test]
fn test_all_rule_exports_spoke_expanded() {
    let dir = TempDir::new().unwrap();
    let config = ExportConfig::for_rule(intact_export::ExportRule::All);
    let source = JsonLinesSource::new(fixture_path("interactions.jsonl"));
    let exporter = UniprotExporter::new(&config, dir.path(), date());

    let summary = exporter.export_source(&source, &MiScorer::default()).unwrap();

    assert!(!summary.exclusions.contains_key(&ExclusionReason::SpokeExpanded));
    let cc = data_lines(exporter.output_path(LineFormat::Cc));
    assert!(cc.iter().any(|line| line.starts_with("AC   O99999\tOPQ; ABC1 (9606, EBI-1, 1)")));
}

#[test]
fn test_go_ontology_rejects_unknown_terms() {
    let dir = TempDir::new().unwrap();
    let config = ExportConfig::default();
    let mut ontology = InMemoryOntology::default();
    ontology.add_parent("GO:0000001", "GO:0008150");
    let source = JsonLinesSource::new(fixture_path("interactions.jsonl"));
    let exporter = UniprotExporter::new(&config, dir.path(), date()).with_ontology(&ontology);

    let summary = exporter.export_source(&source, &MiScorer::default()).unwrap();

    // one annotation on one interaction, although both of its entries see it
    assert_eq!(summary.skipped_go_annotations[&SkipReason::UnknownGoTerm], 1);
    assert!(data_lines(exporter.output_path(LineFormat::Go)).is_empty());

    let known = InMemoryOntology::from_tsv(fixture_path("go_parents.tsv")).unwrap();
    let exporter = UniprotExporter::new(&config, dir.path(), date()).with_ontology(&known);
    exporter.export_source(&JsonLinesSource::new(fixture_path("interactions.jsonl")), &MiScorer::default()).unwrap();
    assert_eq!(data_lines(exporter.output_path(LineFormat::Go)).len(), 2);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_source_error_aborts_before_any_output() {
    let dir = TempDir::new().unwrap();
    let mut input = NamedTempFile::new().unwrap();
    let valid = std::fs::read_to_string(fixture_path("interactions.jsonl")).unwrap();
    write!(input, "{}", valid).unwrap();
    writeln!(input, "{{\"interactor_a\": ").unwrap();

    let config = ExportConfig::default();
    let exporter = UniprotExporter::new(&config, dir.path(), date());
    let result = exporter.export_source(&JsonLinesSource::new(input.path()), &MiScorer::default());

    assert!(matches!(result, Err(ExportError::Source(_))));
    for format in LineFormat::ALL {
        assert!(!exporter.output_path(format).exists());
    }
}

#[test]
fn test_output_is_reproducible() {
    let config = ExportConfig::default();
    let mut outputs = Vec::new();
    for _ in 0..2 {
        let dir = TempDir::new().unwrap();
        let exporter = UniprotExporter::new(&config, dir.path(), date());
        exporter
            .export_source(&JsonLinesSource::new(fixture_path("interactions.jsonl")), &MiScorer::default())
            .unwrap();
        let files: Vec<String> = LineFormat::ALL
            .iter()
            .map(|f| std::fs::read_to_string(exporter.output_path(*f)).unwrap())
            .collect();
        outputs.push(files);
    }
    assert_eq!(outputs[0], outputs[1]);
}
