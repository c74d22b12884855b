//! UniProt export driver
//!
//! Classifies the cluster, walks the UniProt entries in accession order and
//! hands each entry to every line converter. One output file per format;
//! a failing file is closed and reported while the others carry on.

use crate::cluster::{cluster_source, InteractionCluster};
use crate::config::{ExportConfig, ExportRule};
use crate::entry::{resolve_entries, UniprotEntry};
use crate::error::{ExportError, Result};
use crate::filter::{classify, ExclusionReason, ExportedClusteredInteractions};
use crate::lines::go::{SkipReason, SkippedAnnotation};
use crate::lines::{cc, dr, go, gpi, FormatVersion, LineContext, LineFormat};
use crate::model::InteractionId;
use crate::score::ConfidenceScorer;
use crate::source::{InteractionSource, OntologyLookup};
use crate::writer::LineWriter;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Counts reported at the end of a UniProt export
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub rule: ExportRule,
    pub clustered_interactions: usize,
    pub entries: usize,
    /// Data lines written per format
    pub lines: BTreeMap<LineFormat, usize>,
    /// Entries for which a converter had nothing to write
    pub absent: BTreeMap<LineFormat, usize>,
    pub exclusions: BTreeMap<ExclusionReason, usize>,
    pub skipped_go_annotations: BTreeMap<SkipReason, usize>,
    /// Formats whose output file failed, with the error
    pub failed_sinks: BTreeMap<LineFormat, String>,
}

impl ExportSummary {
    pub fn is_success(&self) -> bool {
        self.failed_sinks.is_empty()
    }
}

/// Interactions of an entry split by export decision
///
/// Polarities stay apart until a converter asks for both: CC renders
/// exported negatives, every other format only positives.
struct EntryInteractions {
    exported: BTreeSet<InteractionId>,
    excluded: BTreeSet<InteractionId>,
    negative_exported: BTreeSet<InteractionId>,
}

impl EntryInteractions {
    fn new(entry: &UniprotEntry, exported: &ExportedClusteredInteractions<'_>) -> Self {
        let positive = exported.positive();
        let ids = entry.interaction_ids(exported.cluster());
        Self {
            exported: ids.intersection(&positive.to_export).copied().collect(),
            excluded: ids.intersection(&positive.to_exclude).copied().collect(),
            negative_exported: ids.intersection(&exported.negative().to_export).copied().collect(),
        }
    }

    fn exported_both_polarities(&self) -> BTreeSet<InteractionId> {
        self.exported.union(&self.negative_exported).copied().collect()
    }
}

pub struct UniprotExporter<'a> {
    config: &'a ExportConfig,
    output_dir: PathBuf,
    date: NaiveDate,
    ontology: Option<&'a dyn OntologyLookup>,
}

impl<'a> UniprotExporter<'a> {
    pub fn new(config: &'a ExportConfig, output_dir: impl Into<PathBuf>, date: NaiveDate) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
            date,
            ontology: None,
        }
    }

    /// Only export GO terms known to `ontology`
    pub fn with_ontology(mut self, ontology: &'a dyn OntologyLookup) -> Self {
        self.ontology = Some(ontology);
        self
    }

    pub fn output_path(&self, format: LineFormat) -> PathBuf {
        self.output_dir.join(format.file_name())
    }

    /// Cluster `source` and export it
    pub fn export_source(
        &self,
        source: &dyn InteractionSource,
        scorer: &dyn ConfidenceScorer,
    ) -> Result<ExportSummary> {
        self.config.validate()?;
        let cluster = cluster_source(source, self.config.cluster_chunk_size, scorer)?;
        self.export(&cluster)
    }

    fn open_writers(&self, summary: &mut ExportSummary) -> BTreeMap<LineFormat, LineWriter> {
        let mut writers = BTreeMap::new();
        for format in LineFormat::ALL {
            let path = self.output_path(format);
            match LineWriter::create(
                &path,
                format,
                self.config.version_of(format),
                &self.config.assigned_by,
                self.date,
            ) {
                Ok(writer) => {
                    writers.insert(format, writer);
                },
                Err(e) => {
                    error!(%format, path = %path.display(), error = %e, "Failed to open output");
                    summary.failed_sinks.insert(format, e.to_string());
                },
            }
        }
        writers
    }

    fn render(
        &self,
        format: LineFormat,
        interactions: &EntryInteractions,
        ctx: &LineContext<'_>,
        entry: &UniprotEntry,
        skipped_go: &mut BTreeSet<SkippedAnnotation>,
    ) -> Option<String> {
        let version: FormatVersion = self.config.version_of(format);
        let (exported, excluded) = (&interactions.exported, &interactions.excluded);
        match format {
            LineFormat::Cc => cc::convert(&interactions.exported_both_polarities(), excluded, ctx, entry)
                .map(|p| p.render(version)),
            LineFormat::Dr => dr::convert(exported, excluded, ctx, entry).map(|p| p.render(version)),
            LineFormat::Go => go::convert(exported, excluded, ctx, entry).and_then(|params| {
                // an annotation is seen once per entry it touches, count it once per run
                skipped_go.extend(params.skipped.iter().cloned());
                (!params.is_empty()).then(|| params.render(version))
            }),
            LineFormat::Gpi => gpi::convert(exported, excluded, ctx, entry).map(|p| p.render(version)),
        }
    }

    /// Export an already clustered store
    pub fn export(&self, cluster: &InteractionCluster) -> Result<ExportSummary> {
        // configuration errors surface before any file is touched
        self.config.validate()?;
        let exported = classify(cluster, &self.config.filter)?;

        let mut summary = ExportSummary {
            rule: self.config.rule,
            clustered_interactions: cluster.len(),
            exclusions: exported.exclusions().clone(),
            ..ExportSummary::default()
        };

        let mut writers = self.open_writers(&mut summary);
        let mut skipped_go = BTreeSet::new();

        let mut ctx = LineContext::new(&exported, self.date);
        ctx.assigned_by = self.config.assigned_by.clone();
        ctx.ontology = self.ontology;

        let accessions = cluster.uniprot_accessions();
        for entry in resolve_entries(&accessions, &exported) {
            summary.entries += 1;
            let interactions = EntryInteractions::new(&entry, &exported);

            for format in LineFormat::ALL {
                if !writers.contains_key(&format) {
                    continue;
                }
                let Some(record) = self.render(format, &interactions, &ctx, &entry, &mut skipped_go) else {
                    *summary.absent.entry(format).or_default() += 1;
                    continue;
                };

                let written = writers
                    .get_mut(&format)
                    .map(|writer| writer.write_record(&record));
                match written {
                    Some(Ok(())) => {
                        *summary.lines.entry(format).or_default() += record.matches('\n').count();
                    },
                    Some(Err(e)) => {
                        error!(%format, master = %entry.master, error = %e, "Output failed, closing sink");
                        summary.failed_sinks.insert(format, e.to_string());
                        writers.remove(&format);
                    },
                    None => {},
                }
            }

            if summary.entries % 10_000 == 0 {
                info!(entries = summary.entries, "Export progress");
            }
        }

        for (format, writer) in writers {
            if let Err(e) = writer.finish() {
                error!(%format, error = %e, "Failed to close output");
                summary.failed_sinks.insert(format, e.to_string());
            }
        }
        for skipped in &skipped_go {
            *summary.skipped_go_annotations.entry(skipped.reason).or_default() += 1;
        }

        log_summary(&summary);
        Ok(summary)
    }
}

fn log_summary(summary: &ExportSummary) {
    info!(
        rule = %summary.rule,
        clustered = summary.clustered_interactions,
        entries = summary.entries,
        lines = ?summary.lines,
        exclusions = ?summary.exclusions,
        skipped_go = ?summary.skipped_go_annotations,
        "UniProt export finished"
    );
    for (format, reason) in &summary.failed_sinks {
        warn!(%format, reason = %reason, "Output incomplete");
    }
}

/// Write `summary` as pretty JSON
pub fn write_summary(summary: &ExportSummary, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json).map_err(|e| ExportError::sink(path, e))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::cluster::ClusterBuilder;
    use crate::model::{Evidence, GoAnnotation, Interactor, RawInteraction};
    use crate::score::MiScorer;
    use tempfile::TempDir;

    fn cluster() -> InteractionCluster {
        let builder = ClusterBuilder::new();
        let p1 = Interactor::protein("P12345", "EBI-1", 9606, Some("ABC1"));
        let q1 = Interactor::protein("Q67890", "EBI-2", 9606, Some("XYZ"));
        builder.add_interaction(
            RawInteraction::new(p1.clone(), q1.clone())
                .with_evidence(Evidence::new("MI:0018", "PMID:1"))
                .with_go(GoAnnotation {
                    go_id: "GO:0005634".to_string(),
                    qualifier: Some("component".to_string()),
                    evidence_code: Some("ECO:0000353".to_string()),
                    reference: Some("PMID:1".to_string()),
                }),
        );
        builder.add_interaction(
            RawInteraction::new(p1, Interactor::protein("O11111", "EBI-3", 9606, None))
                .with_evidence(Evidence::new("MI:0018", "PMID:2"))
                .spoke_expanded(),
        );
        builder.freeze(&MiScorer::default())
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    }

    #[test]
    fn test_export_writes_every_format() {
        let dir = TempDir::new().unwrap();
        let config = ExportConfig::default();
        let exporter = UniprotExporter::new(&config, dir.path(), date());

        let summary = exporter.export(&cluster()).unwrap();

        assert!(summary.is_success());
        assert_eq!(summary.entries, 3);
        assert_eq!(summary.exclusions.get(&ExclusionReason::SpokeExpanded), Some(&1));
        // O11111 only has an excluded interaction: DR line, nothing else
        assert_eq!(summary.lines.get(&LineFormat::Dr), Some(&3));
        assert_eq!(summary.lines.get(&LineFormat::Cc), Some(&2));
        assert_eq!(summary.lines.get(&LineFormat::Go), Some(&2));
        assert_eq!(summary.absent.get(&LineFormat::Cc), Some(&1));

        let dr = std::fs::read_to_string(exporter.output_path(LineFormat::Dr)).unwrap();
        assert!(dr.starts_with("!dr-version: 1\n!generated-by: IntAct\n!date-generated: 2024-01-31\n"));
        assert!(dr.contains("P12345\tIntAct\tP12345\t2\t\n"));

        let cc = std::fs::read_to_string(exporter.output_path(LineFormat::Cc)).unwrap();
        assert!(cc.contains("AC   P12345\tABC1; XYZ (9606, EBI-2, 1)\t\n"));
    }

    #[test]
    fn test_failed_sink_does_not_stop_other_formats() {
        let dir = TempDir::new().unwrap();
        let config = ExportConfig::default();
        let exporter = UniprotExporter::new(&config, dir.path(), date());
        // a directory where the GPI file should go makes that sink fail
        std::fs::create_dir(exporter.output_path(LineFormat::Gpi)).unwrap();

        let summary = exporter.export(&cluster()).unwrap();

        assert!(!summary.is_success());
        assert!(summary.failed_sinks.contains_key(&LineFormat::Gpi));
        assert_eq!(summary.failed_sinks.len(), 1);
        assert!(summary.lines.get(&LineFormat::Cc).is_some());
    }

    #[test]
    fn test_invalid_config_fails_before_opening_sinks() {
        let dir = TempDir::new().unwrap();
        let mut config = ExportConfig::default();
        config.filter.confidence_threshold = Some(0.5);
        let exporter = UniprotExporter::new(&config, dir.path(), date());

        assert!(exporter.export(&cluster()).is_err());
        assert!(!exporter.output_path(LineFormat::Cc).exists());
    }

    #[test]
    fn test_summary_serializes_to_json() {
        let dir = TempDir::new().unwrap();
        let config = ExportConfig::default();
        let summary = UniprotExporter::new(&config, dir.path(), date())
            .export(&cluster())
            .unwrap();

        let path = dir.path().join("summary.json");
        write_summary(&summary, &path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["rule"], "default");
        assert_eq!(value["exclusions"]["spoke_expanded"], 1);
        assert_eq!(value["lines"]["dr"], 3);
    }

    #[test]
    fn test_annotation_without_qualifier_counted_once_across_entries() {
        let dir = TempDir::new().unwrap();
        let builder = ClusterBuilder::new();
        builder.add_interaction(
            RawInteraction::new(
                Interactor::protein("P12345", "EBI-1", 9606, Some("ABC1")),
                Interactor::protein("Q67890", "EBI-2", 10090, Some("XYZ")),
            )
            .with_evidence(Evidence::new("MI:0018", "PMID:1"))
            .with_go(GoAnnotation {
                go_id: "GO:0006915".to_string(),
                qualifier: None,
                evidence_code: Some("ECO:0000269".to_string()),
                reference: Some("PMID:1".to_string()),
            }),
        );
        let config = ExportConfig::default();

        let summary = UniprotExporter::new(&config, dir.path(), date())
            .export(&builder.freeze(&MiScorer::default()))
            .unwrap();

        // both P12345 and Q67890 see the annotation
        assert_eq!(summary.entries, 2);
        assert_eq!(summary.skipped_go_annotations.get(&SkipReason::MissingQualifier), Some(&1));
        assert_eq!(summary.skipped_go_annotations.len(), 1);
        assert_eq!(summary.lines.get(&LineFormat::Go), None);
    }

    #[test]
    fn test_exported_negative_interaction_reaches_cc() {
        let dir = TempDir::new().unwrap();
        let builder = ClusterBuilder::new();
        builder.add_interaction(
            RawInteraction::new(
                Interactor::protein("P11111", "EBI-1", 9606, Some("ABC1")),
                Interactor::protein("P33333", "EBI-3", 9606, Some("DEF")),
            )
            .with_evidence(Evidence::new("MI:0018", "PMID:1"))
            .negative(),
        );
        let config = ExportConfig::for_rule(ExportRule::All);
        let exporter = UniprotExporter::new(&config, dir.path(), date());

        let summary = exporter.export(&builder.freeze(&MiScorer::default())).unwrap();

        assert_eq!(summary.entries, 2);
        assert_eq!(summary.lines.get(&LineFormat::Cc), Some(&2));
        // negatives are not cross-references or GO evidence
        assert_eq!(summary.absent.get(&LineFormat::Dr), Some(&2));
        assert_eq!(summary.absent.get(&LineFormat::Go), Some(&2));
        assert_eq!(summary.absent.get(&LineFormat::Gpi), Some(&2));

        let cc = std::fs::read_to_string(exporter.output_path(LineFormat::Cc)).unwrap();
        assert!(cc.contains("AC   P11111\tABC1; NOT DEF (9606, EBI-3, 1)\t\n"));
        assert!(cc.contains("AC   P33333\tDEF; NOT ABC1 (9606, EBI-1, 1)\t\n"));
    }

    #[test]
    fn test_excluded_negative_interaction_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let builder = ClusterBuilder::new();
        builder.add_interaction(
            RawInteraction::new(
                Interactor::protein("P11111", "EBI-1", 9606, Some("ABC1")),
                Interactor::protein("P33333", "EBI-3", 9606, Some("DEF")),
            )
            .with_evidence(Evidence::new("MI:0018", "PMID:1"))
            .negative(),
        );
        let mut config = ExportConfig::for_rule(ExportRule::All);
        config.filter.exclude_negative = true;

        let summary = UniprotExporter::new(&config, dir.path(), date())
            .export(&builder.freeze(&MiScorer::default()))
            .unwrap();

        assert_eq!(summary.lines.get(&LineFormat::Cc), None);
        assert_eq!(summary.exclusions.get(&ExclusionReason::Negative), Some(&1));
    }
}
