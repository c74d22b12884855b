//! Chunked publication export
//!
//! Splits the interactions of each publication into bounded files. Whole
//! experiments are packed into the current chunk until the next one would
//! overflow the threshold; only an experiment larger than the threshold on
//! its own is cut into sub-chunks. Positive and negative interactions never
//! share a chunk.

use crate::error::Result;
use crate::model::{Polarity, RawInteraction};
use crate::source::InteractionSource;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

pub const DEFAULT_LARGE_SCALE_THRESHOLD: usize = 2000;

/// Publication key for interactions without evidence
pub const UNKNOWN_PUBLICATION: &str = "unassigned";

const UNKNOWN_EXPERIMENT: &str = "-";

/// Interactions of one experiment of a publication
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    pub id: String,
    pub interactions: Vec<RawInteraction>,
}

/// One output unit of the chunked export
#[derive(Debug, Clone, PartialEq)]
pub struct PublicationChunk {
    pub publication: String,
    pub polarity: Polarity,
    /// 1-based, counted per publication and polarity
    pub index: usize,
    pub interactions: Vec<RawInteraction>,
}

/// Destination of emitted chunks
pub trait ChunkSink {
    fn write_chunk(&mut self, chunk: &PublicationChunk) -> Result<()>;
}

impl ChunkSink for Vec<PublicationChunk> {
    fn write_chunk(&mut self, chunk: &PublicationChunk) -> Result<()> {
        self.push(chunk.clone());
        Ok(())
    }
}

/// Per-publication, per-polarity accumulator
///
/// Accumulates experiments and flushes whenever the next one would overflow.
/// `finish` consumes it, so nothing can be pushed once it is done.
struct ChunkAccumulator<'p> {
    publication: &'p str,
    polarity: Polarity,
    threshold: usize,
    buffer: Vec<RawInteraction>,
    next_index: usize,
}

impl<'p> ChunkAccumulator<'p> {
    fn new(publication: &'p str, polarity: Polarity, threshold: usize) -> Self {
        Self {
            publication,
            polarity,
            threshold,
            buffer: Vec::new(),
            next_index: 1,
        }
    }

    fn emit(&mut self, interactions: Vec<RawInteraction>, sink: &mut dyn ChunkSink) -> Result<()> {
        let chunk = PublicationChunk {
            publication: self.publication.to_string(),
            polarity: self.polarity,
            index: self.next_index,
            interactions,
        };
        debug!(
            publication = self.publication,
            polarity = %self.polarity,
            index = chunk.index,
            size = chunk.interactions.len(),
            "Emitting chunk"
        );
        sink.write_chunk(&chunk)?;
        self.next_index += 1;
        Ok(())
    }

    fn flush(&mut self, sink: &mut dyn ChunkSink) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let buffer = std::mem::take(&mut self.buffer);
        self.emit(buffer, sink)
    }

    fn push_experiment(&mut self, interactions: Vec<RawInteraction>, sink: &mut dyn ChunkSink) -> Result<()> {
        if interactions.is_empty() {
            return Ok(());
        }

        if interactions.len() > self.threshold {
            self.flush(sink)?;
            let mut rest = interactions;
            while !rest.is_empty() {
                let tail = rest.split_off(rest.len().min(self.threshold));
                self.emit(rest, sink)?;
                rest = tail;
            }
            return Ok(());
        }

        if self.buffer.len() + interactions.len() > self.threshold {
            self.flush(sink)?;
        }
        self.buffer.extend(interactions);
        Ok(())
    }

    /// Emit the remaining interactions; returns the number of chunks
    fn finish(mut self, sink: &mut dyn ChunkSink) -> Result<usize> {
        self.flush(sink)?;
        Ok(self.next_index - 1)
    }
}

/// Chunk counts of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChunkSummary {
    pub publications: usize,
    pub positive_chunks: usize,
    pub negative_chunks: usize,
    pub interactions: usize,
}

pub struct PublicationChunker {
    threshold: usize,
}

impl Default for PublicationChunker {
    fn default() -> Self {
        Self::new(DEFAULT_LARGE_SCALE_THRESHOLD)
    }
}

impl PublicationChunker {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Chunk one publication given its experiments in order
    pub fn export_publication(
        &self,
        publication: &str,
        experiments: Vec<Experiment>,
        sink: &mut dyn ChunkSink,
    ) -> Result<(usize, usize)> {
        let mut positive = ChunkAccumulator::new(publication, Polarity::Positive, self.threshold);
        let mut negative = ChunkAccumulator::new(publication, Polarity::Negative, self.threshold);

        for experiment in experiments {
            let (neg, pos): (Vec<_>, Vec<_>) = experiment.interactions.into_iter().partition(|i| i.negative);
            positive.push_experiment(pos, sink)?;
            negative.push_experiment(neg, sink)?;
        }

        Ok((positive.finish(sink)?, negative.finish(sink)?))
    }

    /// Group the source by publication and experiment, then chunk every
    /// publication in sorted order
    pub fn export_source(&self, source: &dyn InteractionSource, sink: &mut dyn ChunkSink) -> Result<ChunkSummary> {
        let publications = group_experiments(source)?;
        let mut summary = ChunkSummary::default();

        for (publication, experiments) in publications {
            summary.publications += 1;
            summary.interactions += experiments.iter().map(|e| e.interactions.len()).sum::<usize>();
            let (positive, negative) = self.export_publication(&publication, experiments, sink)?;
            summary.positive_chunks += positive;
            summary.negative_chunks += negative;
        }

        info!(
            publications = summary.publications,
            positive_chunks = summary.positive_chunks,
            negative_chunks = summary.negative_chunks,
            interactions = summary.interactions,
            "Chunked publication export finished"
        );
        Ok(summary)
    }
}

/// Read the whole source into publication → experiments, both sorted by id
pub fn group_experiments(source: &dyn InteractionSource) -> Result<BTreeMap<String, Vec<Experiment>>> {
    let mut grouped: BTreeMap<String, BTreeMap<String, Vec<RawInteraction>>> = BTreeMap::new();
    for raw in source.iterate_all()? {
        let raw = raw?;
        let publication = raw.publication().unwrap_or(UNKNOWN_PUBLICATION).to_string();
        let experiment = raw.experiment().unwrap_or(UNKNOWN_EXPERIMENT).to_string();
        grouped
            .entry(publication)
            .or_default()
            .entry(experiment)
            .or_default()
            .push(raw);
    }

    Ok(grouped
        .into_iter()
        .map(|(publication, experiments)| {
            let experiments = experiments
                .into_iter()
                .map(|(id, interactions)| Experiment { id, interactions })
                .collect();
            (publication, experiments)
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::{Evidence, Interactor};
    use crate::source::VecSource;

    fn raw(n: usize, experiment: &str, negative: bool) -> RawInteraction {
        let mut evidence = Evidence::new("MI:0018", "PMID:1");
        evidence.experiment = Some(experiment.to_string());
        let raw = RawInteraction::new(
            Interactor::protein(&format!("P{:05}", n), "EBI-1", 9606, None),
            Interactor::protein("Q00001", "EBI-2", 9606, None),
        )
        .with_evidence(evidence);
        if negative {
            raw.negative()
        } else {
            raw
        }
    }

    fn experiment(id: &str, size: usize) -> Experiment {
        Experiment {
            id: id.to_string(),
            interactions: (0..size).map(|n| raw(n, id, false)).collect(),
        }
    }

    fn sizes(chunks: &[PublicationChunk]) -> Vec<usize> {
        chunks.iter().map(|c| c.interactions.len()).collect()
    }

    #[test]
    fn test_large_experiment_split_into_threshold_sized_chunks() {
        let chunker = PublicationChunker::new(2000);
        let mut sink: Vec<PublicationChunk> = Vec::new();

        let (positive, negative) = chunker
            .export_publication("PMID:1", vec![experiment("EXP-1", 5000)], &mut sink)
            .unwrap();

        assert_eq!((positive, negative), (3, 0));
        assert_eq!(sizes(&sink), vec![2000, 2000, 1000]);
        assert_eq!(sink.iter().map(|c| c.index).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_experiments_packed_without_exceeding_threshold() {
        let chunker = PublicationChunker::new(10);
        let mut sink: Vec<PublicationChunk> = Vec::new();
        let experiments = vec![
            experiment("A", 4),
            experiment("B", 5),
            experiment("C", 3),
            experiment("D", 10),
            experiment("E", 12),
            experiment("F", 1),
        ];

        chunker.export_publication("PMID:1", experiments, &mut sink).unwrap();

        // A+B, C, D, E split 10+2, F
        assert_eq!(sizes(&sink), vec![9, 3, 10, 10, 2, 1]);
        assert!(sink.iter().all(|c| c.interactions.len() <= 10));
    }

    #[test]
    fn test_polarities_never_mixed() {
        let chunker = PublicationChunker::new(3);
        let mut sink: Vec<PublicationChunk> = Vec::new();
        let mixed = Experiment {
            id: "EXP".to_string(),
            interactions: (0..4).map(|n| raw(n, "EXP", n % 2 == 0)).collect(),
        };

        chunker.export_publication("PMID:1", vec![mixed], &mut sink).unwrap();

        assert_eq!(sink.len(), 2);
        for chunk in &sink {
            let expected = chunk.polarity == Polarity::Negative;
            assert!(chunk.interactions.iter().all(|i| i.negative == expected));
            assert_eq!(chunk.index, 1);
        }
    }

    #[test]
    fn test_export_source_groups_publications() {
        let mut interactions: Vec<_> = (0..5).map(|n| raw(n, "EXP-1", false)).collect();
        let mut other = raw(9, "EXP-9", false);
        other.evidences[0].publication = "PMID:2".to_string();
        interactions.push(other);
        interactions.push(raw(10, "EXP-1", true));

        let mut sink: Vec<PublicationChunk> = Vec::new();
        let summary = PublicationChunker::new(3)
            .export_source(&VecSource::new(interactions), &mut sink)
            .unwrap();

        assert_eq!(
            summary,
            ChunkSummary {
                publications: 2,
                positive_chunks: 3,
                negative_chunks: 1,
                interactions: 7,
            }
        );
        assert_eq!(sink.last().unwrap().publication, "PMID:2");
    }

    #[test]
    fn test_accumulator_flushes_pending_before_split_and_tail_on_finish() {
        let mut sink: Vec<PublicationChunk> = Vec::new();
        let mut accumulator = ChunkAccumulator::new("PMID:1", Polarity::Positive, 4);

        accumulator.push_experiment(experiment("A", 2).interactions, &mut sink).unwrap();
        assert!(sink.is_empty());
        accumulator.push_experiment(experiment("B", 6).interactions, &mut sink).unwrap();
        accumulator.push_experiment(experiment("C", 1).interactions, &mut sink).unwrap();
        assert_eq!(sizes(&sink), vec![2, 4, 2]);

        let chunks = accumulator.finish(&mut sink).unwrap();
        assert_eq!(chunks, 4);
        assert_eq!(sizes(&sink), vec![2, 4, 2, 1]);
        assert_eq!(sink.iter().map(|c| c.index).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }
}
