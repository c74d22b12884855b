//! IntAct export engine
//!
//! Clusters raw binary interactions, decides which of them are published,
//! groups them per UniProt entry and renders the UniProt line formats
//! (CC, DR, GPAD, GPI). A second path splits publications into bounded
//! MITAB files.
//!
//! # Example
//!
//! ```no_run
//! use intact_export::{ExportConfig, JsonLinesSource, MiScorer, UniprotExporter};
//!
//! fn main() -> intact_export::Result<()> {
//!     let config = ExportConfig::from_env()?;
//!     let source = JsonLinesSource::new("./data/interactions.jsonl");
//!     let today = chrono::Local::now().date_naive();
//!     let summary = UniprotExporter::new(&config, "./out", today)
//!         .export_source(&source, &MiScorer::default())?;
//!     println!("{} entries exported", summary.entries);
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod chunk;
pub mod cluster;
pub mod config;
pub mod entry;
pub mod error;
pub mod exporter;
pub mod filter;
pub mod lines;
pub mod mitab;
pub mod model;
pub mod score;
pub mod source;
pub mod writer;

pub use chunk::{ChunkSink, ChunkSummary, PublicationChunk, PublicationChunker};
pub use cluster::{cluster_source, ClusterBuilder, InteractionCluster, MiClusterContext};
pub use config::{ExportConfig, ExportRule};
pub use entry::{master_accession, resolve_entries, UniprotEntry};
pub use error::{ExportError, Result};
pub use exporter::{write_summary, ExportSummary, UniprotExporter};
pub use filter::{classify, ExclusionReason, ExportedClusteredInteractions, FilterConfig};
pub use lines::{FormatVersion, LineFormat};
pub use mitab::MitabChunkWriter;
pub use model::{ClusteredInteraction, Evidence, GoAnnotation, InteractionId, Interactor, Polarity, RawInteraction};
pub use score::{ConfidenceScorer, MiScorer};
pub use source::{
    InMemoryOntology, InMemoryTaxonomy, InteractionSource, JsonLinesSource, OntologyLookup, TaxonomyLookup,
    VecSource,
};
