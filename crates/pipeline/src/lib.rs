//! Batch pipeline
//!
//! Runs every engine over a transcription and a directory of page scans:
//!
//! 1. The transcription is parsed once on the calling thread.
//! 2. Each page is an independent unit (segment, detect regions, align words
//!    and glyphs) and units run in parallel on a rayon pool.
//! 3. Results are written to a [`RecordSink`](scriptorium_common::RecordSink)
//!    in folio order, then the anchor methods run over the whole cohort.
//!
//! Nothing a page unit does can fail the run: an unreadable scan becomes an
//! `Io` anomaly in the [`RunReport`].

pub mod config;
pub mod page;
pub mod run;
pub mod sink;

pub use config::{load_config, PipelineConfig, RunSettings};
pub use page::{discover_pages, PageInput, PageOutput, PageUnit, PAGE_EXTENSIONS};
pub use run::{run_directory, MethodReport, Pipeline, RunReport};
pub use sink::{JsonlSink, MemorySink};

use scriptorium_anchors::AnchorError;
use scriptorium_common::{ScriptoriumError, SinkError};
use scriptorium_regions::RegionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Region configuration error: {0}")]
    Regions(#[from] RegionError),

    #[error("Anchor configuration error: {0}")]
    Anchors(#[from] AnchorError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Failed to snapshot configuration: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl From<PipelineError> for ScriptoriumError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Regions(e) => e.into(),
            PipelineError::Anchors(e) => e.into(),
            PipelineError::Sink(e) => Self::Sink(e),
            PipelineError::Snapshot(e) => Self::Serialization(e),
            PipelineError::ThreadPool(e) => Self::Other(e.to_string()),
        }
    }
}
