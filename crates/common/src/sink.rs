//! Persistence seam
//!
//! The core never knows how records are stored. It hands each record, keyed by
//! its deterministic id, to a [`RecordSink`] together with the run context.

use crate::anomaly::Anomaly;
use crate::context::RunContext;
use crate::records::{Anchor, GlyphAlignment, Region, RegionEdge, WordAlignment};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Sink rejected record {id}: {reason}")]
    Rejected { id: String, reason: String },
}

/// Receiver for every record the engines produce
///
/// Implementations upsert by record id: writing the same id twice must leave
/// one record.
pub trait RecordSink {
    fn add_word_alignment(
        &mut self,
        run: &RunContext,
        record: &WordAlignment,
    ) -> Result<(), SinkError>;

    fn add_glyph_alignment(
        &mut self,
        run: &RunContext,
        record: &GlyphAlignment,
    ) -> Result<(), SinkError>;

    fn add_region(&mut self, run: &RunContext, record: &Region) -> Result<(), SinkError>;

    fn add_region_edge(&mut self, run: &RunContext, record: &RegionEdge)
        -> Result<(), SinkError>;

    fn add_anchor(&mut self, run: &RunContext, record: &Anchor) -> Result<(), SinkError>;

    fn add_anomaly(&mut self, run: &RunContext, anomaly: &Anomaly) -> Result<(), SinkError>;

    /// Called once after the last record of a run
    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}
