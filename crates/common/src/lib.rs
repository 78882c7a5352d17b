//! Common types shared by the scriptorium alignment crates
//!
//! Everything that crosses a crate boundary lives here: page-pixel geometry,
//! the anomaly taxonomy, the run context threaded through every call, the
//! tagged ambiguity result, the persisted record types and the sink trait the
//! persistence layer implements.

pub mod anomaly;
pub mod context;
pub mod geometry;
pub mod ids;
pub mod records;
pub mod resolution;
pub mod sink;

pub use anomaly::{
    AdequacyFailure, AlignmentMismatch, Anomaly, AnomalyKind, AnomalyLog, GeometryAnomaly,
    GeometryIssue, IoFailure, MismatchReason, ParseAnomaly,
};
pub use context::RunContext;
pub use geometry::PixelBox;
pub use ids::IdBuilder;
pub use records::{
    Anchor, AnchorSource, Cardinality, EdgeKind, GlyphAlignment, GlyphRef, LineKey, Region,
    RegionEdge, RegionFeatures, WordAlignment,
};
pub use resolution::Resolution;
pub use sink::{RecordSink, SinkError};

use thiserror::Error;

/// Errors shared across the workspace
#[derive(Debug, Error)]
pub enum ScriptoriumError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Image processing error: {0}")]
    ImageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Other error: {0}")]
    Other(String),
}

/// Result type for scriptorium operations
pub type Result<T> = std::result::Result<T, ScriptoriumError>;
