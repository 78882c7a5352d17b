//! Anchor engine
//!
//! Anchors tie an aligned text structure (a word segment or a whole line) to
//! a detected region. Each [`AnchorMethod`] scores pairs its own way and runs
//! over a cohort of pages independently of the others. When fewer pairs
//! qualify than the method requires, the outcome is
//! [`AnchorOutcome::Inadequate`] instead of a score.
//!
//! ```
//! use scriptorium_anchors::{AnchorConfig, AnchorEngine};
//! use scriptorium_common::RunContext;
//!
//! let engine = AnchorEngine::new(AnchorConfig::default()).unwrap();
//! let result = engine.run(&RunContext::ad_hoc("doc", 1), &[]);
//! assert!(result.outcomes.iter().all(|o| o.outcome.is_inadequate()));
//! ```

pub mod engine;
pub mod method;
pub mod structures;

pub use engine::{
    bootstrap_interval, AnchorConfig, AnchorEngine, AnchorOutcome, AnchorPage, AnchorRun,
    AnchorSummary, MethodOutcome,
};
pub use method::{default_methods, AnchorKind, AnchorMethod, GRID_REGION_METHOD};
pub use structures::{collect_structures, TextStructure};

use scriptorium_common::ScriptoriumError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnchorError {
    #[error("Invalid anchor method {method}: {reason}")]
    InvalidMethod { method: String, reason: String },

    #[error("Anchor method {0} configured twice")]
    DuplicateMethod(String),

    #[error("Invalid anchor configuration: {0}")]
    InvalidConfig(String),
}

impl From<AnchorError> for ScriptoriumError {
    fn from(err: AnchorError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
