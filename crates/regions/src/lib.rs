//! Spatial region detection
//!
//! Each [`RegionMethod`] cuts a page into zones and links them into an
//! adjacency graph. Two methods ship with the crate:
//!
//! - [`GridMethod`] (`grid`): a fixed `rows` x `cols` partition, edges weighted
//!   by shared boundary length.
//! - [`ComponentMethod`] (`blob`): dilated ink components, edges weighted by
//!   center distance over the page diagonal.
//!
//! Region ids include the method, its parameters and the run's config digest,
//! so regions of different methods or configurations never collide.

pub mod blob;
pub mod detector;
pub mod features;
pub mod grid;
pub mod input;
pub mod method;

pub use blob::{ComponentMethod, BLOB_METHOD};
pub use detector::{RegionConfig, RegionDetector, RegionSet};
pub use features::measure;
pub use grid::{GridMethod, GRID_METHOD};
pub use input::RegionInput;
pub use method::{Adjacency, RegionMethod};

use scriptorium_common::ScriptoriumError;
use thiserror::Error;

/// Region detector errors
#[derive(Error, Debug)]
pub enum RegionError {
    #[error("Invalid {method} region method: {reason}")]
    InvalidMethod { method: String, reason: String },
}

impl From<RegionError> for ScriptoriumError {
    fn from(err: RegionError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
