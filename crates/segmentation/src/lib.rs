//! Page image segmentation
//!
//! Turns a page scan into a geometric hierarchy of line bands, word boxes and
//! glyph candidates, with no knowledge of the transliteration.
//!
//! # Example
//!
//! ```
//! use scriptorium_segmentation::{InkMask, PageCanvas, Segmenter};
//!
//! let page = PageCanvas::new(80, 30)
//!     .word(5, 5, &[4, 4, 4], 10, 2)
//!     .word(40, 5, &[4, 4], 10, 2)
//!     .into_image();
//! let mask = InkMask::from_image(&page, Some(128));
//! let segmentation = Segmenter::default().segment(&mask, "f1r");
//!
//! assert_eq!(segmentation.lines.len(), 1);
//! assert_eq!(segmentation.word_count(), 2);
//! assert_eq!(segmentation.glyph_count(), 5);
//! ```

pub mod config;
pub mod engine;
pub mod hierarchy;
pub mod ink;
pub mod raster;

pub use config::SegmentationConfig;
pub use engine::Segmenter;
pub use hierarchy::{
    GlyphCandidate, LineGeometry, PageGeometry, PixelFeatures, Segmentation, WordGeometry,
};
pub use ink::{components, load_page, Component, InkMask, INK};
pub use raster::PageCanvas;

use scriptorium_common::ScriptoriumError;
use thiserror::Error;

/// Errors loading a page for segmentation
#[derive(Error, Debug)]
pub enum SegmentationError {
    #[error("Failed to read page image {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode page image {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Page image {path} has no pixels")]
    EmptyImage { path: String },
}

impl SegmentationError {
    /// Path of the page that failed
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Io { path, .. } | Self::Decode { path, .. } | Self::EmptyImage { path } => path,
        }
    }
}

impl From<SegmentationError> for ScriptoriumError {
    fn from(err: SegmentationError) -> Self {
        match err {
            SegmentationError::Io { source, .. } => Self::IoError(source),
            SegmentationError::Decode { .. } | SegmentationError::EmptyImage { .. } => {
                Self::ImageError(err.to_string())
            }
        }
    }
}
