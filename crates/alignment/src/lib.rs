//! Cross-modal alignment
//!
//! Image geometry and transcription text meet here:
//!
//! - [`keying`] pairs the line bands of a page with the transcription lines of
//!   its folio, by line number when the counts agree and by position otherwise.
//! - [`word_token`] aligns the words of a line band with the tokens of its
//!   line, allowing 1:1, 1:N and N:1 segments.
//! - [`glyph_symbol`] repeats the alignment at character grain inside each
//!   word segment.
//!
//! Both aligners run the same lattice ([`dp`]). Among minimum-cost paths the
//! one with the most 1:1 segments wins; paths still tied are all returned as
//! a [`Resolution::Ambiguous`](scriptorium_common::Resolution) and every one
//! of them becomes records flagged `ambiguous`.
//!
//! # Example
//!
//! ```
//! use scriptorium_alignment::WordTokenAligner;
//!
//! let aligner = WordTokenAligner::default();
//! let words = [Some(4), Some(8), Some(2)];
//! let tokens = [Some(4), Some(2), Some(6), Some(2)];
//! let alignment = aligner.align_counts(&words, &tokens).unwrap();
//! assert!(!alignment.is_ambiguous());
//! ```

pub mod dp;
pub mod folio;
pub mod glyph_symbol;
pub mod keying;
pub mod word_token;

pub use dp::{Infeasible, Path, SequenceAlignment, Step, COST_EPSILON};
pub use folio::{FolioAligner, FolioAlignment};
pub use glyph_symbol::{GlyphConfig, GlyphResult, GlyphShape, GlyphSymbolAligner};
pub use keying::{key_lines, Keying, LinePair};
pub use word_token::{AlignmentConfig, LineResult, WordTokenAligner};
