//! Transliteration parser
//!
//! Parses a line-oriented transcription file into ordered token sequences,
//! one [`ParsedLine`] per manuscript line.
//!
//! # Features
//! - Lazy and restartable: each pass over a [`TransliterationSource`] is a new iterator
//! - Deterministic: two passes over the same text yield identical output
//! - Alternate readings are kept as explicit [`Symbol::Choice`] positions
//! - A malformed line becomes a [`ParseAnomaly`] and parsing carries on
//!
//! # Example
//! ```
//! use scriptorium_transliteration::TransliterationSource;
//!
//! let source = TransliterationSource::from_string(
//!     "sample.txt",
//!     "<f1r.1,@P0> fachys.ykal.ar\n<f1r.x,@P0> broken\n",
//! );
//! let output = source.parse();
//! assert_eq!(output.lines.len(), 1);
//! assert_eq!(output.anomalies.len(), 1);
//! ```

mod parser;
mod source;
mod token;

pub use parser::{FolioHeader, ParsedLine};
pub use scriptorium_common::ParseAnomaly;
pub use source::{Entries, Entry, ParseOutput, TransliterationSource};
pub use token::{Symbol, Token, TokenKind};

use scriptorium_common::ScriptoriumError;
use thiserror::Error;

/// Errors that stop a file from being parsed at all
#[derive(Error, Debug)]
pub enum TransliterationError {
    #[error("Failed to read transliteration {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<TransliterationError> for ScriptoriumError {
    fn from(err: TransliterationError) -> Self {
        match err {
            TransliterationError::Io { source, .. } => Self::IoError(source),
        }
    }
}
