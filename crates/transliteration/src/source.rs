//! Restartable, lazy iteration over a loaded transliteration file

use crate::parser::{parse_line, FolioHeader, LineOutcome, ParsedLine};
use crate::TransliterationError;
use scriptorium_common::{AnomalyLog, ParseAnomaly};
use std::path::Path;
use tracing::{debug, info};

/// One meaningful entry of the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Line(ParsedLine),
    Header(FolioHeader),
    Anomaly(ParseAnomaly),
}

/// A transliteration file held in memory
///
/// Loading is the only fallible step. Every call to [`lines`](Self::lines) or
/// [`entries`](Self::entries) starts a fresh pass, and two passes yield
/// identical output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransliterationSource {
    name: String,
    text: String,
}

impl TransliterationSource {
    /// Load a file from disk
    ///
    /// # Errors
    ///
    /// Returns [`TransliterationError::Io`] if the file cannot be read.
    pub fn from_path(path: &Path) -> Result<Self, TransliterationError> {
        let text = std::fs::read_to_string(path).map_err(|source| TransliterationError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        info!("Loaded transliteration {} ({} bytes)", name, text.len());
        Ok(Self { name, text })
    }

    /// Wrap text already in memory
    #[must_use]
    pub fn from_string(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lazily yield every line, header and anomaly in file order
    #[must_use]
    pub fn entries(&self) -> Entries<'_> {
        Entries {
            source: &self.name,
            lines: self.text.lines().enumerate(),
        }
    }

    /// Lazily yield parsed lines; malformed lines come through as `Err`
    pub fn lines(&self) -> impl Iterator<Item = Result<ParsedLine, ParseAnomaly>> + '_ {
        self.entries().filter_map(|entry| match entry {
            Entry::Line(line) => Some(Ok(line)),
            Entry::Anomaly(anomaly) => Some(Err(anomaly)),
            Entry::Header(_) => None,
        })
    }

    /// Run a full pass and collect the results
    #[must_use]
    pub fn parse(&self) -> ParseOutput {
        let mut output = ParseOutput::default();
        for entry in self.entries() {
            match entry {
                Entry::Line(line) => output.lines.push(line),
                Entry::Header(header) => output.headers.push(header),
                Entry::Anomaly(anomaly) => output.anomalies.push(anomaly),
            }
        }
        info!(
            "Parsed {}: {} lines, {} folio headers, {} anomalies",
            self.name,
            output.lines.len(),
            output.headers.len(),
            output.anomalies.len()
        );
        output
    }
}

/// Iterator returned by [`TransliterationSource::entries`]
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    source: &'a str,
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl Iterator for Entries<'_> {
    type Item = Entry;

    fn next(&mut self) -> Option<Self::Item> {
        for (index, raw) in self.lines.by_ref() {
            let source_line = index + 1;
            match parse_line(raw, source_line) {
                LineOutcome::Skip => {}
                LineOutcome::Header(header) => return Some(Entry::Header(header)),
                LineOutcome::Line(line) => {
                    debug!(
                        "{}.{}: {} tokens",
                        line.folio,
                        line.line_number,
                        line.tokens.len()
                    );
                    return Some(Entry::Line(line));
                }
                LineOutcome::Malformed(reason) => {
                    return Some(Entry::Anomaly(ParseAnomaly {
                        source: self.source.to_string(),
                        line_number: source_line,
                        raw: raw.to_string(),
                        reason,
                    }));
                }
            }
        }
        None
    }
}

/// Everything one pass over a file produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutput {
    pub lines: Vec<ParsedLine>,
    pub headers: Vec<FolioHeader>,
    pub anomalies: AnomalyLog,
}

impl ParseOutput {
    /// Lines of one folio in file order
    pub fn folio_lines<'a>(&'a self, folio: &'a str) -> impl Iterator<Item = &'a ParsedLine> {
        self.lines.iter().filter(move |l| l.folio == folio)
    }

    /// Distinct folio ids in order of first appearance
    #[must_use]
    pub fn folios(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for line in &self.lines {
            if !seen.contains(&line.folio.as_str()) {
                seen.push(line.folio.as_str());
            }
        }
        seen
    }

    #[must_use]
    pub fn header(&self, folio: &str) -> Option<&FolioHeader> {
        self.headers.iter().find(|h| h.folio == folio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# sample
<f1r>      <! $I=H>
<f1r.1,@P0>       fachys.ykal.ar
<f1r.2,+P0>       sory.ckhar
<f1v.1,@P0>       kchsy.chadaiin=
";

    #[test]
    fn test_parse_collects_everything() {
        let source = TransliterationSource::from_string("sample.txt", SAMPLE);
        let output = source.parse();
        assert_eq!(output.lines.len(), 3);
        assert_eq!(output.headers.len(), 1);
        assert!(output.anomalies.is_empty());
        assert_eq!(output.folios(), vec!["f1r", "f1v"]);
        assert_eq!(output.folio_lines("f1r").count(), 2);
        assert_eq!(output.header("f1r").map(|h| h.attributes.len()), Some(1));
    }

    #[test]
    fn test_lines_skip_headers() {
        let source = TransliterationSource::from_string("sample.txt", SAMPLE);
        let lines: Vec<_> = source.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(Result::is_ok));
    }

    #[test]
    fn test_source_line_numbers() {
        let source = TransliterationSource::from_string("sample.txt", SAMPLE);
        let output = source.parse();
        assert_eq!(output.lines[0].source_line, 3);
        assert_eq!(output.lines[2].source_line, 5);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TransliterationSource::from_path(Path::new("/nonexistent/ivtff.txt"))
            .expect_err("missing file must fail");
        assert!(matches!(err, TransliterationError::Io { .. }));
    }
}
