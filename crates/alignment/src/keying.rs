//! Pairing image line bands with transcription lines of one folio

use scriptorium_common::{AlignmentMismatch, MismatchReason};
use scriptorium_segmentation::LineGeometry;
use scriptorium_transliteration::ParsedLine;
use tracing::warn;

/// An image line band and the transcription line it was keyed to
#[derive(Debug, Clone, Copy)]
pub struct LinePair<'a> {
    pub image: &'a LineGeometry,
    pub text: &'a ParsedLine,
}

/// Outcome of keying one folio
#[derive(Debug, Clone, Default)]
pub struct Keying<'a> {
    pub pairs: Vec<LinePair<'a>>,
    pub mismatches: Vec<AlignmentMismatch>,
    /// Lines were paired by position rather than by line number
    pub rekeyed: bool,
}

/// Key image lines to transcription lines
///
/// Line number `n` goes with the `n`-th band from the top when both sides
/// have the same count and the transcription numbers its lines `1..=n`.
/// Otherwise a `LineCount` mismatch is recorded, lines are paired by
/// position, and each line left over on either side is reported on its own.
/// For an unpaired image line `line_number` is the band's 1-based position.
#[must_use]
pub fn key_lines<'a>(
    folio: &str,
    image: &'a [LineGeometry],
    text: &[&'a ParsedLine],
) -> Keying<'a> {
    let numbered = image.len() == text.len()
        && text
            .iter()
            .enumerate()
            .all(|(i, line)| line.line_number == i + 1);

    if numbered {
        let pairs = text
            .iter()
            .filter_map(|&line| {
                image
                    .get(line.line_number - 1)
                    .map(|band| LinePair { image: band, text: line })
            })
            .collect();
        return Keying {
            pairs,
            mismatches: Vec::new(),
            rekeyed: false,
        };
    }

    warn!(
        "{}: {} image lines vs {} transcription lines, re-keying by position",
        folio,
        image.len(),
        text.len()
    );
    let mismatch = |line_number, reason| AlignmentMismatch {
        folio: folio.to_string(),
        line_number,
        reason,
        image_count: image.len(),
        text_count: text.len(),
    };

    let mut mismatches = vec![mismatch(None, MismatchReason::LineCount)];
    let pairs = image
        .iter()
        .zip(text.iter())
        .map(|(band, &line)| LinePair { image: band, text: line })
        .collect();
    mismatches.extend(
        image
            .iter()
            .skip(text.len())
            .map(|band| mismatch(Some(band.index + 1), MismatchReason::UnpairedImageLine)),
    );
    mismatches.extend(
        text.iter()
            .skip(image.len())
            .map(|line| mismatch(Some(line.line_number), MismatchReason::UnpairedTextLine)),
    );

    Keying {
        pairs,
        mismatches,
        rekeyed: true,
    }
}
