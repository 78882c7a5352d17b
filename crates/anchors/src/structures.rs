//! Text structures an anchor can start from

use scriptorium_common::{AnchorSource, LineKey, PixelBox, WordAlignment};
use scriptorium_segmentation::Segmentation;
use tracing::debug;

/// An aligned word segment or a whole aligned line, placed on the page
#[derive(Debug, Clone, PartialEq)]
pub struct TextStructure {
    pub folio: String,
    pub source: AnchorSource,
    pub bbox: PixelBox,
}

impl TextStructure {
    /// Key of the source inside its folio, stable across runs
    #[must_use]
    pub fn key(&self) -> String {
        match &self.source {
            AnchorSource::Line { line_number } => format!("line:{line_number}"),
            AnchorSource::Word {
                line_number,
                word_indices,
                ..
            } => {
                let words = word_indices
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                format!("word:{line_number}:{words}")
            }
        }
    }
}

/// Collect word and line structures of one page
///
/// Word records from tied candidates are skipped: an ambiguous segment has no
/// single placement to anchor. Every keyed line pair yields a line structure
/// whose box is the image line band, whatever its word alignment came to.
#[must_use]
pub fn collect_structures(
    segmentation: &Segmentation,
    lines: &[LineKey],
    words: &[WordAlignment],
) -> Vec<TextStructure> {
    let folio = segmentation.page.folio.as_str();
    let mut structures = Vec::new();
    let mut skipped = 0usize;

    for record in words.iter().filter(|r| r.folio == folio) {
        if record.ambiguous {
            skipped += 1;
            continue;
        }
        let Some(line) = segmentation.line(record.image_line) else {
            continue;
        };
        let bbox = record
            .word_indices
            .iter()
            .filter_map(|&i| line.words.get(i))
            .map(|w| w.bbox)
            .reduce(|a, b| a.union(&b));
        let Some(bbox) = bbox else {
            continue;
        };
        structures.push(TextStructure {
            folio: folio.to_string(),
            source: AnchorSource::Word {
                line_number: record.line_number,
                word_indices: record.word_indices.clone(),
                text: record.tokens.join("."),
            },
            bbox,
        });
    }

    let mut lines = lines.to_vec();
    lines.sort_unstable();
    lines.dedup();
    for key in lines {
        if let Some(line) = segmentation.line(key.image_line) {
            structures.push(TextStructure {
                folio: folio.to_string(),
                source: AnchorSource::Line {
                    line_number: key.line_number,
                },
                bbox: line.bbox,
            });
        }
    }

    if skipped > 0 {
        debug!("{}: skipped {} ambiguous word segments", folio, skipped);
    }
    structures
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_common::{AnomalyLog, Cardinality};
    use scriptorium_segmentation::{LineGeometry, PageGeometry, PixelFeatures, WordGeometry};

    fn segmentation() -> Segmentation {
        let word = |index, x| WordGeometry {
            line_index: 0,
            index,
            bbox: PixelBox::new(x, 10, 20, 12),
            features: PixelFeatures::default(),
            glyphs: Vec::new(),
        };
        Segmentation {
            page: PageGeometry {
                folio: "f1r".to_string(),
                width: 200,
                height: 100,
            },
            lines: vec![LineGeometry {
                index: 0,
                bbox: PixelBox::new(10, 10, 120, 12),
                words: vec![word(0, 10), word(1, 40), word(2, 70)],
            }],
            median_glyph_width: None,
            anomalies: AnomalyLog::new(),
        }
    }

    fn record(words: Vec<usize>, tokens: &[&str], ambiguous: bool) -> WordAlignment {
        WordAlignment {
            id: format!("w{words:?}"),
            folio: "f1r".to_string(),
            line_number: 1,
            image_line: 0,
            candidate: 0,
            cardinality: Cardinality::classify(words.len(), tokens.len()).unwrap(),
            word_indices: words,
            token_indices: (0..tokens.len()).collect(),
            tokens: tokens.iter().map(ToString::to_string).collect(),
            score: 1.0,
            ambiguous,
        }
    }

    const KEYED: &[LineKey] = &[LineKey {
        line_number: 1,
        image_line: 0,
    }];

    #[test]
    fn test_words_and_line_collected() {
        let records = vec![
            record(vec![0], &["qoke"], false),
            record(vec![1, 2], &["dal"], false),
        ];
        let structures = collect_structures(&segmentation(), KEYED, &records);
        assert_eq!(structures.len(), 3);
        assert_eq!(structures[1].bbox, PixelBox::new(40, 10, 50, 12));
        assert_eq!(structures[1].key(), "word:1:1,2");
        assert_eq!(structures[2].source, AnchorSource::Line { line_number: 1 });
        assert_eq!(structures[2].bbox, PixelBox::new(10, 10, 120, 12));
    }

    #[test]
    fn test_ambiguous_segments_keep_their_line() {
        let records = vec![
            record(vec![0], &["qoke"], true),
            record(vec![1, 2], &["dal"], true),
        ];
        let structures = collect_structures(&segmentation(), KEYED, &records);
        assert_eq!(structures.len(), 1);
        assert_eq!(structures[0].source, AnchorSource::Line { line_number: 1 });
    }

    #[test]
    fn test_keyed_line_without_records() {
        let structures = collect_structures(&segmentation(), KEYED, &[]);
        assert_eq!(structures.len(), 1);
        assert_eq!(structures[0].key(), "line:1");
        assert!(collect_structures(&segmentation(), &[], &[]).is_empty());
    }

    #[test]
    fn test_word_text_joins_tokens() {
        let records = vec![record(vec![1], &["dy", "qokedy"], false)];
        let structures = collect_structures(&segmentation(), KEYED, &records);
        match &structures[0].source {
            AnchorSource::Word { text, .. } => assert_eq!(text, "dy.qokedy"),
            AnchorSource::Line { .. } => panic!("expected a word source"),
        }
    }
}
