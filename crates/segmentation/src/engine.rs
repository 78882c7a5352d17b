//! Projection-profile and connected-component segmentation
//!
//! 1. **Line bands**: rows whose ink falls below a fraction of the densest row
//!    are troughs; the runs between them are bands, grown over faint rows.
//! 2. **Words**: inside a band, runs of blank columns at least as wide as the
//!    word gap separate words.
//! 3. **Glyph candidates**: 8-connected ink components inside a word, with
//!    horizontally stacked pieces unified and sub-threshold specks logged.
//! 4. **Multiplicity**: glyphs much wider than the page median are flagged as
//!    merged ink instead of being split.

// Pixel coordinates and counts fit in u32; page-scale ratios fit in f64
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

use crate::config::SegmentationConfig;
use crate::hierarchy::{
    GlyphCandidate, LineGeometry, PageGeometry, PixelFeatures, Segmentation, WordGeometry,
};
use crate::ink::{components, load_page, InkMask};
use crate::SegmentationError;
use image::DynamicImage;
use scriptorium_common::{AnomalyLog, GeometryAnomaly, GeometryIssue, PixelBox};
use std::path::Path;
use tracing::{debug, info};

/// Runs of non-blank entries separated by at least `gap` blank entries
fn ink_runs(profile: &[u32], gap: u32) -> Vec<(u32, u32)> {
    let mut runs = Vec::new();
    let mut start: Option<u32> = None;
    let mut last_ink = 0u32;
    for (i, &count) in profile.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let i = i as u32;
        match start {
            None => start = Some(i),
            Some(s) if i - last_ink - 1 >= gap => {
                runs.push((s, last_ink + 1));
                start = Some(i);
            }
            Some(_) => {}
        }
        last_ink = i;
    }
    if let Some(s) = start {
        runs.push((s, last_ink + 1));
    }
    runs
}

/// First and one-past-last non-blank index
fn ink_span(profile: &[u32]) -> Option<(u32, u32)> {
    let first = profile.iter().position(|&c| c > 0)?;
    let last = profile.iter().rposition(|&c| c > 0)?;
    Some((first as u32, last as u32 + 1))
}

/// Page segmenter
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    config: SegmentationConfig,
}

impl Segmenter {
    #[must_use]
    pub const fn new(config: SegmentationConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Load, binarize and segment a page scan
    ///
    /// # Errors
    ///
    /// Returns an error if the image is missing or cannot be decoded. No
    /// placeholder geometry is produced for such a page.
    pub fn segment_path(
        &self,
        path: &Path,
        folio: &str,
    ) -> Result<(InkMask, Segmentation), SegmentationError> {
        let image = load_page(path)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(SegmentationError::EmptyImage {
                path: path.display().to_string(),
            });
        }
        Ok(self.segment_image(&image, folio))
    }

    /// Binarize and segment an already decoded page
    #[must_use]
    pub fn segment_image(&self, image: &DynamicImage, folio: &str) -> (InkMask, Segmentation) {
        let mask = InkMask::from_image(image, self.config.ink_threshold);
        let segmentation = self.segment(&mask, folio);
        (mask, segmentation)
    }

    /// Segment a binarized page
    #[must_use]
    pub fn segment(&self, mask: &InkMask, folio: &str) -> Segmentation {
        let page = PageGeometry {
            folio: folio.to_string(),
            width: mask.width(),
            height: mask.height(),
        };
        let mut anomalies = AnomalyLog::new();

        let bands = self.line_bands(mask, folio, &mut anomalies);
        let mut lines: Vec<LineGeometry> = Vec::with_capacity(bands.len());
        for (y0, y1) in bands {
            let line_index = lines.len();
            let words = self.words_in_band(mask, y0, y1, line_index, folio, &mut anomalies);
            let Some(bbox) = words.iter().map(|w| w.bbox).reduce(|a, b| a.union(&b)) else {
                debug!("{folio}: band {y0}..{y1} held only noise");
                continue;
            };
            lines.push(LineGeometry {
                index: line_index,
                bbox,
                words,
            });
        }

        let median_glyph_width = self.mark_merged(&mut lines);
        for word in lines.iter_mut().flat_map(|l| l.words.iter_mut()) {
            word.features = word_features(mask, word);
        }

        let segmentation = Segmentation {
            page,
            lines,
            median_glyph_width,
            anomalies,
        };
        info!(
            "Segmented {}: {} lines, {} words, {} glyphs, {} anomalies",
            folio,
            segmentation.lines.len(),
            segmentation.word_count(),
            segmentation.glyph_count(),
            segmentation.anomalies.len()
        );
        segmentation
    }

    /// Row ranges of text lines, top to bottom
    fn line_bands(
        &self,
        mask: &InkMask,
        folio: &str,
        anomalies: &mut AnomalyLog,
    ) -> Vec<(u32, u32)> {
        let height = mask.height();
        let rows = mask.row_profile(0, mask.width(), 0, height);
        let max_row = rows.iter().copied().max().unwrap_or(0);
        if max_row == 0 {
            anomalies.push(GeometryAnomaly {
                folio: folio.to_string(),
                issue: GeometryIssue::EmptyPage,
                bbox: None,
                detail: "page holds no ink".to_string(),
            });
            return Vec::new();
        }

        let floor = ((f64::from(max_row) * self.config.line_trough_ratio).ceil() as u32).max(1);
        let mut core = Vec::new();
        let mut start: Option<u32> = None;
        for (y, &count) in rows.iter().enumerate() {
            let y = y as u32;
            match (start, count >= floor) {
                (None, true) => start = Some(y),
                (Some(s), false) => {
                    core.push((s, y));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            core.push((s, height));
        }

        // Grow each band over faint rows (ascenders, descenders) up to its neighbours
        let mut grown: Vec<(u32, u32)> = Vec::with_capacity(core.len());
        for (i, &(y0, y1)) in core.iter().enumerate() {
            let lower_limit = grown.last().map_or(0, |b| b.1);
            let upper_limit = core.get(i + 1).map_or(height, |b| b.0);
            let mut a = y0;
            while a > lower_limit && rows[(a - 1) as usize] > 0 {
                a -= 1;
            }
            let mut b = y1;
            while b < upper_limit && rows[b as usize] > 0 {
                b += 1;
            }
            grown.push((a, b));
        }

        grown
            .into_iter()
            .filter(|&(y0, y1)| {
                if y1 - y0 >= self.config.min_line_height {
                    return true;
                }
                let columns = mask.column_profile(0, mask.width(), y0, y1);
                let bbox = ink_span(&columns)
                    .map(|(x0, x1)| PixelBox::from_extents(x0, y0, x1, y1));
                anomalies.push(GeometryAnomaly {
                    folio: folio.to_string(),
                    issue: GeometryIssue::ShortBand,
                    bbox,
                    detail: format!(
                        "band of {} rows below minimum line height {}",
                        y1 - y0,
                        self.config.min_line_height
                    ),
                });
                false
            })
            .collect()
    }

    fn words_in_band(
        &self,
        mask: &InkMask,
        y0: u32,
        y1: u32,
        line_index: usize,
        folio: &str,
        anomalies: &mut AnomalyLog,
    ) -> Vec<WordGeometry> {
        let columns = mask.column_profile(0, mask.width(), y0, y1);
        let gap = self.config.word_gap(y1 - y0);
        let mut words = Vec::new();
        for (x0, x1) in ink_runs(&columns, gap) {
            let rows = mask.row_profile(x0, x1, y0, y1);
            let Some((top, bottom)) = ink_span(&rows) else {
                continue;
            };
            let bbox = PixelBox::from_extents(x0, y0 + top, x1, y0 + bottom);
            let glyphs = self.glyphs_in_word(mask, &bbox, folio, anomalies);
            if glyphs.is_empty() {
                continue;
            }
            words.push(WordGeometry {
                line_index,
                index: words.len(),
                bbox,
                features: PixelFeatures::default(),
                glyphs,
            });
        }
        words
    }

    fn glyphs_in_word(
        &self,
        mask: &InkMask,
        word: &PixelBox,
        folio: &str,
        anomalies: &mut AnomalyLog,
    ) -> Vec<GlyphCandidate> {
        let crop = mask.crop(word);
        let found = components(&crop, &crop);

        let mut kept: Vec<(PixelBox, u64)> = Vec::with_capacity(found.len());
        for component in found {
            let local = component.bbox;
            let bbox = PixelBox::new(word.x + local.x, word.y + local.y, local.width, local.height);
            if component.pixels < self.config.min_glyph_area {
                anomalies.push(GeometryAnomaly {
                    folio: folio.to_string(),
                    issue: GeometryIssue::NoiseSpeck,
                    bbox: Some(bbox),
                    detail: format!(
                        "{} ink pixels below minimum glyph area {}",
                        component.pixels, self.config.min_glyph_area
                    ),
                });
                continue;
            }
            kept.push((bbox, component.pixels));
        }
        kept.sort_by_key(|(b, _)| (b.x, b.y));

        let mut unified: Vec<(PixelBox, u64)> = Vec::with_capacity(kept.len());
        for (bbox, pixels) in kept {
            if let Some(last) = unified.last_mut() {
                let overlap = f64::from(last.0.horizontal_overlap(&bbox));
                let narrower = f64::from(last.0.width.min(bbox.width));
                if overlap >= self.config.stack_overlap_ratio * narrower {
                    last.0 = last.0.union(&bbox);
                    last.1 += pixels;
                    continue;
                }
            }
            unified.push((bbox, pixels));
        }

        unified
            .into_iter()
            .enumerate()
            .map(|(index, (bbox, ink_pixels))| GlyphCandidate {
                index,
                bbox,
                ink_pixels,
                multiplicity: 1,
                merged: false,
            })
            .collect()
    }

    /// Flag glyphs much wider than the page median; returns the median
    fn mark_merged(&self, lines: &mut [LineGeometry]) -> Option<f64> {
        let mut widths: Vec<u32> = lines
            .iter()
            .flat_map(|l| l.words.iter())
            .flat_map(|w| w.glyphs.iter())
            .map(|g| g.bbox.width)
            .collect();
        if widths.is_empty() {
            return None;
        }
        widths.sort_unstable();
        let mid = widths.len() / 2;
        let median = if widths.len() % 2 == 0 {
            f64::from(widths[mid - 1] + widths[mid]) / 2.0
        } else {
            f64::from(widths[mid])
        };

        for glyph in lines
            .iter_mut()
            .flat_map(|l| l.words.iter_mut())
            .flat_map(|w| w.glyphs.iter_mut())
        {
            let relative = f64::from(glyph.bbox.width) / median;
            if relative > self.config.merged_width_ratio {
                glyph.multiplicity = (relative.round() as u32).max(2);
                glyph.merged = true;
            }
        }
        Some(median)
    }
}

fn word_features(mask: &InkMask, word: &WordGeometry) -> PixelFeatures {
    let ink_pixels = mask.count_in(&word.bbox);
    let area = word.bbox.area();
    PixelFeatures {
        ink_pixels,
        ink_density: if area == 0 {
            0.0
        } else {
            ink_pixels as f64 / area as f64
        },
        aspect_ratio: if word.bbox.height == 0 {
            0.0
        } else {
            f64::from(word.bbox.width) / f64::from(word.bbox.height)
        },
        glyph_count: word.glyphs.len(),
        estimated_symbols: word.glyphs.iter().map(|g| g.multiplicity).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::PageCanvas;
    use scriptorium_common::AnomalyKind;

    const GLYPH_H: u32 = 10;

    /// Two lines of three 3-glyph words
    fn two_line_page() -> PageCanvas {
        let mut canvas = PageCanvas::new(120, 50);
        for y in [5, 30] {
            for x in [5, 35, 65] {
                canvas = canvas.word(x, y, &[4, 4, 4], GLYPH_H, 2);
            }
        }
        canvas
    }

    fn segment(canvas: PageCanvas) -> Segmentation {
        let mask = InkMask::from_image(&canvas.into_image(), Some(128));
        Segmenter::default().segment(&mask, "f1r")
    }

    #[test]
    fn test_ink_runs_split_on_gap() {
        let profile = [0, 2, 2, 0, 3, 0, 0, 0, 1, 1];
        assert_eq!(ink_runs(&profile, 3), vec![(1, 5), (8, 10)]);
        assert_eq!(ink_runs(&profile, 1), vec![(1, 3), (4, 5), (8, 10)]);
        assert!(ink_runs(&[0, 0], 1).is_empty());
    }

    #[test]
    fn test_hierarchy_of_regular_page() {
        let seg = segment(two_line_page());
        assert_eq!(seg.lines.len(), 2);
        for (i, line) in seg.lines.iter().enumerate() {
            assert_eq!(line.index, i);
            assert_eq!(line.words.len(), 3);
            for (j, word) in line.words.iter().enumerate() {
                assert_eq!(word.index, j);
                assert_eq!(word.line_index, i);
                assert_eq!(word.glyphs.len(), 3);
                assert_eq!(word.features.estimated_symbols, 3);
                assert_eq!(word.bbox.width, PageCanvas::word_width(&[4, 4, 4], 2));
                assert_eq!(word.bbox.height, GLYPH_H);
            }
        }
        assert_eq!(seg.lines[0].words[1].bbox.x, 35);
        assert_eq!(seg.lines[1].bbox.y, 30);
        assert_eq!(seg.median_glyph_width, Some(4.0));
        assert!(seg.anomalies.is_empty());
    }

    #[test]
    fn test_noise_speck_logged_not_kept() {
        let seg = segment(two_line_page().fill_rect(27, 8, 1, 2));
        assert_eq!(seg.lines[0].words.len(), 3);
        let geometry: Vec<_> = seg.anomalies.of_kind(AnomalyKind::Geometry).collect();
        assert_eq!(geometry.len(), 1);
        match geometry[0] {
            scriptorium_common::Anomaly::Geometry(g) => {
                assert_eq!(g.issue, GeometryIssue::NoiseSpeck);
                assert_eq!(g.bbox, Some(PixelBox::new(27, 8, 1, 2)));
            }
            other => panic!("unexpected anomaly {other:?}"),
        }
    }

    #[test]
    fn test_wide_glyph_flagged_merged() {
        let canvas = PageCanvas::new(120, 30)
            .word(5, 5, &[4, 4, 4], GLYPH_H, 2)
            .word(35, 5, &[4, 9, 4], GLYPH_H, 2)
            .word(70, 5, &[4, 4], GLYPH_H, 2);
        let seg = segment(canvas);
        let word = &seg.lines[0].words[1];
        assert_eq!(word.glyphs.len(), 3);
        assert!(word.glyphs[1].merged);
        assert_eq!(word.glyphs[1].multiplicity, 2);
        assert!(!word.glyphs[0].merged);
        assert_eq!(word.features.estimated_symbols, 4);
    }

    #[test]
    fn test_stacked_components_unified() {
        // Glyph body at rows 9..15 with a dot above it at rows 5..8
        let canvas = PageCanvas::new(80, 30)
            .word(5, 5, &[4, 4], GLYPH_H, 2)
            .fill_rect(17, 9, 4, 6)
            .fill_rect(18, 5, 2, 3);
        let seg = segment(canvas);
        let word = &seg.lines[0].words[0];
        assert_eq!(word.glyphs.len(), 3);
        assert_eq!(word.glyphs[2].bbox, PixelBox::new(17, 5, 4, 10));
        assert_eq!(word.glyphs[2].ink_pixels, 30);
    }

    #[test]
    fn test_short_band_logged() {
        let seg = segment(two_line_page().fill_rect(5, 46, 100, 2));
        assert_eq!(seg.lines.len(), 2);
        let issues: Vec<_> = seg
            .anomalies
            .iter()
            .filter_map(|a| match a {
                scriptorium_common::Anomaly::Geometry(g) => Some(g.issue),
                _ => None,
            })
            .collect();
        assert_eq!(issues, vec![GeometryIssue::ShortBand]);
    }

    #[test]
    fn test_empty_page_logged() {
        let seg = segment(PageCanvas::new(40, 40));
        assert!(seg.lines.is_empty());
        assert_eq!(seg.median_glyph_width, None);
        assert_eq!(seg.anomalies.of_kind(AnomalyKind::Geometry).count(), 1);
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let a = segment(two_line_page());
        let b = segment(two_line_page());
        assert_eq!(a, b);
    }
}
