//! Page discovery and the per-page processing unit

use scriptorium_alignment::{FolioAligner, FolioAlignment};
use scriptorium_anchors::{collect_structures, TextStructure};
use scriptorium_common::{AnomalyLog, RunContext};
use scriptorium_regions::{RegionDetector, RegionInput, RegionSet};
use scriptorium_segmentation::{Segmentation, SegmentationError, Segmenter};
use scriptorium_transliteration::ParsedLine;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Raster formats picked up from a page directory
pub const PAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// One page scan and the folio it shows
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PageInput {
    pub folio: String,
    pub path: PathBuf,
}

impl PageInput {
    /// Folio id taken from the file stem (`scans/f1r.png` → `f1r`)
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let folio = path.file_stem()?.to_str()?.to_string();
        Some(Self { folio, path })
    }
}

fn is_page_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| PAGE_EXTENSIONS.iter().any(|known| e.eq_ignore_ascii_case(known)))
}

/// Page scans of a directory, sorted by folio id
///
/// When two files share a stem the first path in sort order wins.
///
/// # Errors
///
/// Returns an error when the directory cannot be read.
pub fn discover_pages(dir: &Path) -> std::io::Result<Vec<PageInput>> {
    let mut pages = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_page_file(&path) {
            if let Some(page) = PageInput::from_path(path) {
                pages.push(page);
            }
        }
    }
    pages.sort();
    pages.dedup_by(|later, kept| {
        let duplicate = later.folio == kept.folio;
        if duplicate {
            warn!(
                "Ignoring {}: folio {} already has {}",
                later.path.display(),
                kept.folio,
                kept.path.display()
            );
        }
        duplicate
    });
    debug!("Discovered {} pages in {}", pages.len(), dir.display());
    Ok(pages)
}

/// Everything one page unit produced
#[derive(Debug, Clone)]
pub struct PageOutput {
    pub segmentation: Segmentation,
    pub regions: RegionSet,
    pub alignment: FolioAlignment,
    pub structures: Vec<TextStructure>,
}

impl PageOutput {
    #[must_use]
    pub fn folio(&self) -> &str {
        &self.segmentation.page.folio
    }

    /// Segmentation anomalies followed by alignment anomalies
    #[must_use]
    pub fn anomalies(&self) -> AnomalyLog {
        let mut log = self.segmentation.anomalies.clone();
        log.append(&mut self.alignment.anomalies.clone());
        log
    }
}

/// Engines shared read-only by every page unit
#[derive(Debug)]
pub struct PageUnit<'a> {
    pub segmenter: &'a Segmenter,
    pub detector: &'a RegionDetector,
    pub aligner: &'a FolioAligner,
}

impl PageUnit<'_> {
    /// Segment, detect regions and align one page
    ///
    /// # Errors
    ///
    /// Returns an error when the page image cannot be loaded.
    pub fn process(
        &self,
        run: &RunContext,
        page: &PageInput,
        text: &[&ParsedLine],
    ) -> Result<PageOutput, SegmentationError> {
        let (mask, segmentation) = self.segmenter.segment_path(&page.path, &page.folio)?;
        let regions = self
            .detector
            .detect(run, &RegionInput::from_segmentation(&segmentation, &mask));
        let alignment = self.aligner.align(run, &segmentation, text);
        let structures = collect_structures(&segmentation, &alignment.lines, &alignment.words);

        info!(
            "Processed {}: {} lines, {} words, {} regions, {} word alignments",
            page.folio,
            segmentation.lines.len(),
            segmentation.word_count(),
            regions.regions.len(),
            alignment.words.len()
        );
        Ok(PageOutput {
            segmentation,
            regions,
            alignment,
            structures,
        })
    }
}
