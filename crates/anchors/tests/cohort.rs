//! Anchoring aligned text to detected regions across a cohort of pages

use scriptorium_alignment::FolioAligner;
use scriptorium_anchors::{
    collect_structures, AnchorConfig, AnchorEngine, AnchorKind, AnchorMethod, AnchorOutcome,
    AnchorPage, TextStructure,
};
use scriptorium_common::{AnomalyKind, Region, RunContext};
use scriptorium_regions::{GridMethod, RegionDetector, RegionInput};
use scriptorium_segmentation::{PageCanvas, Segmentation, Segmenter};
use scriptorium_transliteration::{ParsedLine, TransliterationSource};

struct Folio {
    segmentation: Segmentation,
    structures: Vec<TextStructure>,
    regions: Vec<Region>,
}

impl Folio {
    fn page(&self) -> AnchorPage<'_> {
        AnchorPage {
            page: &self.segmentation.page,
            structures: &self.structures,
            regions: &self.regions,
        }
    }
}

/// Two lines of two words each, aligned and split into a 2x2 grid
fn folio(name: &str, run: &RunContext) -> Folio {
    let image = PageCanvas::new(200, 100)
        .word(10, 10, &[5, 5, 5], 12, 2)
        .word(40, 10, &[5, 5, 5, 5], 12, 2)
        .word(10, 60, &[5, 5], 12, 2)
        .word(40, 60, &[5, 5], 12, 2)
        .into_image();
    let (mask, segmentation) = Segmenter::default().segment_image(&image, name);

    let text = format!("<{name}.1,@P0> dal.chol\n<{name}.2,@P0> ar.ol\n");
    let lines = TransliterationSource::from_string("cohort.txt", &text).parse().lines;
    let refs: Vec<&ParsedLine> = lines.iter().collect();
    let aligned = FolioAligner::default().align(run, &segmentation, &refs);
    let structures = collect_structures(&segmentation, &aligned.lines, &aligned.words);

    let regions = RegionDetector::new()
        .with_method(GridMethod::new(2, 2).unwrap())
        .detect(run, &RegionInput::from_segmentation(&segmentation, &mask))
        .regions;

    Folio {
        segmentation,
        structures,
        regions,
    }
}

fn grid_engine(min_samples: usize) -> AnchorEngine {
    AnchorEngine::new(AnchorConfig {
        methods: vec![AnchorMethod::new("grid-cell-v1", AnchorKind::GridCell, min_samples).unwrap()],
        ..AnchorConfig::default()
    })
    .unwrap()
}

#[test]
fn test_structures_cover_words_and_lines() {
    let run = RunContext::ad_hoc("cohort", 5);
    let folio = folio("f1r", &run);
    assert_eq!(folio.structures.len(), 6);
    assert_eq!(folio.regions.len(), 4);
}

#[test]
fn test_small_cohort_is_inadequate_not_scored() {
    let run = RunContext::ad_hoc("cohort", 5);
    let one = folio("f1r", &run);

    let result = grid_engine(1000).run(&run, &[one.page()]);
    match result.outcome("grid-cell-v1").unwrap() {
        AnchorOutcome::Inadequate(failure) => {
            assert!(failure.samples > 0);
            assert_eq!(failure.required, 1000);
        }
        AnchorOutcome::Scored { .. } => panic!("expected an inadequate outcome"),
    }
    assert_eq!(result.anomalies.of_kind(AnomalyKind::Adequacy).count(), 1);
    assert_eq!(result.anchors().count(), 0);
}

#[test]
fn test_samples_pool_across_the_cohort() {
    let run = RunContext::ad_hoc("cohort", 5);
    let first = folio("f1r", &run);
    let second = folio("f1v", &run);

    let single = grid_engine(1000).run(&run, &[first.page()]);
    let per_page = match single.outcome("grid-cell-v1").unwrap() {
        AnchorOutcome::Inadequate(failure) => failure.samples,
        AnchorOutcome::Scored { .. } => panic!("expected an inadequate outcome"),
    };

    let engine = grid_engine(per_page + 1);
    assert!(engine.run(&run, &[first.page()]).outcomes[0].outcome.is_inadequate());

    let both = engine.run(&run, &[first.page(), second.page()]);
    match both.outcome("grid-cell-v1").unwrap() {
        AnchorOutcome::Scored { anchors, summary } => {
            assert_eq!(anchors.len(), 2 * per_page);
            assert_eq!(summary.samples, 2 * per_page);
            assert!(summary.ci_low <= summary.mean && summary.mean <= summary.ci_high);
            assert!(anchors.iter().all(|a| a.score > 0.0 && a.score <= 1.0));
            assert_eq!(summary.seed, 5);
        }
        AnchorOutcome::Inadequate(_) => panic!("expected a scored outcome"),
    }
    assert!(both.anomalies.is_empty());
}

#[test]
fn test_rerun_reproduces_anchors_and_interval() {
    let run = RunContext::ad_hoc("cohort", 9);
    let first = folio("f1r", &run);
    let engine = grid_engine(1);

    let a = engine.run(&run, &[first.page()]);
    let b = engine.run(&run, &[first.page()]);
    assert_eq!(a.outcomes, b.outcomes);
}
