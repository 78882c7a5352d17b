//! Whole runs over a directory of synthetic page scans

use scriptorium_anchors::{AnchorConfig, AnchorKind, AnchorMethod};
use scriptorium_common::{Anomaly, AnomalyKind, MismatchReason, ScriptoriumError};
use scriptorium_pipeline::{
    discover_pages, run_directory, JsonlSink, MemorySink, Pipeline, PipelineConfig, RunSettings,
};
use scriptorium_segmentation::PageCanvas;
use scriptorium_transliteration::TransliterationSource;
use std::path::Path;

const TRANSCRIPTION: &str = "\
# synthetic quire
<f1r.1,@P0> dal.chol
<f1r.2,@P0> ar.ol
<f1v.1,@P0> qoke.dal
<f2r.1,@P0> ol
<f3r.1,@P0> chol.dy
<f3r.x,@P0> broken
";

fn write_page(dir: &Path, name: &str, lines: &[&[usize]]) {
    let mut canvas = PageCanvas::new(200, 40 + 50 * lines.len() as u32);
    for (row, words) in lines.iter().enumerate() {
        let y = 10 + 50 * row as u32;
        let mut x = 10;
        for &glyphs in *words {
            let widths = vec![5; glyphs];
            canvas = canvas.word(x, y, &widths, 12, 2);
            x += PageCanvas::word_width(&widths, 2) + 15;
        }
    }
    canvas.into_gray().save(dir.join(name)).unwrap();
}

/// f1r and f1v are good scans, f2r is corrupt, f3r has no scan, f9r no text
fn fixture(dir: &Path) {
    write_page(dir, "f1r.png", &[&[3, 4], &[2, 2]]);
    write_page(dir, "f1v.png", &[&[4, 3]]);
    std::fs::write(dir.join("f2r.png"), b"not an image").unwrap();
    write_page(dir, "f9r.png", &[&[3]]);
}

fn config(run_id: &str, threads: usize) -> PipelineConfig {
    PipelineConfig {
        anchors: AnchorConfig {
            methods: vec![
                AnchorMethod::new("grid-cell-v1", AnchorKind::GridCell, 1).unwrap(),
                AnchorMethod::new("proximity-v1", AnchorKind::Proximity { max_distance: 0.3 }, 10_000)
                    .unwrap(),
            ],
            ..AnchorConfig::default()
        },
        run: RunSettings {
            run_id: run_id.to_string(),
            seed: 3,
            threads,
        },
        ..PipelineConfig::default()
    }
}

fn run_into_memory(dir: &Path, config: PipelineConfig) -> (scriptorium_pipeline::RunReport, MemorySink) {
    let source = TransliterationSource::from_string("quire.txt", TRANSCRIPTION).parse();
    let pages = discover_pages(dir).unwrap();
    let pipeline = Pipeline::new(config).unwrap();
    let run = pipeline.run_context().unwrap();
    let mut sink = MemorySink::new();
    let report = pipeline.run(&run, &source, &pages, &mut sink).unwrap();
    (report, sink)
}

#[test]
fn test_failures_stay_local_to_their_page() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let (report, sink) = run_into_memory(dir.path(), config("r1", 0));

    assert_eq!(report.pages_processed, 3);
    assert_eq!(report.pages_failed, 1);
    assert_eq!(report.folios_without_image, 1);
    assert!(report.partial_coverage);
    assert_eq!(report.anomaly_counts[&AnomalyKind::Io], 1);
    assert_eq!(report.anomaly_counts[&AnomalyKind::Parse], 1);
    assert_eq!(report.anomaly_counts[&AnomalyKind::Adequacy], 1);

    let missing: Vec<&str> = report
        .anomalies
        .iter()
        .filter_map(|a| match a {
            Anomaly::AlignmentMismatch(m) if m.reason == MismatchReason::MissingFolio => {
                Some(m.folio.as_str())
            }
            _ => None,
        })
        .collect();
    assert_eq!(missing, vec!["f3r", "f9r"]);

    assert_eq!(report.word_alignments, 6);
    assert_eq!(sink.word_alignments.len(), 6);
    assert_eq!(sink.glyph_alignments.len(), report.glyph_alignments);
    assert_eq!(sink.regions.len(), report.regions);
    assert_eq!(sink.anchors.len(), report.anchors);
    assert!(report.anchors > 0);
    assert_eq!(sink.anomalies.len(), report.anomalies.len());
}

#[test]
fn test_inadequate_method_writes_no_anchors() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let (report, sink) = run_into_memory(dir.path(), config("r1", 0));

    let proximity = report
        .anchor_methods
        .iter()
        .find(|m| m.method == "proximity-v1")
        .unwrap();
    assert!(proximity.inadequate);
    assert_eq!(proximity.mean, None);
    assert!(sink.anchors.values().all(|a| a.method == "grid-cell-v1"));
}

#[test]
fn test_rerun_upserts_identical_ids() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let (_, first) = run_into_memory(dir.path(), config("r1", 1));
    let (_, second) = run_into_memory(dir.path(), config("r2", 4));

    assert_eq!(
        first.word_alignments.keys().collect::<Vec<_>>(),
        second.word_alignments.keys().collect::<Vec<_>>()
    );
    assert_eq!(
        first.glyph_alignments.keys().collect::<Vec<_>>(),
        second.glyph_alignments.keys().collect::<Vec<_>>()
    );
    assert_eq!(
        first.anchors.keys().collect::<Vec<_>>(),
        second.anchors.keys().collect::<Vec<_>>()
    );
    assert_eq!(first.anomalies, second.anomalies);
}

#[test]
fn test_changed_parameters_give_new_ids() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let (_, base) = run_into_memory(dir.path(), config("r1", 0));
    let mut tuned = config("r1", 0);
    tuned.alignment.merge_penalty = 4.0;
    let (_, other) = run_into_memory(dir.path(), tuned);

    assert_eq!(base.word_alignments.len(), other.word_alignments.len());
    assert!(base
        .word_alignments
        .keys()
        .all(|id| !other.word_alignments.contains_key(id)));
}

#[test]
fn test_jsonl_output_tables() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let out = dir.path().join("out");

    let source = TransliterationSource::from_string("quire.txt", TRANSCRIPTION).parse();
    let pages = discover_pages(dir.path()).unwrap();
    let pipeline = Pipeline::new(config("r1", 0)).unwrap();
    let run = pipeline.run_context().unwrap();
    let mut sink = JsonlSink::create(&out).unwrap();
    let report = pipeline.run(&run, &source, &pages, &mut sink).unwrap();

    let words = std::fs::read_to_string(out.join("word_alignments.jsonl")).unwrap();
    assert_eq!(words.lines().count(), report.word_alignments);
    let first: serde_json::Value = serde_json::from_str(words.lines().next().unwrap()).unwrap();
    assert_eq!(first["run_id"], "r1");
    assert_eq!(first["record"]["folio"], "f1r");

    let anomalies = std::fs::read_to_string(out.join("anomalies.jsonl")).unwrap();
    assert_eq!(anomalies.lines().count(), report.anomalies.len());
}

#[test]
fn test_run_directory_from_files() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let transcription = dir.path().join("quire.txt");
    std::fs::write(&transcription, TRANSCRIPTION).unwrap();

    let mut sink = MemorySink::new();
    let report = run_directory(config("r1", 0), &transcription, dir.path(), &mut sink).unwrap();
    let (expected, _) = run_into_memory(dir.path(), config("r1", 0));
    assert_eq!(report, expected);
    assert_eq!(sink.word_alignments.len(), 6);
}

#[test]
fn test_run_directory_without_transcription() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = MemorySink::new();
    let err = run_directory(
        PipelineConfig::default(),
        &dir.path().join("absent.txt"),
        dir.path(),
        &mut sink,
    )
    .unwrap_err();
    assert!(matches!(err, ScriptoriumError::IoError(_)));
}
