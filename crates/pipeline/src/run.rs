//! Batch runs: page units in parallel, records written in folio order

use crate::config::PipelineConfig;
use crate::page::{discover_pages, PageInput, PageOutput, PageUnit};
use crate::PipelineError;
use rayon::prelude::*;
use scriptorium_alignment::FolioAligner;
use scriptorium_anchors::{AnchorEngine, AnchorOutcome, AnchorPage};
use scriptorium_common::{
    AlignmentMismatch, AnomalyKind, AnomalyLog, IoFailure, MismatchReason, RecordSink, RunContext,
};
use std::path::Path;
use scriptorium_regions::RegionDetector;
use scriptorium_segmentation::{SegmentationError, Segmenter};
use scriptorium_transliteration::{ParseOutput, ParsedLine, TransliterationSource};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::{info, warn};

/// How one anchor method ended over the cohort
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodReport {
    pub method: String,
    pub inadequate: bool,
    pub samples: usize,
    pub required: usize,
    /// Mean anchor score, absent when inadequate
    pub mean: Option<f64>,
}

/// Summary of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub config_digest: String,
    pub pages_processed: usize,
    pub pages_failed: usize,
    /// Transcribed folios with no page scan
    pub folios_without_image: usize,
    pub word_alignments: usize,
    pub glyph_alignments: usize,
    pub regions: usize,
    pub region_edges: usize,
    pub anchors: usize,
    pub anchor_methods: Vec<MethodReport>,
    pub anomaly_counts: BTreeMap<AnomalyKind, usize>,
    /// Any anomaly was recorded; consumers must treat coverage as partial
    pub partial_coverage: bool,
    #[serde(skip)]
    pub anomalies: AnomalyLog,
}

/// Engines built once from a [`PipelineConfig`]
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    segmenter: Segmenter,
    detector: RegionDetector,
    aligner: FolioAligner,
    anchors: AnchorEngine,
}

impl Pipeline {
    /// # Errors
    ///
    /// Returns an error when a region or anchor method does not validate.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        let segmenter = Segmenter::new(config.segmentation.clone());
        let detector = config.regions.detector()?;
        let aligner = FolioAligner::new(config.alignment.clone(), config.glyphs.clone());
        let anchors = AnchorEngine::new(config.anchors.clone())?;
        Ok(Self {
            config,
            segmenter,
            detector,
            aligner,
            anchors,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run context for this pipeline's configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized.
    pub fn run_context(&self) -> Result<RunContext, PipelineError> {
        Ok(self.config.run_context()?)
    }

    /// Process every page against the parsed transcription and write all
    /// records to `sink`
    ///
    /// Page units run in parallel. Their results are written on the calling
    /// thread in folio order: transcription order first, then folios that
    /// only have a scan, sorted by id. A page that cannot be loaded becomes
    /// an `Io` anomaly and the run carries on.
    ///
    /// # Errors
    ///
    /// Returns an error when the sink fails or the worker pool cannot be built.
    pub fn run<S: RecordSink + ?Sized>(
        &self,
        run: &RunContext,
        source: &ParseOutput,
        pages: &[PageInput],
        sink: &mut S,
    ) -> Result<RunReport, PipelineError> {
        let started = Instant::now();
        let mut report = RunReport {
            run_id: run.run_id.clone(),
            config_digest: run.config_digest.clone(),
            ..RunReport::default()
        };
        let mut anomalies = source.anomalies.clone();

        let mut text: BTreeMap<&str, Vec<&ParsedLine>> = BTreeMap::new();
        for line in &source.lines {
            text.entry(line.folio.as_str()).or_default().push(line);
        }

        let mut order: Vec<&str> = source.folios();
        let mut image_only: Vec<&str> = pages
            .iter()
            .map(|p| p.folio.as_str())
            .filter(|f| !text.contains_key(f))
            .collect();
        image_only.sort_unstable();
        image_only.dedup();
        order.extend(image_only);

        let by_folio: HashMap<&str, &PageInput> =
            pages.iter().map(|p| (p.folio.as_str(), p)).collect();
        let scheduled: Vec<&PageInput> = order
            .iter()
            .filter_map(|folio| by_folio.get(folio).copied())
            .collect();

        info!(
            "Run {}: {} pages, {} transcribed folios",
            run.run_id,
            scheduled.len(),
            text.len()
        );
        let results = self.process_pages(run, &scheduled, &text)?;
        let mut results: HashMap<&str, Result<PageOutput, SegmentationError>> = scheduled
            .iter()
            .map(|p| p.folio.as_str())
            .zip(results)
            .collect();

        let mut outputs = Vec::new();
        for folio in &order {
            match results.remove(folio) {
                Some(Ok(output)) => {
                    write_page(run, &output, sink, &mut report)?;
                    anomalies.append(&mut output.anomalies());
                    report.pages_processed += 1;
                    outputs.push(output);
                }
                Some(Err(err)) => {
                    report.pages_failed += 1;
                    anomalies.push(IoFailure {
                        path: err.path().to_string(),
                        folio: Some((*folio).to_string()),
                        message: err.to_string(),
                    });
                }
                None => {
                    report.folios_without_image += 1;
                    let text_count = text.get(folio).map_or(0, Vec::len);
                    anomalies.push(AlignmentMismatch {
                        folio: (*folio).to_string(),
                        line_number: None,
                        reason: MismatchReason::MissingFolio,
                        image_count: 0,
                        text_count,
                    });
                }
            }
        }

        let cohort: Vec<AnchorPage<'_>> = outputs
            .iter()
            .map(|o| AnchorPage {
                page: &o.segmentation.page,
                structures: &o.structures,
                regions: &o.regions.regions,
            })
            .collect();
        let mut anchored = self.anchors.run(run, &cohort);
        for anchor in anchored.anchors() {
            sink.add_anchor(run, anchor)?;
            report.anchors += 1;
        }
        report.anchor_methods = anchored
            .outcomes
            .iter()
            .map(|o| match &o.outcome {
                AnchorOutcome::Scored { summary, .. } => MethodReport {
                    method: o.method.id.clone(),
                    inadequate: false,
                    samples: summary.samples,
                    required: o.method.min_samples,
                    mean: Some(summary.mean),
                },
                AnchorOutcome::Inadequate(failure) => MethodReport {
                    method: o.method.id.clone(),
                    inadequate: true,
                    samples: failure.samples,
                    required: failure.required,
                    mean: None,
                },
            })
            .collect();
        anomalies.append(&mut anchored.anomalies);

        for anomaly in anomalies.iter() {
            sink.add_anomaly(run, anomaly)?;
        }
        sink.flush()?;

        report.anomaly_counts = anomalies.counts();
        report.partial_coverage = anomalies.is_partial_coverage();
        report.anomalies = anomalies;
        if report.pages_failed > 0 {
            warn!("Run {}: {} pages failed to load", run.run_id, report.pages_failed);
        }
        info!(
            "Run {} finished in {:.2}s: {} pages, {} word alignments, {} glyph alignments, {} regions, {} anchors, {} anomalies",
            run.run_id,
            started.elapsed().as_secs_f64(),
            report.pages_processed,
            report.word_alignments,
            report.glyph_alignments,
            report.regions,
            report.anchors,
            report.anomalies.len()
        );
        Ok(report)
    }

    fn process_pages(
        &self,
        run: &RunContext,
        pages: &[&PageInput],
        text: &BTreeMap<&str, Vec<&ParsedLine>>,
    ) -> Result<Vec<Result<PageOutput, SegmentationError>>, PipelineError> {
        let unit = PageUnit {
            segmenter: &self.segmenter,
            detector: &self.detector,
            aligner: &self.aligner,
        };
        let process = || {
            pages
                .par_iter()
                .map(|page| {
                    let lines = text.get(page.folio.as_str()).map_or(&[][..], Vec::as_slice);
                    unit.process(run, page, lines)
                })
                .collect::<Vec<_>>()
        };

        let threads = self.config.run.threads;
        if threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
            Ok(pool.install(process))
        } else {
            Ok(process())
        }
    }
}

/// Parse `transliteration`, discover the scans in `pages` and run the whole
/// pipeline into `sink`
///
/// # Errors
///
/// Returns an error when the transcription or the page directory cannot be
/// read, the configuration does not validate, or the sink fails.
pub fn run_directory<S: RecordSink + ?Sized>(
    config: PipelineConfig,
    transliteration: &Path,
    pages: &Path,
    sink: &mut S,
) -> scriptorium_common::Result<RunReport> {
    let parsed = TransliterationSource::from_path(transliteration)?.parse();
    let pages = discover_pages(pages)?;
    let pipeline = Pipeline::new(config)?;
    let run = pipeline.run_context()?;
    Ok(pipeline.run(&run, &parsed, &pages, sink)?)
}

fn write_page<S: RecordSink + ?Sized>(
    run: &RunContext,
    output: &PageOutput,
    sink: &mut S,
    report: &mut RunReport,
) -> Result<(), PipelineError> {
    for region in &output.regions.regions {
        sink.add_region(run, region)?;
    }
    for edge in &output.regions.edges {
        sink.add_region_edge(run, edge)?;
    }
    for record in &output.alignment.words {
        sink.add_word_alignment(run, record)?;
    }
    for record in &output.alignment.glyphs {
        sink.add_glyph_alignment(run, record)?;
    }
    report.regions += output.regions.regions.len();
    report.region_edges += output.regions.edges.len();
    report.word_alignments += output.alignment.words.len();
    report.glyph_alignments += output.alignment.glyphs.len();
    Ok(())
}
