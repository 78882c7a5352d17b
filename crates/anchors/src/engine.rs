//! Cohort anchoring with an adequacy gate

use crate::method::{default_methods, AnchorMethod};
use crate::structures::TextStructure;
use crate::AnchorError;
use rand::Rng;
use scriptorium_common::{AdequacyFailure, Anchor, AnomalyLog, IdBuilder, Region, RunContext};
use scriptorium_segmentation::PageGeometry;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Anchor engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    pub methods: Vec<AnchorMethod>,
    /// Bootstrap resamples of the mean score; 0 collapses the interval onto the mean
    pub bootstrap_resamples: usize,
    /// Two-sided confidence level of the interval
    pub confidence: f64,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            methods: default_methods(),
            bootstrap_resamples: 1000,
            confidence: 0.95,
        }
    }
}

impl AnchorConfig {
    /// # Errors
    ///
    /// Returns an error for an invalid method, a repeated method id or a
    /// confidence level outside `(0, 1)`.
    pub fn validate(&self) -> Result<(), AnchorError> {
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(AnchorError::InvalidConfig(format!(
                "confidence {} outside (0, 1)",
                self.confidence
            )));
        }
        for (i, method) in self.methods.iter().enumerate() {
            method.validate()?;
            if self.methods[..i].iter().any(|m| m.id == method.id) {
                return Err(AnchorError::DuplicateMethod(method.id.clone()));
            }
        }
        Ok(())
    }
}

/// One page of the cohort: its structures and detected regions
#[derive(Debug, Clone, Copy)]
pub struct AnchorPage<'a> {
    pub page: &'a PageGeometry,
    pub structures: &'a [TextStructure],
    pub regions: &'a [Region],
}

/// Mean anchor score of a method over the cohort with a bootstrap interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorSummary {
    pub samples: usize,
    pub mean: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    pub resamples: usize,
    pub confidence: f64,
    pub seed: u64,
}

/// Result of one method over a cohort
///
/// `Inadequate` is not a score: too few samples qualified to say anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnchorOutcome {
    Scored {
        anchors: Vec<Anchor>,
        summary: AnchorSummary,
    },
    Inadequate(AdequacyFailure),
}

impl AnchorOutcome {
    #[must_use]
    pub const fn is_inadequate(&self) -> bool {
        matches!(self, Self::Inadequate(_))
    }

    /// Anchors of a scored outcome, empty when inadequate
    #[must_use]
    pub fn anchors(&self) -> &[Anchor] {
        match self {
            Self::Scored { anchors, .. } => anchors,
            Self::Inadequate(_) => &[],
        }
    }
}

/// Outcome of one method, tagged with the method that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodOutcome {
    pub method: AnchorMethod,
    pub outcome: AnchorOutcome,
}

/// Every method's outcome over a cohort
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnchorRun {
    pub outcomes: Vec<MethodOutcome>,
    pub anomalies: AnomalyLog,
}

impl AnchorRun {
    /// Anchors of every scored method, in method order
    pub fn anchors(&self) -> impl Iterator<Item = &Anchor> {
        self.outcomes.iter().flat_map(|o| o.outcome.anchors())
    }

    #[must_use]
    pub fn outcome(&self, method_id: &str) -> Option<&AnchorOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.method.id == method_id)
            .map(|o| &o.outcome)
    }
}

/// Runs every configured anchor method independently over a cohort
#[derive(Debug, Clone)]
pub struct AnchorEngine {
    config: AnchorConfig,
}

impl AnchorEngine {
    /// # Errors
    ///
    /// Returns an error when the configuration does not validate.
    pub fn new(config: AnchorConfig) -> Result<Self, AnchorError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &AnchorConfig {
        &self.config
    }

    /// Run every method over the cohort
    ///
    /// Methods never see each other's results; their anchors coexist.
    #[must_use]
    pub fn run(&self, run: &RunContext, cohort: &[AnchorPage<'_>]) -> AnchorRun {
        let mut out = AnchorRun::default();
        for method in &self.config.methods {
            let outcome = self.run_method(run, method, cohort);
            if let AnchorOutcome::Inadequate(failure) = &outcome {
                out.anomalies.push(failure.clone());
            }
            out.outcomes.push(MethodOutcome {
                method: method.clone(),
                outcome,
            });
        }
        out
    }

    /// Run one method over the cohort, applying the adequacy gate
    #[must_use]
    pub fn run_method(
        &self,
        run: &RunContext,
        method: &AnchorMethod,
        cohort: &[AnchorPage<'_>],
    ) -> AnchorOutcome {
        let parameters = method.parameters();
        let mut anchors = Vec::new();
        for page in cohort {
            let diagonal = page.page.diagonal();
            for structure in page.structures {
                let key = structure.key();
                for region in page.regions {
                    let Some(score) = method.score(&structure.bbox, region, diagonal) else {
                        continue;
                    };
                    let id = IdBuilder::new("anchor")
                        .part(&run.config_digest)
                        .part(&page.page.folio)
                        .part(&method.id)
                        .part(&parameters)
                        .part(&key)
                        .part(&region.id)
                        .finish();
                    anchors.push(Anchor {
                        id,
                        folio: page.page.folio.clone(),
                        source: structure.source.clone(),
                        target: region.id.clone(),
                        method: method.id.clone(),
                        score,
                    });
                }
            }
        }

        if anchors.len() < method.min_samples {
            warn!(
                "Anchor method {} inadequate: {} samples, {} required",
                method.id,
                anchors.len(),
                method.min_samples
            );
            return AnchorOutcome::Inadequate(AdequacyFailure {
                method_id: method.id.clone(),
                samples: anchors.len(),
                required: method.min_samples,
            });
        }

        let scores: Vec<f64> = anchors.iter().map(|a| a.score).collect();
        let summary = self.summarize(run.seed, &scores);
        info!(
            "Anchor method {}: {} anchors over {} pages, mean {:.3} [{:.3}, {:.3}]",
            method.id,
            anchors.len(),
            cohort.len(),
            summary.mean,
            summary.ci_low,
            summary.ci_high
        );
        AnchorOutcome::Scored { anchors, summary }
    }

    fn summarize(&self, seed: u64, scores: &[f64]) -> AnchorSummary {
        let mean = mean(scores);
        let resamples = self.config.bootstrap_resamples;
        let (ci_low, ci_high) = if resamples == 0 || scores.is_empty() {
            (mean, mean)
        } else {
            bootstrap_interval(scores, resamples, self.config.confidence, seed)
        };
        AnchorSummary {
            samples: scores.len(),
            mean,
            ci_low,
            ci_high,
            resamples,
            confidence: self.config.confidence,
            seed,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Percentile bootstrap interval of the mean
///
/// The same seed over the same scores always gives the same interval.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn bootstrap_interval(scores: &[f64], resamples: usize, confidence: f64, seed: u64) -> (f64, f64) {
    use rand::SeedableRng;

    if scores.is_empty() || resamples == 0 {
        let m = mean(scores);
        return (m, m);
    }
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut means: Vec<f64> = (0..resamples)
        .map(|_| {
            let total: f64 = (0..scores.len())
                .map(|_| scores[rng.random_range(0..scores.len())])
                .sum();
            total / scores.len() as f64
        })
        .collect();
    means.sort_by(f64::total_cmp);

    let tail = (1.0 - confidence) / 2.0;
    let last = resamples - 1;
    let low = ((tail * resamples as f64).floor() as usize).min(last);
    let high = (((1.0 - tail) * resamples as f64).ceil() as usize)
        .saturating_sub(1)
        .clamp(low, last);
    (means[low], means[high])
}
