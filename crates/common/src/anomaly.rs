//! Anomaly taxonomy and the run-wide anomaly log
//!
//! Recoverable problems never abort a run. Each one becomes an [`Anomaly`]
//! record, processing continues with the next line or page, and the log is
//! queried after the run to judge how complete its coverage is.

use crate::geometry::PixelBox;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Malformed transcription line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseAnomaly {
    /// Transliteration source name (usually the file name)
    pub source: String,
    /// 1-based line number in the source file
    pub line_number: usize,
    /// The raw line exactly as read
    pub raw: String,
    /// What was wrong with it
    pub reason: String,
}

/// What kind of geometric problem was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryIssue {
    /// Ink component below the minimum glyph area
    NoiseSpeck,
    /// Ink band too short to be a text line
    ShortBand,
    /// Zero-sized or out-of-page bounding box
    InvalidBox,
    /// Page without any ink
    EmptyPage,
}

/// Sub-threshold noise or invalid geometry on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryAnomaly {
    pub folio: String,
    pub issue: GeometryIssue,
    pub bbox: Option<PixelBox>,
    pub detail: String,
}

/// Why two modalities could not be matched one-for-one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchReason {
    /// Image line count differs from parsed line count for the folio
    LineCount,
    /// Image line left without a text line after re-keying
    UnpairedImageLine,
    /// Text line left without an image line after re-keying
    UnpairedTextLine,
    /// One side of a line has nothing to align
    EmptyLine,
    /// No alignment fits inside the configured segment span
    SpanExceeded,
    /// Folio present in one modality only
    MissingFolio,
}

/// Line or word count disagreement between image and text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentMismatch {
    pub folio: String,
    pub line_number: Option<usize>,
    pub reason: MismatchReason,
    /// Count on the image side (lines or words depending on `reason`)
    pub image_count: usize,
    /// Count on the text side (lines or tokens depending on `reason`)
    pub text_count: usize,
}

/// Too few qualifying samples for an anchor method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdequacyFailure {
    pub method_id: String,
    pub samples: usize,
    pub required: usize,
}

/// Missing or corrupt required input, fatal for one page or file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoFailure {
    pub path: String,
    pub folio: Option<String>,
    pub message: String,
}

/// Discriminant used to query the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    Parse,
    Geometry,
    AlignmentMismatch,
    Adequacy,
    Io,
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parse => "ParseAnomaly",
            Self::Geometry => "GeometryAnomaly",
            Self::AlignmentMismatch => "AlignmentMismatch",
            Self::Adequacy => "AdequacyFailure",
            Self::Io => "IOFailure",
        };
        f.write_str(name)
    }
}

/// One recorded anomaly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    Parse(ParseAnomaly),
    Geometry(GeometryAnomaly),
    AlignmentMismatch(AlignmentMismatch),
    Adequacy(AdequacyFailure),
    Io(IoFailure),
}

impl Anomaly {
    #[must_use]
    pub const fn kind(&self) -> AnomalyKind {
        match self {
            Self::Parse(_) => AnomalyKind::Parse,
            Self::Geometry(_) => AnomalyKind::Geometry,
            Self::AlignmentMismatch(_) => AnomalyKind::AlignmentMismatch,
            Self::Adequacy(_) => AnomalyKind::Adequacy,
            Self::Io(_) => AnomalyKind::Io,
        }
    }

    /// Folio the anomaly belongs to, when it is tied to one
    #[must_use]
    pub fn folio(&self) -> Option<&str> {
        match self {
            Self::Geometry(g) => Some(&g.folio),
            Self::AlignmentMismatch(m) => Some(&m.folio),
            Self::Io(io) => io.folio.as_deref(),
            Self::Parse(_) | Self::Adequacy(_) => None,
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(p) => write!(
                f,
                "{} {}:{}: {} ({:?})",
                self.kind(),
                p.source,
                p.line_number,
                p.reason,
                p.raw
            ),
            Self::Geometry(g) => {
                write!(f, "{} {}: {:?} {}", self.kind(), g.folio, g.issue, g.detail)
            }
            Self::AlignmentMismatch(m) => write!(
                f,
                "{} {} line {:?}: {:?} (image {}, text {})",
                self.kind(),
                m.folio,
                m.line_number,
                m.reason,
                m.image_count,
                m.text_count
            ),
            Self::Adequacy(a) => write!(
                f,
                "{} {}: {} samples, {} required",
                self.kind(),
                a.method_id,
                a.samples,
                a.required
            ),
            Self::Io(io) => write!(f, "{} {}: {}", self.kind(), io.path, io.message),
        }
    }
}

impl From<ParseAnomaly> for Anomaly {
    fn from(value: ParseAnomaly) -> Self {
        Self::Parse(value)
    }
}

impl From<GeometryAnomaly> for Anomaly {
    fn from(value: GeometryAnomaly) -> Self {
        Self::Geometry(value)
    }
}

impl From<AlignmentMismatch> for Anomaly {
    fn from(value: AlignmentMismatch) -> Self {
        Self::AlignmentMismatch(value)
    }
}

impl From<AdequacyFailure> for Anomaly {
    fn from(value: AdequacyFailure) -> Self {
        Self::Adequacy(value)
    }
}

impl From<IoFailure> for Anomaly {
    fn from(value: IoFailure) -> Self {
        Self::Io(value)
    }
}

/// Append-only anomaly log, queryable after the run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyLog {
    entries: Vec<Anomaly>,
}

impl AnomalyLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an anomaly
    pub fn push(&mut self, anomaly: impl Into<Anomaly>) {
        let anomaly = anomaly.into();
        warn!("{anomaly}");
        self.entries.push(anomaly);
    }

    /// Move every entry of `other` into this log, keeping order
    pub fn append(&mut self, other: &mut Self) {
        self.entries.append(&mut other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Anomaly> {
        self.entries.iter()
    }

    pub fn of_kind(&self, kind: AnomalyKind) -> impl Iterator<Item = &Anomaly> {
        self.entries.iter().filter(move |a| a.kind() == kind)
    }

    pub fn for_folio<'a>(&'a self, folio: &'a str) -> impl Iterator<Item = &'a Anomaly> {
        self.entries.iter().filter(move |a| a.folio() == Some(folio))
    }

    /// Number of anomalies per kind
    #[must_use]
    pub fn counts(&self) -> BTreeMap<AnomalyKind, usize> {
        let mut counts = BTreeMap::new();
        for anomaly in &self.entries {
            *counts.entry(anomaly.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Downstream consumers must treat a run with any anomaly as partial coverage
    #[inline]
    #[must_use]
    pub fn is_partial_coverage(&self) -> bool {
        !self.entries.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Anomaly> {
        self.entries
    }
}

impl Extend<Anomaly> for AnomalyLog {
    fn extend<T: IntoIterator<Item = Anomaly>>(&mut self, iter: T) {
        for anomaly in iter {
            self.push(anomaly);
        }
    }
}

impl<'a> IntoIterator for &'a AnomalyLog {
    type Item = &'a Anomaly;
    type IntoIter = std::slice::Iter<'a, Anomaly>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
