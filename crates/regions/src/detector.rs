//! Runs every configured method over a page

use crate::blob::ComponentMethod;
use crate::features::measure;
use crate::grid::GridMethod;
use crate::input::RegionInput;
use crate::method::RegionMethod;
use crate::RegionError;
use scriptorium_common::{IdBuilder, Region, RegionEdge, RunContext};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Region methods to run on every page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    pub grid: Vec<GridMethod>,
    pub blob: Vec<ComponentMethod>,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            grid: vec![GridMethod::default()],
            blob: vec![ComponentMethod::default()],
        }
    }
}

impl RegionConfig {
    /// Build a detector running every configured method
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidMethod`] for the first invalid method.
    pub fn detector(&self) -> Result<RegionDetector, RegionError> {
        let mut detector = RegionDetector::new();
        for grid in &self.grid {
            grid.validate()?;
            detector = detector.with_method(*grid);
        }
        for blob in &self.blob {
            blob.validate()?;
            detector = detector.with_method(*blob);
        }
        Ok(detector)
    }
}

/// Regions and edges found on one page by all methods
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionSet {
    pub regions: Vec<Region>,
    pub edges: Vec<RegionEdge>,
}

impl RegionSet {
    /// Regions of one method
    pub fn by_method<'a>(&'a self, method: &'a str) -> impl Iterator<Item = &'a Region> {
        self.regions.iter().filter(move |r| r.method == method)
    }

    #[must_use]
    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// Edges leaving a region
    pub fn neighbours<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a RegionEdge> {
        self.edges.iter().filter(move |e| e.source == id)
    }
}

/// Ordered list of region methods
///
/// Methods never see each other's output; regions of different methods are
/// kept side by side, distinguished by method id.
#[derive(Debug, Default)]
pub struct RegionDetector {
    methods: Vec<Box<dyn RegionMethod>>,
}

impl RegionDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_method(mut self, method: impl RegionMethod + 'static) -> Self {
        self.methods.push(Box::new(method));
        self
    }

    #[must_use]
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Detect regions with every method
    #[must_use]
    pub fn detect(&self, run: &RunContext, input: &RegionInput<'_>) -> RegionSet {
        let mut set = RegionSet::default();
        for method in &self.methods {
            let zones = method.zones(input);
            let adjacency = method.adjacency(input, &zones);
            let signature = method.signature();

            let first = set.regions.len();
            for (index, zone) in zones.iter().enumerate() {
                let id = IdBuilder::new("region")
                    .part(&run.config_digest)
                    .part(input.folio())
                    .part(method.id())
                    .part(&signature)
                    .part(method.scale())
                    .part(index)
                    .finish();
                set.regions.push(Region {
                    id,
                    folio: input.folio().to_string(),
                    method: method.id().to_string(),
                    scale: method.scale(),
                    index,
                    bbox: *zone,
                    features: measure(input.mask, zone, input.words()),
                });
            }

            let ids: Vec<String> = set.regions[first..].iter().map(|r| r.id.clone()).collect();
            for edge in &adjacency {
                for (source, target) in [(edge.a, edge.b), (edge.b, edge.a)] {
                    set.edges.push(RegionEdge {
                        id: IdBuilder::new("region_edge")
                            .part(&ids[source])
                            .part(&ids[target])
                            .finish(),
                        folio: input.folio().to_string(),
                        method: method.id().to_string(),
                        source: ids[source].clone(),
                        target: ids[target].clone(),
                        kind: edge.kind,
                        weight: edge.weight,
                    });
                }
            }
            info!(
                "{}: method {} ({}) found {} regions, {} edges",
                input.folio(),
                method.id(),
                signature,
                zones.len(),
                adjacency.len() * 2
            );
        }
        set
    }
}
