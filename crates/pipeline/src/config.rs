//! Configuration loading for pipeline runs.

use anyhow::{Context, Result};
use scriptorium_alignment::{AlignmentConfig, GlyphConfig};
use scriptorium_anchors::AnchorConfig;
use scriptorium_common::RunContext;
use scriptorium_regions::RegionConfig;
use scriptorium_segmentation::SegmentationConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Run identity and scheduling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub run_id: String,
    /// Seed for sampling (bootstrap intervals); never used by the aligners
    pub seed: u64,
    /// Worker threads for page units, 0 for one per core
    pub threads: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            run_id: "run".to_string(),
            seed: 0,
            threads: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub segmentation: SegmentationConfig,
    pub regions: RegionConfig,
    pub alignment: AlignmentConfig,
    pub glyphs: GlyphConfig,
    pub anchors: AnchorConfig,
    pub run: RunSettings,
}

/// The parameter sections, without run identity
#[derive(Serialize)]
struct Parameters<'a> {
    segmentation: &'a SegmentationConfig,
    regions: &'a RegionConfig,
    alignment: &'a AlignmentConfig,
    glyphs: &'a GlyphConfig,
    anchors: &'a AnchorConfig,
}

impl PipelineConfig {
    /// Run context carrying a snapshot of every parameter section
    ///
    /// Run id and seed are left out of the snapshot, so two runs with the same
    /// parameters produce the same record ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized.
    pub fn run_context(&self) -> Result<RunContext, serde_json::Error> {
        let parameters = Parameters {
            segmentation: &self.segmentation,
            regions: &self.regions,
            alignment: &self.alignment,
            glyphs: &self.glyphs,
            anchors: &self.anchors,
        };
        RunContext::new(self.run.run_id.clone(), self.run.seed, &parameters)
    }
}

pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    if !path.exists() {
        return Ok(PipelineConfig::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: PipelineConfig =
        toml::from_str(&contents).context("Failed to parse config file as TOML")?;
    Ok(config)
}
