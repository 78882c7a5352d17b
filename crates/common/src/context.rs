//! Run context threaded through every engine call

use serde::{Deserialize, Serialize};

use crate::ids::IdBuilder;

/// Opaque run handle: run id, sampling seed and a snapshot of the configuration
///
/// The core never reads the snapshot; it only attaches the context to each
/// output batch and folds `config_digest` into record ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    pub run_id: String,
    pub seed: u64,
    /// JSON rendering of the configuration used for the run
    pub config_snapshot: String,
    /// Short digest of `config_snapshot`
    pub config_digest: String,
}

impl RunContext {
    /// Create a context from any serializable configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to JSON.
    pub fn new<C: Serialize>(
        run_id: impl Into<String>,
        seed: u64,
        config: &C,
    ) -> Result<Self, serde_json::Error> {
        let config_snapshot = serde_json::to_string(config)?;
        let config_digest = IdBuilder::new("config").part(&config_snapshot).finish();
        Ok(Self {
            run_id: run_id.into(),
            seed,
            config_snapshot,
            config_digest,
        })
    }

    /// Context with an empty configuration, for tests and ad-hoc runs
    #[must_use]
    pub fn ad_hoc(run_id: impl Into<String>, seed: u64) -> Self {
        let config_snapshot = "{}".to_string();
        let config_digest = IdBuilder::new("config").part(&config_snapshot).finish();
        Self {
            run_id: run_id.into(),
            seed,
            config_snapshot,
            config_digest,
        }
    }
}
