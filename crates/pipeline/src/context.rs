//! Validated configuration shared by every session of a batch.

use std::path::Path;

use config_loader::{ConfigLoader, SessionManifest};
use contracts::{ContractError, FeatureLayout, PipelineBlueprint};
use tracing::info;

/// Blueprint plus everything derived from it once
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub blueprint: PipelineBlueprint,
    pub manifest: SessionManifest,
    pub layout: FeatureLayout,
}

impl PipelineContext {
    /// Load, validate and derive from a configuration file
    pub fn load(path: &Path) -> Result<Self, ContractError> {
        let blueprint = ConfigLoader::load_from_path(path)?;
        let context = Self::from_blueprint(blueprint)?;
        info!(
            config = %path.display(),
            devices = context.blueprint.devices.len(),
            sessions = context.manifest.len(),
            dimension = context.layout.dimension(),
            "configuration loaded"
        );
        Ok(context)
    }

    /// Derive from an already validated blueprint
    pub fn from_blueprint(blueprint: PipelineBlueprint) -> Result<Self, ContractError> {
        let manifest = SessionManifest::from_blueprint(&blueprint)?;
        let layout = FeatureLayout::new(&blueprint.devices, blueprint.general.channel_order);
        Ok(Self {
            blueprint,
            manifest,
            layout,
        })
    }

    #[inline]
    pub fn rate_hz(&self) -> f64 {
        self.blueprint.general.sample_rate_hz
    }
}
