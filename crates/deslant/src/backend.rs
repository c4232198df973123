use serde::{Deserialize, Serialize};

use deslant_engine::{DeslantEngine, DeslantError, ReferenceEngine};

use crate::DeslantConfig;

/// Which engine runs the shear search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Sequential host engine.
    #[default]
    Reference,
    /// wgpu compute engine.
    Offload,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Reference => "reference",
            Backend::Offload => "offload",
        }
    }
}

/// Construct the engine selected by `config.backend`.
pub fn build_engine(config: &DeslantConfig) -> Result<Box<dyn DeslantEngine>, DeslantError> {
    match config.backend {
        Backend::Reference => Ok(Box::new(ReferenceEngine::new(config.search)?)),
        Backend::Offload => build_offload(config),
    }
}

#[cfg(feature = "offload")]
fn build_offload(config: &DeslantConfig) -> Result<Box<dyn DeslantEngine>, DeslantError> {
    let engine = deslant_offload::OffloadEngine::new(config.offload_config())?;
    Ok(Box::new(engine))
}

#[cfg(not(feature = "offload"))]
fn build_offload(_config: &DeslantConfig) -> Result<Box<dyn DeslantEngine>, DeslantError> {
    Err(DeslantError::DeviceUnavailable(
        "built without the `offload` feature".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deslant_engine::{InputError, Optimizer};

    #[test]
    fn reference_backend_is_default() {
        let cfg = DeslantConfig::default();
        let engine = build_engine(&cfg).unwrap();
        assert_eq!(engine.name(), "reference");
    }

    #[test]
    fn invalid_search_params_are_reported() {
        let mut cfg = DeslantConfig::default();
        cfg.search.steps = 0;
        assert!(matches!(
            build_engine(&cfg),
            Err(DeslantError::InvalidInput(InputError::CandidateCount { .. }))
        ));
    }

    #[test]
    fn offload_rejects_powell_before_touching_a_device() {
        let mut cfg = DeslantConfig {
            backend: Backend::Offload,
            ..DeslantConfig::default()
        };
        cfg.search.optimizer = Optimizer::Powell;
        assert!(matches!(
            build_engine(&cfg),
            Err(DeslantError::InvalidInput(_)) | Err(DeslantError::DeviceUnavailable(_))
        ));
    }
}
