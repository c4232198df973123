use deslant_core::ImageError;

/// Precondition violations on images, bounds and engine configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("expected a single-channel grayscale image, got {channels} channels")]
    ChannelCount { channels: u8 },

    #[error(
        "image resolution {width}x{height} does not match the engine resolution \
         {expected_width}x{expected_height}"
    )]
    Resolution {
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },

    #[error("invalid shear bounds [{lower}, {upper}]")]
    Bounds { lower: f32, upper: f32 },

    #[error("candidate set must hold at least one finite shear value (got {count})")]
    CandidateCount { count: usize },

    #[error("the {engine} engine does not support the {optimizer} optimizer")]
    UnsupportedOptimizer {
        engine: &'static str,
        optimizer: &'static str,
    },

    #[error("invalid engine configuration: {0}")]
    Config(String),
}

/// Errors surfaced by deslant engines. None of them are retried.
#[derive(thiserror::Error, Debug)]
pub enum DeslantError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("no usable accelerator: {0}")]
    DeviceUnavailable(String),

    #[error("failed to compile kernel '{kernel}':\n{log}")]
    CompileFailure { kernel: String, log: String },

    #[error("accelerator runtime failure: {0}")]
    RuntimeFailure(String),
}

impl From<ImageError> for DeslantError {
    fn from(err: ImageError) -> Self {
        Self::InvalidInput(InputError::Image(err))
    }
}
