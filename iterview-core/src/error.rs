use thiserror::Error;

/// Errors originating from the core geometry and function layer.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid plane rectangle: {reason}")]
    InvalidRange { reason: String },

    #[error("invalid resolution: {width}×{height} (both must be > 0)")]
    InvalidResolution { width: u32, height: u32 },

    #[error("unknown iteration function: {0}")]
    UnknownFunction(String),

    #[error("unknown argument: {0}")]
    UnknownArgument(String),

    #[error("cannot parse {value:?} as {expected} for argument {name}")]
    InvalidArgument {
        name: String,
        value: String,
        expected: &'static str,
    },
}
