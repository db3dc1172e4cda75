//! Error types for streamrate.

/// Result type alias for streamrate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for resampling operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid channel count, sample rate or quality.
    #[error("invalid config: {0}")]
    Config(String),

    /// The backend has not finished loading.
    #[error("resampler backend not ready")]
    NotReady,

    /// Chunk handed to the engine is not frame aligned.
    #[error(
        "chunk length must be a multiple of channels × sample width (got {len} bytes, frame is {frame} bytes)"
    )]
    InvalidInput { len: usize, frame: usize },

    /// The backend refused to create a resampler.
    #[error("resampler init failed: {0}")]
    Init(String),

    /// The resampler failed while processing a chunk.
    #[error("resample failed: {0}")]
    Processing(String),

    /// The backend loader failed.
    #[error("backend load failed: {0}")]
    Load(String),

    /// Engine used after close.
    #[error("resampler closed")]
    Closed,
}
