//! Resampling backends.
//!
//! A [`Backend`] is the loaded resampling library; it creates one [`Kernel`]
//! per engine. Kernels do the actual band-limited interpolation and keep their
//! filter state between calls, so a stream split across many calls resamples
//! as if it had been processed in one piece.
//!
//! The production backend is [`RubatoBackend`]. Anything implementing the two
//! traits can be loaded into a [`Library`](crate::Library) instead.

mod sinc;

#[cfg(test)]
pub(crate) mod mock;

pub use self::sinc::RubatoBackend;

use crate::config::ResamplerConfig;

/// Error reported by a backend or kernel.
///
/// The `Display` form is the human-readable diagnostic surfaced by the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KernelError {
    /// The backend could not build a resampler for the given parameters.
    #[error("construction failed: {0}")]
    Construction(String),

    /// Sample count is not a whole number of frames.
    #[error("{samples} samples do not fill whole {channels}-channel frames")]
    Misaligned { samples: usize, channels: usize },

    /// The resampler rejected a processing call.
    #[error("process failed: {0}")]
    Process(String),
}

/// A loaded resampling library.
pub trait Backend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Creates a kernel for `config`. The config has already been validated.
    fn create(&self, config: &ResamplerConfig) -> Result<Box<dyn Kernel>, KernelError>;
}

/// One live resampler instance.
///
/// Input and output are interleaved. A call consumes all of `input` and
/// writes at most `output.len() / channels` frames, returning the number of
/// frames written. Frames that do not fit stay queued for the next call.
pub trait Kernel: Send {
    /// Resamples `f32` samples.
    fn process_f32(&mut self, input: &[f32], output: &mut [f32]) -> Result<usize, KernelError>;

    /// Resamples `i16` samples.
    fn process_i16(&mut self, input: &[i16], output: &mut [i16]) -> Result<usize, KernelError>;

    /// Frames produced but not yet handed out.
    fn queued_frames(&self) -> usize;

    /// Ends the stream: renders the filter tail so that the total output
    /// matches the input length times the rate ratio. The tail is queued and
    /// handed out by following process calls with empty input.
    fn finish(&mut self) -> Result<(), KernelError>;
}
