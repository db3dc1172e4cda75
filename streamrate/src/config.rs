//! Resampler configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lowest accepted quality.
pub const MIN_QUALITY: u8 = 1;
/// Highest accepted quality.
pub const MAX_QUALITY: u8 = 10;
/// Quality used when none is given.
pub const DEFAULT_QUALITY: u8 = 7;

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

/// Describes one resampling job: channel layout, rates and quality.
///
/// Immutable once an engine has been built from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResamplerConfig {
    /// Number of interleaved channels.
    pub channels: usize,
    /// Input sample rate in Hz.
    pub input_rate: u32,
    /// Output sample rate in Hz.
    pub output_rate: u32,
    /// 1 (fastest) to 10 (best).
    #[serde(default = "default_quality")]
    pub quality: u8,
}

impl ResamplerConfig {
    /// Creates a config with the default quality.
    pub const fn new(channels: usize, input_rate: u32, output_rate: u32) -> Self {
        Self {
            channels,
            input_rate,
            output_rate,
            quality: DEFAULT_QUALITY,
        }
    }

    /// Mono config with the default quality.
    pub const fn mono(input_rate: u32, output_rate: u32) -> Self {
        Self::new(1, input_rate, output_rate)
    }

    /// Stereo config with the default quality.
    pub const fn stereo(input_rate: u32, output_rate: u32) -> Self {
        Self::new(2, input_rate, output_rate)
    }

    /// Sets the quality.
    pub const fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Checks every field against its accepted range.
    pub fn validate(&self) -> Result<()> {
        if self.channels == 0 {
            return Err(Error::Config("channel count must be at least 1".into()));
        }
        if self.input_rate == 0 {
            return Err(Error::Config("input rate must be positive".into()));
        }
        if self.output_rate == 0 {
            return Err(Error::Config("output rate must be positive".into()));
        }
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&self.quality) {
            return Err(Error::Config(format!(
                "quality must be within {}..={}, got {}",
                MIN_QUALITY, MAX_QUALITY, self.quality
            )));
        }
        Ok(())
    }

    /// Output rate divided by input rate.
    pub fn ratio(&self) -> f64 {
        self.output_rate as f64 / self.input_rate as f64
    }

    /// Bytes in one frame for samples of `sample_width` bytes.
    pub fn frame_bytes(&self, sample_width: usize) -> usize {
        self.channels * sample_width
    }

    /// Output frames needed to hold the resampled form of `frames` input
    /// frames, rounded up.
    pub fn output_frames_for(&self, frames: usize) -> usize {
        let num = frames as u64 * self.output_rate as u64;
        num.div_ceil(self.input_rate as u64) as usize
    }
}
