//! Job description: YAML file merged with command line flags.

use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use streamrate::{DEFAULT_QUALITY, Encoding, ResamplerConfig};

use crate::Cli;

/// Read size used when neither the file nor the flags give one.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// A resampling job as written in a YAML file. Every field is optional so a
/// file can hold just the parts that rarely change.
///
/// ```yaml
/// channels: 2
/// input_rate: 48000
/// output_rate: 16000
/// quality: 7
/// encoding: s16le
/// chunk_size: 3840
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Job {
    pub channels: Option<usize>,
    pub input_rate: Option<u32>,
    pub output_rate: Option<u32>,
    pub quality: Option<u8>,
    pub encoding: Option<Encoding>,
    pub chunk_size: Option<usize>,
}

/// A job with every value resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub config: ResamplerConfig,
    pub encoding: Encoding,
    pub chunk_size: usize,
}

impl Job {
    /// Loads a job file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read job file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid job file {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Overrides fields with the flags that were given.
    pub fn merge(mut self, cli: &Cli) -> Self {
        self.channels = cli.channels.or(self.channels);
        self.input_rate = cli.input_rate.or(self.input_rate);
        self.output_rate = cli.output_rate.or(self.output_rate);
        self.quality = cli.quality.or(self.quality);
        self.encoding = cli.encoding.or(self.encoding);
        self.chunk_size = cli.chunk_size.or(self.chunk_size);
        self
    }

    /// Fills defaults and checks that the required values are present.
    pub fn resolve(&self) -> anyhow::Result<Resolved> {
        let channels = self
            .channels
            .context("channel count is required, use --channels")?;
        let input_rate = self
            .input_rate
            .context("input rate is required, use --input-rate")?;
        let output_rate = self
            .output_rate
            .context("output rate is required, use --output-rate")?;
        let chunk_size = self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE);
        if chunk_size == 0 {
            anyhow::bail!("chunk size must be positive");
        }

        let config = ResamplerConfig::new(channels, input_rate, output_rate)
            .with_quality(self.quality.unwrap_or(DEFAULT_QUALITY));
        config.validate()?;

        Ok(Resolved {
            config,
            encoding: self.encoding.unwrap_or_default(),
            chunk_size,
        })
    }
}
