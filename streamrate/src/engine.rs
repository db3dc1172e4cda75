//! Resampler engine.
//!
//! One [`Engine`] drives one kernel over a logically continuous stream of
//! frame-aligned byte chunks. It owns two grow-only scratch buffers, so after
//! the largest chunk has been seen no further staging allocations happen.

use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, trace, warn};

use crate::backend::Kernel;
use crate::config::ResamplerConfig;
use crate::error::{Error, Result};
use crate::library::Library;
use crate::sample::{self, Sample};
use crate::scratch::Scratch;

/// Resamples frame-aligned chunks of interleaved `S` samples.
///
/// The sample type fixes the encoding: `Engine<f32>` takes 32-bit float
/// little-endian bytes, `Engine<i16>` signed 16-bit little-endian bytes.
/// Calls are strictly sequential; separate engines are independent.
///
/// Resources are released by [`close`](Self::close) or on drop.
pub struct Engine<S: Sample> {
    library: Library,
    config: ResamplerConfig,
    kernel: Option<Box<dyn Kernel>>,
    input: Scratch<S>,
    output: Scratch<S>,
    closed: bool,
    _sample: PhantomData<S>,
}

impl<S: Sample> fmt::Debug for Engine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("encoding", &S::ENCODING)
            .field("open", &self.kernel.is_some())
            .field("input_capacity", &self.input.len())
            .field("output_capacity", &self.output.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl<S: Sample> Engine<S> {
    pub(crate) fn new(library: Library, config: ResamplerConfig) -> Self {
        Self {
            library,
            config,
            kernel: None,
            input: Scratch::new(),
            output: Scratch::new(),
            closed: false,
            _sample: PhantomData,
        }
    }

    /// The engine's configuration.
    pub fn config(&self) -> &ResamplerConfig {
        &self.config
    }

    /// Bytes per frame: channels × sample width.
    pub fn frame_bytes(&self) -> usize {
        self.config.frame_bytes(S::WIDTH)
    }

    /// Input scratch size in samples.
    pub fn input_capacity(&self) -> usize {
        self.input.len()
    }

    /// Output scratch size in samples.
    pub fn output_capacity(&self) -> usize {
        self.output.len()
    }

    /// Returns true after [`close`](Self::close).
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Resamples one chunk and returns the produced bytes.
    ///
    /// `chunk.len()` must be a multiple of [`frame_bytes`](Self::frame_bytes).
    /// The output length follows the resampler's phase, not a fixed ratio of
    /// the input length; only the total over a stream converges to
    /// `input × output_rate / input_rate`.
    ///
    /// The returned buffer is a fresh copy and stays valid across calls.
    pub fn process_chunk(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        let frame = self.frame_bytes();
        if chunk.len() % frame != 0 {
            return Err(Error::InvalidInput {
                len: chunk.len(),
                frame,
            });
        }
        if self.closed {
            return Err(Error::Closed);
        }
        self.open_kernel()?;

        let samples = chunk.len() / S::WIDTH;
        let frames = samples / self.config.channels;
        self.input.ensure(samples);
        self.output
            .ensure(self.config.output_frames_for(frames) * self.config.channels);

        let input = &mut self.input.as_mut_slice()[..samples];
        sample::decode_into(chunk, input);

        self.run(samples, frames)
    }

    /// Ends the current stream and returns the remaining output.
    ///
    /// The kernel renders its filter tail so that the stream's total output is
    /// `round(total_input_frames × output_rate / input_rate)` frames. The
    /// kernel is then dropped; the next chunk starts a new stream.
    pub fn flush(&mut self) -> Result<Vec<u8>> {
        if self.closed {
            return Err(Error::Closed);
        }
        let Some(kernel) = self.kernel.as_mut() else {
            return Ok(Vec::new());
        };

        if let Err(e) = kernel.finish() {
            warn!(error = %e, "resampler flush failed");
            return Err(Error::Processing(e.to_string()));
        }
        let queued = kernel.queued_frames();
        self.output.ensure(queued * self.config.channels);

        let out = self.run(0, 0)?;
        self.kernel = None;
        debug!(frames = queued, "resampler flushed");
        Ok(out)
    }

    /// Releases the resampler and both scratch buffers.
    ///
    /// Further calls fail with [`Error::Closed`]. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.kernel = None;
        self.input.release();
        self.output.release();
        self.closed = true;
        debug!("resampler closed");
    }

    fn open_kernel(&mut self) -> Result<()> {
        if self.kernel.is_some() {
            return Ok(());
        }
        let backend = self.library.backend().ok_or(Error::NotReady)?;
        let kernel = backend
            .create(&self.config)
            .map_err(|e| Error::Init(e.to_string()))?;
        debug!(
            backend = backend.name(),
            channels = self.config.channels,
            input_rate = self.config.input_rate,
            output_rate = self.config.output_rate,
            quality = self.config.quality,
            encoding = %S::ENCODING,
            "resampler created"
        );
        self.kernel = Some(kernel);
        Ok(())
    }

    /// Runs the staged input through the kernel with the whole output scratch
    /// as capacity and copies out what was written.
    fn run(&mut self, samples: usize, frames: usize) -> Result<Vec<u8>> {
        let channels = self.config.channels;
        let kernel = self.kernel.as_deref_mut().ok_or(Error::Closed)?;
        let capacity = self.output.len() / channels;
        let input = &self.input.as_slice()[..samples];
        let output = &mut self.output.as_mut_slice()[..capacity * channels];

        let written = S::process(kernel, input, output).map_err(|e| {
            warn!(error = %e, frames, "resample failed");
            Error::Processing(e.to_string())
        })?;

        trace!(frames_in = frames, frames_out = written, capacity, "chunk resampled");
        Ok(sample::encode(&output[..written * channels]))
    }
}
