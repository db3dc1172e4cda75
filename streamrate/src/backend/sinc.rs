//! Rubato-based backend.
//!
//! Wraps `rubato::SincFixedIn`, a pure Rust band-limited sinc resampler.
//! The resampler runs on blocks of a fixed size; input is staged per channel
//! until a full block is available, the same way for every call, so the
//! filter history always lines up with the previous block. The final partial
//! block is zero padded when the stream is finished.

use std::collections::VecDeque;

use rubato::{
    Resampler as RubatoResampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};
use tracing::debug;

use super::{Backend, Kernel, KernelError};
use crate::config::ResamplerConfig;

/// Default rubato block size, in input frames.
pub const DEFAULT_BLOCK: usize = 64;

/// Ratio headroom rubato reserves; the ratio here never changes.
const MAX_RELATIVE_RATIO: f64 = 2.0;

const I16_SCALE: f32 = 32768.0;

/// Backend producing [`SincFixedIn`] kernels.
#[derive(Debug, Clone)]
pub struct RubatoBackend {
    block: usize,
}

impl RubatoBackend {
    /// Creates a backend with the default block size.
    pub fn new() -> Self {
        Self {
            block: DEFAULT_BLOCK,
        }
    }

    /// Creates a backend whose kernels process `frames` input frames per
    /// rubato call. Smaller blocks lower latency at some CPU cost.
    pub fn with_block(frames: usize) -> Self {
        Self {
            block: frames.max(1),
        }
    }

    /// Input frames per rubato call.
    pub fn block(&self) -> usize {
        self.block
    }
}

impl Default for RubatoBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for RubatoBackend {
    fn name(&self) -> &str {
        "rubato-sinc"
    }

    fn create(&self, config: &ResamplerConfig) -> Result<Box<dyn Kernel>, KernelError> {
        let kernel = SincKernel::new(config, self.block)?;
        Ok(Box::new(kernel))
    }
}

/// Maps quality 1..=10 onto sinc filter parameters.
fn sinc_params(quality: u8) -> SincInterpolationParameters {
    use SincInterpolationType::{Cubic, Linear};
    use WindowFunction::{Blackman2, BlackmanHarris2, Hann2};

    let (sinc_len, oversampling_factor, interpolation, window, f_cutoff) = match quality {
        0 | 1 => (16, 32, Linear, Hann2, 0.85),
        2 => (32, 64, Linear, Hann2, 0.88),
        3 => (48, 64, Linear, Blackman2, 0.90),
        4 => (64, 128, Linear, Blackman2, 0.91),
        5 => (64, 128, Linear, BlackmanHarris2, 0.92),
        6 => (96, 128, Linear, BlackmanHarris2, 0.93),
        7 => (128, 256, Linear, BlackmanHarris2, 0.94),
        8 => (160, 256, Cubic, BlackmanHarris2, 0.95),
        9 => (192, 256, Cubic, BlackmanHarris2, 0.95),
        _ => (256, 256, Cubic, BlackmanHarris2, 0.95),
    };

    SincInterpolationParameters {
        sinc_len,
        f_cutoff,
        interpolation,
        oversampling_factor,
        window,
    }
}

#[inline]
fn widen(s: i16) -> f32 {
    s as f32 / I16_SCALE
}

#[inline]
fn narrow(s: f32) -> i16 {
    (s * I16_SCALE).round().clamp(-32768.0, 32767.0) as i16
}

struct SincKernel {
    resampler: SincFixedIn<f32>,
    channels: usize,
    ratio: f64,
    /// Planar input staging, one block per channel.
    planes_in: Vec<Vec<f32>>,
    /// Frames staged in `planes_in`.
    staged: usize,
    /// Planar output staging, sized for the largest block output.
    planes_out: Vec<Vec<f32>>,
    /// Interleaved output not yet handed out.
    queue: VecDeque<f32>,
    /// Input frames accepted.
    frames_in: u64,
    /// Output frames produced.
    frames_out: u64,
    widened: Vec<f32>,
    narrowed: Vec<f32>,
}

impl SincKernel {
    fn new(config: &ResamplerConfig, block: usize) -> Result<Self, KernelError> {
        let params = sinc_params(config.quality);
        let sinc_len = params.sinc_len;
        let resampler = SincFixedIn::<f32>::new(
            config.ratio(),
            MAX_RELATIVE_RATIO,
            params,
            block,
            config.channels,
        )
        .map_err(|e| KernelError::Construction(e.to_string()))?;
        let out_frames = resampler.output_frames_max();

        debug!(
            channels = config.channels,
            input_rate = config.input_rate,
            output_rate = config.output_rate,
            quality = config.quality,
            sinc_len,
            block,
            "sinc kernel created"
        );
        Ok(Self {
            resampler,
            channels: config.channels,
            ratio: config.ratio(),
            planes_in: vec![vec![0.0; block]; config.channels],
            staged: 0,
            planes_out: vec![vec![0.0; out_frames]; config.channels],
            queue: VecDeque::new(),
            frames_in: 0,
            frames_out: 0,
            widened: Vec::new(),
            narrowed: Vec::new(),
        })
    }

    /// Stages interleaved samples, running rubato on every full block.
    fn run(&mut self, input: &[f32]) -> Result<(), KernelError> {
        for frame in input.chunks_exact(self.channels) {
            for (plane, &s) in self.planes_in.iter_mut().zip(frame) {
                plane[self.staged] = s;
            }
            self.staged += 1;

            if self.staged == self.resampler.input_frames_next() {
                let (_, written) = self
                    .resampler
                    .process_into_buffer(&self.planes_in, &mut self.planes_out, None)
                    .map_err(|e| KernelError::Process(e.to_string()))?;
                self.staged = 0;
                self.enqueue(written);
            }
        }
        Ok(())
    }

    /// Runs the staged partial block, zero padded, or a block of silence
    /// when nothing is staged.
    fn run_partial(&mut self) -> Result<(), KernelError> {
        let result = if self.staged > 0 {
            let staged = self.staged;
            let wave_in: Vec<&[f32]> = self.planes_in.iter().map(|p| &p[..staged]).collect();
            self.resampler
                .process_partial_into_buffer(Some(wave_in.as_slice()), &mut self.planes_out, None)
        } else {
            self.resampler
                .process_partial_into_buffer(None::<&[&[f32]]>, &mut self.planes_out, None)
        };
        let (_, written) = result.map_err(|e| KernelError::Process(e.to_string()))?;
        self.staged = 0;
        self.enqueue(written);
        Ok(())
    }

    /// Interleaves `frames` frames of `planes_out` onto the queue.
    fn enqueue(&mut self, frames: usize) {
        for i in 0..frames {
            for plane in &self.planes_out {
                self.queue.push_back(plane[i]);
            }
        }
        self.frames_out += frames as u64;
    }

    /// Moves as many queued frames as fit into `output`.
    fn drain(&mut self, output: &mut [f32]) -> usize {
        let frames = (output.len() / self.channels).min(self.queue.len() / self.channels);
        for (dst, src) in output
            .iter_mut()
            .zip(self.queue.drain(..frames * self.channels))
        {
            *dst = src;
        }
        frames
    }
}

impl Kernel for SincKernel {
    fn process_f32(&mut self, input: &[f32], output: &mut [f32]) -> Result<usize, KernelError> {
        if input.len() % self.channels != 0 {
            return Err(KernelError::Misaligned {
                samples: input.len(),
                channels: self.channels,
            });
        }
        self.run(input)?;
        self.frames_in += (input.len() / self.channels) as u64;
        Ok(self.drain(output))
    }

    fn process_i16(&mut self, input: &[i16], output: &mut [i16]) -> Result<usize, KernelError> {
        let mut widened = std::mem::take(&mut self.widened);
        widened.clear();
        widened.extend(input.iter().map(|&s| widen(s)));

        let mut narrowed = std::mem::take(&mut self.narrowed);
        narrowed.clear();
        narrowed.resize(output.len(), 0.0);

        let result = self.process_f32(&widened, &mut narrowed);
        if let Ok(frames) = result {
            let n = frames * self.channels;
            for (dst, &src) in output[..n].iter_mut().zip(&narrowed[..n]) {
                *dst = narrow(src);
            }
        }

        self.widened = widened;
        self.narrowed = narrowed;
        result
    }

    fn queued_frames(&self) -> usize {
        self.queue.len() / self.channels
    }

    fn finish(&mut self) -> Result<(), KernelError> {
        let target = (self.frames_in as f64 * self.ratio).round() as u64;
        if self.staged > 0 {
            self.run_partial()?;
        }
        while self.frames_out < target {
            self.run_partial()?;
        }

        let excess = (self.frames_out - target) as usize;
        let keep = self.queue.len().saturating_sub(excess * self.channels);
        self.queue.truncate(keep);
        self.frames_out = target;

        debug!(
            frames_in = self.frames_in,
            frames_out = target,
            queued = self.queued_frames(),
            "sinc kernel finished"
        );
        Ok(())
    }
}
