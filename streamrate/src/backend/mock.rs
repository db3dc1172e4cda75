//! Pass-through backend for tests.
//!
//! Kernels copy input to output unchanged and record every call so tests can
//! check what the engine handed down.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{Backend, Kernel, KernelError};
use crate::config::ResamplerConfig;
use crate::sample::Sample;

#[derive(Debug, Default)]
pub(crate) struct MockState {
    /// Kernels created so far.
    pub created: usize,
    /// Samples passed to each process call.
    pub calls: Vec<usize>,
    /// Every input sample, re-encoded little-endian.
    pub received: Vec<u8>,
    /// finish() calls.
    pub finished: usize,
    /// Returned by the next create().
    pub fail_create: Option<String>,
    /// Returned by the next process call.
    pub fail_process: Option<String>,
}

#[derive(Clone, Default)]
pub(crate) struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn fail_create(&self, msg: &str) {
        self.state().fail_create = Some(msg.to_string());
    }

    pub fn fail_process(&self, msg: &str) {
        self.state().fail_process = Some(msg.to_string());
    }
}

impl Backend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn create(&self, config: &ResamplerConfig) -> Result<Box<dyn Kernel>, KernelError> {
        let mut state = self.state();
        if let Some(msg) = state.fail_create.take() {
            return Err(KernelError::Construction(msg));
        }
        state.created += 1;
        Ok(Box::new(MockKernel {
            channels: config.channels,
            queue: VecDeque::new(),
            width: 0,
            state: self.state.clone(),
        }))
    }
}

struct MockKernel {
    channels: usize,
    /// Pending output bytes.
    queue: VecDeque<u8>,
    /// Sample width seen so far, 0 before the first call.
    width: usize,
    state: Arc<Mutex<MockState>>,
}

impl MockKernel {
    fn pass<S: Sample>(&mut self, input: &[S], output: &mut [S]) -> Result<usize, KernelError> {
        {
            let mut state = self.state.lock().unwrap();
            if let Some(msg) = state.fail_process.take() {
                return Err(KernelError::Process(msg));
            }
            if input.len() % self.channels != 0 {
                return Err(KernelError::Misaligned {
                    samples: input.len(),
                    channels: self.channels,
                });
            }
            state.calls.push(input.len());
            for &s in input {
                s.put_le(&mut state.received);
            }
        }

        self.width = S::WIDTH;
        let mut bytes = Vec::new();
        for &s in input {
            s.put_le(&mut bytes);
        }
        self.queue.extend(bytes);

        let frame = self.channels * S::WIDTH;
        let frames = (output.len() / self.channels).min(self.queue.len() / frame);
        let raw: Vec<u8> = self.queue.drain(..frames * frame).collect();
        for (dst, src) in output.iter_mut().zip(raw.chunks_exact(S::WIDTH)) {
            *dst = S::from_le(src);
        }
        Ok(frames)
    }
}

impl Kernel for MockKernel {
    fn process_f32(&mut self, input: &[f32], output: &mut [f32]) -> Result<usize, KernelError> {
        self.pass(input, output)
    }

    fn process_i16(&mut self, input: &[i16], output: &mut [i16]) -> Result<usize, KernelError> {
        self.pass(input, output)
    }

    fn queued_frames(&self) -> usize {
        match self.width {
            0 => 0,
            width => self.queue.len() / (self.channels * width),
        }
    }

    fn finish(&mut self) -> Result<(), KernelError> {
        self.state.lock().unwrap().finished += 1;
        Ok(())
    }
}
