//! Streaming adapter over [`Engine`].
//!
//! Callers push byte chunks of any length. A trailing partial frame is kept
//! back and prepended to the next push, so the engine only ever sees whole
//! frames.

use std::fmt;

use tracing::trace;

use crate::engine::Engine;
use crate::error::Result;
use crate::sample::Sample;

/// Whether a partial frame is held back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No partial frame pending.
    Idle,
    /// The given number of bytes (less than one frame) is pending.
    Carrying(usize),
}

/// Accepts arbitrary byte chunks and feeds whole frames to an [`Engine`].
pub struct Stream<S: Sample> {
    engine: Engine<S>,
    carry: Vec<u8>,
    frame: usize,
}

impl<S: Sample> fmt::Debug for Stream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("state", &self.state())
            .field("engine", &self.engine)
            .finish()
    }
}

impl<S: Sample> Stream<S> {
    /// Wraps `engine`.
    pub fn new(engine: Engine<S>) -> Self {
        let frame = engine.frame_bytes();
        Self {
            engine,
            carry: Vec::with_capacity(frame),
            frame,
        }
    }

    /// Resamples `chunk` together with any carried bytes.
    ///
    /// Returns an empty buffer, without touching the engine, while less than
    /// one frame is available. The trailing partial frame is carried even
    /// when the engine fails; the whole frames of a failed push are dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        let mut pending = std::mem::take(&mut self.carry);
        let data: &[u8] = if pending.is_empty() {
            chunk
        } else {
            pending.extend_from_slice(chunk);
            &pending
        };

        let aligned = data.len() - data.len() % self.frame;
        let (whole, tail) = data.split_at(aligned);

        self.carry.extend_from_slice(tail);
        if whole.is_empty() {
            trace!(carry = self.carry.len(), "partial frame carried");
            return Ok(Vec::new());
        }
        self.engine.process_chunk(whole)
    }

    /// Ends the stream.
    ///
    /// A pending partial frame is padded with zero bytes to one full frame and
    /// processed, then the engine's filter tail is appended.
    pub fn flush(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        if !self.carry.is_empty() {
            let mut padded = std::mem::take(&mut self.carry);
            padded.resize(self.frame, 0);
            out = self.engine.process_chunk(&padded)?;
        }
        out.extend(self.engine.flush()?);
        Ok(out)
    }

    /// Drops any carried bytes and closes the engine.
    pub fn close(&mut self) {
        self.carry.clear();
        self.engine.close();
    }

    /// Current carry state.
    pub fn state(&self) -> StreamState {
        match self.carry.len() {
            0 => StreamState::Idle,
            n => StreamState::Carrying(n),
        }
    }

    /// Bytes currently held back.
    pub fn carry_len(&self) -> usize {
        self.carry.len()
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &Engine<S> {
        &self.engine
    }

    /// The wrapped engine, for direct frame-aligned calls.
    pub fn engine_mut(&mut self) -> &mut Engine<S> {
        &mut self.engine
    }

    /// Returns the engine; carried bytes are discarded.
    pub fn into_engine(self) -> Engine<S> {
        self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::config::ResamplerConfig;
    use crate::error::Error;
    use crate::library::Library;

    fn stream<S: Sample>(backend: &MockBackend, config: ResamplerConfig) -> Stream<S> {
        Library::with_backend(backend.clone())
            .stream(config)
            .unwrap()
    }

    #[test]
    fn test_engine_sees_whole_frames() {
        let backend = MockBackend::new();
        // Stereo i16: 4-byte frames.
        let mut s = stream::<i16>(&backend, ResamplerConfig::stereo(8000, 8000));

        for len in [3, 7, 1, 4, 10, 2, 5] {
            s.push(&vec![1u8; len]).unwrap();
            assert!(s.carry_len() < 4);
        }
        for samples in backend.state().calls.iter() {
            assert_eq!(samples % 2, 0);
        }
    }

    #[test]
    fn test_bytes_reach_engine_in_order() {
        let backend = MockBackend::new();
        let mut s = stream::<i16>(&backend, ResamplerConfig::stereo(8000, 8000));
        let data: Vec<u8> = (0..=255u8).collect();

        let mut out = Vec::new();
        for part in [&data[..3], &data[3..10], &data[10..11], &data[11..]] {
            out.extend(s.push(part).unwrap());
        }
        assert_eq!(s.state(), StreamState::Idle);
        assert_eq!(backend.state().received, data);
        assert_eq!(out, data);
    }

    #[test]
    fn test_sub_frame_push_skips_engine() {
        let backend = MockBackend::new();
        let mut s = stream::<f32>(&backend, ResamplerConfig::stereo(16000, 16000));

        assert!(s.push(&[0u8; 5]).unwrap().is_empty());
        assert_eq!(s.state(), StreamState::Carrying(5));
        assert!(backend.state().calls.is_empty());
        assert_eq!(backend.state().created, 0);

        let out = s.push(&[0u8; 3]).unwrap();
        assert_eq!(out.len(), 8);
        assert_eq!(s.state(), StreamState::Idle);
        assert_eq!(backend.state().calls, vec![2]);
    }

    #[test]
    fn test_carry_kept_on_error() {
        let backend = MockBackend::new();
        let mut s = stream::<i16>(&backend, ResamplerConfig::mono(8000, 8000));
        s.push(&[0u8, 0]).unwrap();

        backend.fail_process("boom");
        let err = s.push(&[1u8, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::Processing(_)));
        assert_eq!(s.state(), StreamState::Carrying(1));

        let out = s.push(&[7u8]).unwrap();
        assert_eq!(out, vec![3u8, 7]);
    }

    #[test]
    fn test_error_after_combining_carry() {
        let backend = MockBackend::new();
        let mut s = stream::<i16>(&backend, ResamplerConfig::mono(8000, 8000));
        s.push(&[0u8, 0]).unwrap();
        s.push(&[9u8]).unwrap();

        // The carried byte joins a whole frame that fails with it.
        backend.fail_process("boom");
        assert!(s.push(&[1u8, 2, 3]).is_err());
        assert_eq!(s.state(), StreamState::Idle);
    }

    #[test]
    fn test_misconfigured_engine_error_propagates() {
        let backend = MockBackend::new();
        backend.fail_create("no such rate");
        let mut s = stream::<f32>(&backend, ResamplerConfig::mono(8000, 16000));
        match s.push(&[0u8; 4]) {
            Err(Error::Init(msg)) => assert!(msg.contains("no such rate")),
            other => panic!("expected init error, got {:?}", other),
        }
    }

    #[test]
    fn test_flush_pads_partial_frame() {
        let backend = MockBackend::new();
        let mut s = stream::<i16>(&backend, ResamplerConfig::stereo(8000, 8000));
        s.push(&[1u8, 2, 3, 4, 5]).unwrap();

        let out = s.flush().unwrap();
        assert_eq!(out, vec![5u8, 0, 0, 0]);
        assert_eq!(s.state(), StreamState::Idle);
        assert_eq!(backend.state().finished, 1);
    }

    #[test]
    fn test_flush_idle_stream() {
        let backend = MockBackend::new();
        let mut s = stream::<f32>(&backend, ResamplerConfig::mono(8000, 8000));
        assert!(s.flush().unwrap().is_empty());
    }

    #[test]
    fn test_engine_access() {
        let backend = MockBackend::new();
        let mut s = stream::<i16>(&backend, ResamplerConfig::stereo(8000, 8000));
        s.push(&[1u8, 2, 3]).unwrap();

        let direct = s.engine_mut().process_chunk(&[5u8, 6, 7, 8]).unwrap();
        assert_eq!(direct, vec![5u8, 6, 7, 8]);
        assert_eq!(s.carry_len(), 3);
        assert!(format!("{:?}", s).contains("Carrying(3)"));

        let mut engine = s.into_engine();
        assert_eq!(engine.config().channels, 2);
        assert_eq!(engine.process_chunk(&[0u8; 4]).unwrap().len(), 4);
    }

    #[test]
    fn test_close() {
        let backend = MockBackend::new();
        let mut s = stream::<f32>(&backend, ResamplerConfig::mono(8000, 8000));
        s.push(&[0u8; 6]).unwrap();
        s.close();
        assert_eq!(s.carry_len(), 0);
        assert!(s.engine().is_closed());
        assert!(matches!(s.push(&[0u8; 4]), Err(Error::Closed)));
    }
}
