//! Streaming sample rate conversion for interleaved PCM.
//!
//! Audio arrives as byte chunks of arbitrary size (network packets, file
//! reads) and leaves at another sample rate, with filter state carried across
//! chunks so the output is continuous.
//!
//! ## Components
//!
//! - [`Library`]: loads the resampling backend once and builds engines
//! - [`Engine`]: resamples frame-aligned chunks
//! - [`Stream`]: accepts chunks of any length and keeps partial frames back
//!
//! The sample type picks the wire encoding: `f32` for 32-bit float LE,
//! `i16` for signed 16-bit LE.
//!
//! ## Example
//!
//! ```no_run
//! use streamrate::{Library, ResamplerConfig};
//!
//! #[tokio::main]
//! async fn main() -> streamrate::Result<()> {
//!     let lib = Library::new();
//!     lib.ready().await?;
//!
//!     let mut stream = lib.stream::<f32>(ResamplerConfig::stereo(48000, 16000))?;
//!     let packet = vec![0u8; 1000];
//!     let mut out = stream.push(&packet)?;
//!     out.extend(stream.flush()?);
//!     Ok(())
//! }
//! ```

pub mod backend;
mod config;
mod engine;
mod error;
mod library;
pub mod sample;
mod scratch;
mod stream;

pub use backend::{Backend, Kernel, KernelError, RubatoBackend};
pub use config::{DEFAULT_QUALITY, MAX_QUALITY, MIN_QUALITY, ResamplerConfig};
pub use engine::Engine;
pub use error::{Error, Result};
pub use library::Library;
pub use sample::{Encoding, Sample};
pub use stream::{Stream, StreamState};
