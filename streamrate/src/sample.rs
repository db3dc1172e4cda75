//! PCM sample encodings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::backend::{Kernel, KernelError};

/// Wire encoding of one PCM sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// 32-bit float, little-endian.
    #[default]
    F32le,
    /// Signed 16-bit integer, little-endian.
    S16le,
}

impl Encoding {
    /// Bytes per sample.
    pub const fn width(self) -> usize {
        match self {
            Encoding::F32le => 4,
            Encoding::S16le => 2,
        }
    }

    /// Short lowercase name, as accepted by [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            Encoding::F32le => "f32le",
            Encoding::S16le => "s16le",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "f32le" | "f32" | "float" => Ok(Encoding::F32le),
            "s16le" | "s16" | "i16" => Ok(Encoding::S16le),
            other => Err(format!("unknown encoding: {}", other)),
        }
    }
}

/// A sample type the engine can carry.
///
/// Implemented for `f32` and `i16`; picking the type picks the encoding for
/// the lifetime of an engine.
pub trait Sample: Copy + Default + Send + 'static {
    /// The matching wire encoding.
    const ENCODING: Encoding;

    /// Bytes per sample.
    const WIDTH: usize = Self::ENCODING.width();

    /// Decodes one sample from exactly `WIDTH` little-endian bytes.
    fn from_le(bytes: &[u8]) -> Self;

    /// Appends the little-endian bytes of this sample.
    fn put_le(self, out: &mut Vec<u8>);

    /// Runs `input` through the kernel entry point for this sample type.
    fn process(
        kernel: &mut dyn Kernel,
        input: &[Self],
        output: &mut [Self],
    ) -> Result<usize, KernelError>;
}

impl Sample for f32 {
    const ENCODING: Encoding = Encoding::F32le;

    #[inline]
    fn from_le(bytes: &[u8]) -> Self {
        f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[inline]
    fn put_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn process(
        kernel: &mut dyn Kernel,
        input: &[Self],
        output: &mut [Self],
    ) -> Result<usize, KernelError> {
        kernel.process_f32(input, output)
    }
}

impl Sample for i16 {
    const ENCODING: Encoding = Encoding::S16le;

    #[inline]
    fn from_le(bytes: &[u8]) -> Self {
        i16::from_le_bytes([bytes[0], bytes[1]])
    }

    #[inline]
    fn put_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn process(
        kernel: &mut dyn Kernel,
        input: &[Self],
        output: &mut [Self],
    ) -> Result<usize, KernelError> {
        kernel.process_i16(input, output)
    }
}

/// Decodes `bytes` into `dst`. `bytes.len()` must equal `dst.len() * S::WIDTH`.
pub(crate) fn decode_into<S: Sample>(bytes: &[u8], dst: &mut [S]) {
    for (sample, raw) in dst.iter_mut().zip(bytes.chunks_exact(S::WIDTH)) {
        *sample = S::from_le(raw);
    }
}

/// Encodes samples into a new byte buffer.
pub(crate) fn encode<S: Sample>(samples: &[S]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * S::WIDTH);
    for &s in samples {
        s.put_le(&mut out);
    }
    out
}

/// Interleaved samples to little-endian bytes.
pub fn to_bytes<S: Sample>(samples: &[S]) -> Vec<u8> {
    encode(samples)
}

/// Little-endian bytes to samples. Trailing bytes short of a sample are ignored.
pub fn from_bytes<S: Sample>(bytes: &[u8]) -> Vec<S> {
    let mut out = vec![S::default(); bytes.len() / S::WIDTH];
    decode_into(&bytes[..out.len() * S::WIDTH], &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_width() {
        assert_eq!(Encoding::F32le.width(), 4);
        assert_eq!(Encoding::S16le.width(), 2);
        assert_eq!(<f32 as Sample>::WIDTH, 4);
        assert_eq!(<i16 as Sample>::WIDTH, 2);
    }

    #[test]
    fn test_encoding_parse() {
        assert_eq!("f32le".parse::<Encoding>().unwrap(), Encoding::F32le);
        assert_eq!("S16LE".parse::<Encoding>().unwrap(), Encoding::S16le);
        assert_eq!("i16".parse::<Encoding>().unwrap(), Encoding::S16le);
        assert!("u8".parse::<Encoding>().is_err());
        assert_eq!(Encoding::S16le.to_string(), "s16le");
    }

    #[test]
    fn test_i16_bytes() {
        // 1000 = 0x03e8, -2 = 0xfffe
        let bytes = to_bytes(&[1000i16, -2]);
        assert_eq!(bytes, vec![0xe8, 0x03, 0xfe, 0xff]);
        assert_eq!(from_bytes::<i16>(&bytes), vec![1000, -2]);
    }

    #[test]
    fn test_f32_bytes() {
        let bytes = to_bytes(&[0.5f32, -1.0]);
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[..4], &0.5f32.to_le_bytes());
        assert_eq!(from_bytes::<f32>(&bytes), vec![0.5, -1.0]);
    }

    #[test]
    fn test_from_bytes_ignores_partial_sample() {
        assert_eq!(from_bytes::<i16>(&[1, 0, 7]), vec![1]);
        assert!(from_bytes::<f32>(&[1, 2, 3]).is_empty());
    }

    #[test]
    fn test_encoding_serde() {
        let enc: Encoding = serde_yaml::from_str("s16le").unwrap();
        assert_eq!(enc, Encoding::S16le);
    }
}
