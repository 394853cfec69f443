//! Compression utilities
//!
//! All compressed Infinity Engine containers (BAMC, MOSC, PVRZ) use plain
//! zlib streams prefixed by the uncompressed size.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::error::{Error, Result};
use crate::utils::ByteSpan;

/// Compress data using zlib at the default level
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| Error::ZlibCompressionFailed { message: e.to_string() })?;
    encoder
        .finish()
        .map_err(|e| Error::ZlibCompressionFailed { message: e.to_string() })
}

/// Decompress a zlib stream, checking the result against the declared size
pub fn decompress(data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::with_capacity(expected_size);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::ZlibDecompressionFailed { message: e.to_string() })?;
    if out.len() != expected_size {
        return Err(Error::ZlibDecompressionFailed {
            message: format!("expected {expected_size} bytes, got {}", out.len()),
        });
    }
    Ok(out)
}

/// Unwrap a `{sig[4], ver[4], size:u32}` + zlib container (BAMC, MOSC)
pub fn unwrap_signed(data: &[u8], format: &'static str, signature: &[u8; 4]) -> Result<Vec<u8>> {
    let span = ByteSpan::new(data);
    span.expect_signature(format, signature)?;
    let size = span.u32_at(8)? as usize;
    decompress(span.tail(12)?, size)
}

/// Wrap data into a `{sig[4], ver[4], size:u32}` + zlib container
pub fn wrap_signed(data: &[u8], signature: &[u8; 4], version: &[u8; 4]) -> Result<Vec<u8>> {
    let compressed = compress(data)?;
    let mut out = Vec::with_capacity(12 + compressed.len());
    out.extend_from_slice(signature);
    out.extend_from_slice(version);
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&compressed);
    Ok(out)
}

/// Unwrap a `{size:u32}` + zlib container (PVRZ)
pub fn unwrap_sized(data: &[u8]) -> Result<Vec<u8>> {
    let span = ByteSpan::new(data);
    let size = span.u32_at(0)? as usize;
    decompress(span.tail(4)?, size)
}

/// Wrap data into a `{size:u32}` + zlib container
pub fn wrap_sized(data: &[u8]) -> Result<Vec<u8>> {
    let compressed = compress(data)?;
    let mut out = Vec::with_capacity(4 + compressed.len());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&compressed);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_wrapper() {
        let payload = b"BAM V1  some frame data".repeat(20);
        let wrapped = wrap_signed(&payload, b"BAMC", b"V1  ").unwrap();
        assert_eq!(&wrapped[0..8], b"BAMCV1  ");
        assert_eq!(unwrap_signed(&wrapped, "BAMC", b"BAMC").unwrap(), payload);
        assert!(unwrap_signed(&wrapped, "MOSC", b"MOSC").is_err());
    }

    #[test]
    fn test_size_mismatch_is_an_error() {
        let mut wrapped = wrap_sized(&[7u8; 64]).unwrap();
        wrapped[0] = 65;
        assert!(matches!(unwrap_sized(&wrapped), Err(Error::ZlibDecompressionFailed { .. })));
    }
}
