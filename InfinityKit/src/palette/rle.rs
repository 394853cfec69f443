//! Sentinel run-length coding for 8-bit indexed pixel streams
//!
//! Only runs of the sentinel index are compressed: a sentinel byte is always
//! followed by a count byte holding `run length - 1`, so one pair covers at
//! most 256 pixels. Every other byte is a literal pixel.

use crate::error::{Error, Result};

/// Encode a stream of palette indices
#[must_use]
pub fn rle_encode(indices: &[u8], sentinel: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(indices.len());
    let mut i = 0;
    while i < indices.len() {
        let value = indices[i];
        if value != sentinel {
            out.push(value);
            i += 1;
            continue;
        }
        let run = indices[i..]
            .iter()
            .take(256)
            .take_while(|&&v| v == sentinel)
            .count();
        out.push(sentinel);
        out.push((run - 1) as u8);
        i += run;
    }
    out
}

/// Decode a sentinel-RLE stream into exactly `pixel_count` indices
///
/// Trailing bytes after the last pixel are ignored; a stream that ends early
/// or a run that overflows the frame is an error.
pub fn rle_decode(data: &[u8], sentinel: u8, pixel_count: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(pixel_count);
    let mut iter = data.iter();
    while out.len() < pixel_count {
        let Some(&value) = iter.next() else {
            return Err(Error::invalid(
                "RLE",
                format!("stream ended after {} of {pixel_count} pixels", out.len()),
            ));
        };
        if value != sentinel {
            out.push(value);
            continue;
        }
        let Some(&count) = iter.next() else {
            return Err(Error::invalid("RLE", "run marker without length byte"));
        };
        let run = usize::from(count) + 1;
        if out.len() + run > pixel_count {
            return Err(Error::invalid(
                "RLE",
                format!("run of {run} overflows frame of {pixel_count} pixels"),
            ));
        }
        out.resize(out.len() + run, sentinel);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(pixels: &[u8], sentinel: u8) {
        let encoded = rle_encode(pixels, sentinel);
        assert_eq!(rle_decode(&encoded, sentinel, pixels.len()).unwrap(), pixels);
    }

    #[test]
    fn test_round_trip_run_lengths() {
        for run in [0usize, 1, 2, 3, 255, 256, 257, 600] {
            let mut pixels = vec![5u8, 6];
            pixels.extend(std::iter::repeat_n(0u8, run));
            pixels.push(9);
            round_trip(&pixels, 0);
        }
    }

    #[test]
    fn test_non_zero_sentinel() {
        round_trip(&[1, 1, 1, 2, 3, 1, 4, 1, 1], 1);
    }

    #[test]
    fn test_run_saturates_at_256() {
        let encoded = rle_encode(&[0u8; 300], 0);
        assert_eq!(encoded, vec![0, 255, 0, 43]);
    }

    #[test]
    fn test_truncated_stream() {
        assert!(rle_decode(&[0], 0, 4).is_err());
        assert!(rle_decode(&[3, 4], 0, 4).is_err());
        assert!(rle_decode(&[0, 9], 0, 4).is_err());
    }
}
