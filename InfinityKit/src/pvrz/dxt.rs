//! DXT1/DXT5 block compression
//!
//! Decoding goes through `bcdec_rs`; encoding uses a luminance-endpoint fit
//! with punch-through alpha for DXT1 blocks that contain transparent pixels.

/// Block compression format of a PVRZ page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DxtFormat {
    /// 8 bytes per 4x4 block, 1-bit alpha
    Dxt1,
    /// 16 bytes per 4x4 block, interpolated alpha
    Dxt5,
}

impl DxtFormat {
    /// Block size in bytes for this format
    #[must_use]
    pub const fn block_size(self) -> usize {
        match self {
            Self::Dxt1 => 8,
            Self::Dxt5 => 16,
        }
    }

    /// Pick the cheapest format that preserves the alpha channel of `rgba`
    #[must_use]
    pub fn for_pixels(rgba: &[u8]) -> Self {
        if rgba.chunks_exact(4).any(|p| p[3] != 0 && p[3] != 255) {
            Self::Dxt5
        } else {
            Self::Dxt1
        }
    }
}

/// Compressed size of a `width x height` surface
#[must_use]
pub fn compressed_size(width: usize, height: usize, format: DxtFormat) -> usize {
    width.div_ceil(4) * height.div_ceil(4) * format.block_size()
}

/// Decode block-compressed data to RGBA
#[must_use]
pub fn decode(data: &[u8], width: usize, height: usize, format: DxtFormat) -> Vec<u8> {
    let mut rgba = vec![0u8; width * height * 4];
    let blocks_x = width.div_ceil(4);
    let blocks_y = height.div_ceil(4);
    let block_size = format.block_size();

    // Temporary buffer for a single 4x4 block, pitch is 4 pixels * 4 bytes
    let mut block_rgba = [0u8; 64];
    let block_pitch = 16;

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let block_idx = (by * blocks_x + bx) * block_size;
            if block_idx + block_size > data.len() {
                break;
            }
            let block = &data[block_idx..block_idx + block_size];

            match format {
                DxtFormat::Dxt1 => bcdec_rs::bc1(block, &mut block_rgba, block_pitch),
                DxtFormat::Dxt5 => bcdec_rs::bc3(block, &mut block_rgba, block_pitch),
            }

            for py in 0..4 {
                for px in 0..4 {
                    let fx = bx * 4 + px;
                    let fy = by * 4 + py;
                    if fx >= width || fy >= height {
                        continue;
                    }
                    let src_idx = (py * 4 + px) * 4;
                    let dst_idx = (fy * width + fx) * 4;
                    rgba[dst_idx..dst_idx + 4].copy_from_slice(&block_rgba[src_idx..src_idx + 4]);
                }
            }
        }
    }

    rgba
}

/// Encode RGBA pixels to block-compressed data
#[must_use]
pub fn encode(pixels: &[u8], width: usize, height: usize, format: DxtFormat) -> Vec<u8> {
    let blocks_x = width.div_ceil(4);
    let blocks_y = height.div_ceil(4);
    let block_size = format.block_size();
    let mut output = vec![0u8; blocks_x * blocks_y * block_size];

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let block = extract_block(pixels, width, height, bx * 4, by * 4);
            let offset = (by * blocks_x + bx) * block_size;
            match format {
                DxtFormat::Dxt1 => {
                    output[offset..offset + 8].copy_from_slice(&encode_dxt1_block(&block));
                }
                DxtFormat::Dxt5 => {
                    output[offset..offset + 8].copy_from_slice(&encode_dxt5_alpha_block(&block));
                    output[offset + 8..offset + 16].copy_from_slice(&encode_color_block(&block, false));
                }
            }
        }
    }

    output
}

// ============================================================================
// Colour blocks
// ============================================================================

/// DXT1 block: opaque blocks use 4-colour mode, blocks with transparent
/// pixels switch to 3-colour mode where index 3 is transparent black.
fn encode_dxt1_block(block: &[[u8; 4]; 16]) -> [u8; 8] {
    let punch_through = block.iter().any(|p| p[3] < 128);
    encode_color_block(block, punch_through)
}

fn encode_color_block(block: &[[u8; 4]; 16], punch_through: bool) -> [u8; 8] {
    let (max_565, min_565) = find_endpoint_colors(block, punch_through);

    // 4-colour mode needs c0 > c1, 3-colour mode needs c0 <= c1
    let (c0, c1) = if punch_through {
        (max_565.min(min_565), max_565.max(min_565))
    } else if max_565 == min_565 {
        // Degenerate block: every index resolves to c0
        (max_565, min_565)
    } else {
        (max_565.max(min_565), max_565.min(min_565))
    };

    let colors = bc1_colors(c0, c1);
    let usable = if c0 > c1 { 4 } else { 3 };

    let mut indices: u32 = 0;
    for (i, pixel) in block.iter().enumerate() {
        let idx = if punch_through && pixel[3] < 128 {
            3
        } else if c0 == c1 {
            0
        } else {
            find_closest_color(pixel, &colors[..usable])
        };
        indices |= u32::from(idx) << (i * 2);
    }

    let mut output = [0u8; 8];
    output[0..2].copy_from_slice(&c0.to_le_bytes());
    output[2..4].copy_from_slice(&c1.to_le_bytes());
    output[4..8].copy_from_slice(&indices.to_le_bytes());
    output
}

/// Encode alpha channel for DXT5 (8 bytes)
fn encode_dxt5_alpha_block(block: &[[u8; 4]; 16]) -> [u8; 8] {
    let mut min_alpha = 255u8;
    let mut max_alpha = 0u8;
    for pixel in block {
        min_alpha = min_alpha.min(pixel[3]);
        max_alpha = max_alpha.max(pixel[3]);
    }

    let a0 = max_alpha;
    let a1 = min_alpha;

    let alphas = if a0 > a1 {
        let lerp = |w0: u16, w1: u16| ((w0 * u16::from(a0) + w1 * u16::from(a1)) / 7) as u8;
        [a0, a1, lerp(6, 1), lerp(5, 2), lerp(4, 3), lerp(3, 4), lerp(2, 5), lerp(1, 6)]
    } else {
        [a0, a1, a0, a0, a0, a0, 0, 255]
    };

    let mut indices: u64 = 0;
    for (i, pixel) in block.iter().enumerate() {
        let alpha = pixel[3];
        let mut best_idx = 0u64;
        let mut best_dist = 256i32;
        for (j, &palette_alpha) in alphas.iter().enumerate() {
            let dist = (i32::from(alpha) - i32::from(palette_alpha)).abs();
            if dist < best_dist {
                best_dist = dist;
                best_idx = j as u64;
            }
        }
        indices |= best_idx << (i * 3);
    }

    let mut output = [0u8; 8];
    output[0] = a0;
    output[1] = a1;
    output[2..8].copy_from_slice(&indices.to_le_bytes()[..6]);
    output
}

// ============================================================================
// Shared Helpers
// ============================================================================

/// Extract a 4x4 block of RGBA pixels, padding with edge pixels if needed
fn extract_block(pixels: &[u8], width: usize, height: usize, x: usize, y: usize) -> [[u8; 4]; 16] {
    let mut block = [[0u8; 4]; 16];
    if width == 0 || height == 0 {
        return block;
    }

    for py in 0..4 {
        for px in 0..4 {
            let sx = (x + px).min(width - 1);
            let sy = (y + py).min(height - 1);
            let src_idx = (sy * width + sx) * 4;
            block[py * 4 + px].copy_from_slice(&pixels[src_idx..src_idx + 4]);
        }
    }

    block
}

/// Find endpoint colours from the darkest and brightest pixels
///
/// Transparent pixels are ignored when the block uses punch-through alpha.
fn find_endpoint_colors(block: &[[u8; 4]; 16], punch_through: bool) -> (u16, u16) {
    let mut min_lum = u32::MAX;
    let mut max_lum = 0;
    let mut min_pixel = [0u8; 3];
    let mut max_pixel = [0u8; 3];

    for pixel in block {
        if punch_through && pixel[3] < 128 {
            continue;
        }
        let lum = u32::from(pixel[0]) * 2 + u32::from(pixel[1]) * 4 + u32::from(pixel[2]);
        if lum < min_lum {
            min_lum = lum;
            min_pixel = [pixel[0], pixel[1], pixel[2]];
        }
        if lum >= max_lum {
            max_lum = lum;
            max_pixel = [pixel[0], pixel[1], pixel[2]];
        }
    }

    (
        rgb_to_565(max_pixel[0], max_pixel[1], max_pixel[2]),
        rgb_to_565(min_pixel[0], min_pixel[1], min_pixel[2]),
    )
}

/// Convert RGB888 to RGB565
#[must_use]
pub fn rgb_to_565(r: u8, g: u8, b: u8) -> u16 {
    let r5 = u16::from(r >> 3);
    let g6 = u16::from(g >> 2);
    let b5 = u16::from(b >> 3);
    (r5 << 11) | (g6 << 5) | b5
}

/// Expand RGB565 to RGB888
fn rgb_from_565(c: u16) -> [u8; 3] {
    let r = ((c >> 11) & 0x1F) as u8;
    let g = ((c >> 5) & 0x3F) as u8;
    let b = (c & 0x1F) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

/// BC1 colour palette for a pair of endpoints
fn bc1_colors(c0: u16, c1: u16) -> [[u8; 4]; 4] {
    let e0 = rgb_from_565(c0);
    let e1 = rgb_from_565(c1);
    let mix = |w0: u16, w1: u16, d: u16| -> [u8; 4] {
        let ch = |i: usize| ((w0 * u16::from(e0[i]) + w1 * u16::from(e1[i])) / d) as u8;
        [ch(0), ch(1), ch(2), 255]
    };
    if c0 > c1 {
        [[e0[0], e0[1], e0[2], 255], [e1[0], e1[1], e1[2], 255], mix(2, 1, 3), mix(1, 2, 3)]
    } else {
        [[e0[0], e0[1], e0[2], 255], [e1[0], e1[1], e1[2], 255], mix(1, 1, 2), [0, 0, 0, 0]]
    }
}

/// Find the closest colour in the palette
fn find_closest_color(pixel: &[u8; 4], palette: &[[u8; 4]]) -> u8 {
    let mut best_idx = 0u8;
    let mut best_dist = u32::MAX;

    for (i, color) in palette.iter().enumerate() {
        let dr = i32::from(pixel[0]) - i32::from(color[0]);
        let dg = i32::from(pixel[1]) - i32::from(color[1]);
        let db = i32::from(pixel[2]) - i32::from(color[2]);
        let dist = (dr * dr + dg * dg + db * db) as u32;

        if dist < best_dist {
            best_dist = dist;
            best_idx = i as u8;
        }
    }

    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_to_565() {
        assert_eq!(rgb_to_565(255, 255, 255), 0xFFFF);
        assert_eq!(rgb_to_565(0, 0, 0), 0x0000);
        assert_eq!(rgb_to_565(255, 0, 0), 0xF800);
        assert_eq!(rgb_to_565(0, 255, 0), 0x07E0);
        assert_eq!(rgb_to_565(0, 0, 255), 0x001F);
    }

    #[test]
    fn test_solid_block_survives_dxt1() {
        let pixels = [255u8, 0, 0, 255].repeat(16);
        let encoded = encode(&pixels, 4, 4, DxtFormat::Dxt1);
        assert_eq!(encoded.len(), 8);
        assert_eq!(decode(&encoded, 4, 4, DxtFormat::Dxt1), pixels);
    }

    #[test]
    fn test_dxt1_punch_through_alpha() {
        let mut pixels = [0u8, 0, 255, 255].repeat(16);
        pixels[3] = 0;
        let decoded = decode(&encode(&pixels, 4, 4, DxtFormat::Dxt1), 4, 4, DxtFormat::Dxt1);
        assert_eq!(decoded[3], 0);
        assert_eq!(&decoded[4..8], &[0, 0, 255, 255]);
    }

    #[test]
    fn test_dxt5_keeps_alpha_extremes() {
        let mut pixels = [255u8, 255, 255, 255].repeat(16);
        pixels[3] = 0;
        let decoded = decode(&encode(&pixels, 4, 4, DxtFormat::Dxt5), 4, 4, DxtFormat::Dxt5);
        assert_eq!(decoded[3], 0);
        assert_eq!(decoded[7], 255);
    }

    #[test]
    fn test_format_selection() {
        assert_eq!(DxtFormat::for_pixels(&[1, 2, 3, 255, 1, 2, 3, 0]), DxtFormat::Dxt1);
        assert_eq!(DxtFormat::for_pixels(&[1, 2, 3, 128]), DxtFormat::Dxt5);
    }
}
